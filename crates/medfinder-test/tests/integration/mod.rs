pub mod helpers;

mod pharmacy;
mod search;
