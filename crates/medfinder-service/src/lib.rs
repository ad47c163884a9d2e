//! Medicine search engine and pharmacy record services.

pub mod error;
pub mod identity;
pub mod pharmacy;
pub mod search;
