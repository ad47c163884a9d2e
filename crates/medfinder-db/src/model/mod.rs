pub mod medicine;
pub mod pharmacy;
