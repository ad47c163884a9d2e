pub mod geo_near;
pub mod pharmacy;
