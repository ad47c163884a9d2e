//! Medicine Match Query Engine.
//!
//! ## Summary
//! [`params`] validates and normalizes raw query parameters into a
//! [`params::SearchQuery`] without touching storage. [`engine`] turns a query
//! into a [`medfinder_db::pipeline::MatchPipeline`] and runs it against a
//! store under a time bound.

pub mod engine;
pub mod params;


pub use engine::find_matching_pharmacies;
pub use params::{SearchParams, SearchQuery};
