//! Shared building blocks for the medfinder workspace.
//!
//! Holds configuration, route constants, core errors, the geographic point
//! type with spherical distance, and medicine-name normalization. Nothing in
//! here touches the database or HTTP.

pub mod config;
pub mod constants;
pub mod error;
pub mod geo;
pub mod util;
