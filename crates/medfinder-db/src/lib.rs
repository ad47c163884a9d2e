//! Storage layer for pharmacy records.
//!
//! Exposes the [`store::PharmacyStore`] seam used by the service layer, with a
//! `PostgreSQL` backend (diesel-async, `earthdistance` spatial index) and an
//! in-memory backend that keeps its own latitude-band index.

pub mod db;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod store;
