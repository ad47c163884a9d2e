//! Storage seam between the service layer and a backend.

use futures::future::BoxFuture;

use medfinder_core::geo::GeoPoint;

use crate::db::spatial_index::IndexState;
use crate::error::DbResult;
use crate::model::medicine::MedicineEntry;
use crate::model::pharmacy::{NewPharmacyRecord, PharmacyProfile};
use crate::pipeline::{MatchPipeline, PharmacyMatch};

pub mod memory;
pub mod postgres;

pub use memory::MemoryPharmacyStore;
pub use postgres::PgPharmacyStore;

/// ## Summary
/// Persistence for pharmacy records plus execution of the match pipeline.
///
/// Lookups by id return `Ok(None)` for unknown records; the caller decides
/// whether that is an error.
pub trait PharmacyStore: Send + Sync {
    /// Current spatial index state; picks the proximity strategy.
    fn index_state(&self) -> IndexState;

    /// ## Summary
    /// Creates the spatial index if missing. Idempotent.
    ///
    /// On failure the state becomes `Unavailable` and queries keep working
    /// through the scan strategy.
    fn ensure_spatial_index(&self) -> BoxFuture<'_, DbResult<()>>;

    /// ## Summary
    /// Runs all three stages and returns matches nearest first.
    fn run_match_pipeline<'a>(
        &'a self,
        pipeline: &'a MatchPipeline,
    ) -> BoxFuture<'a, DbResult<Vec<PharmacyMatch>>>;

    fn create_pharmacy(&self, record: NewPharmacyRecord) -> BoxFuture<'_, DbResult<PharmacyProfile>>;

    fn list_pharmacies(&self) -> BoxFuture<'_, DbResult<Vec<PharmacyProfile>>>;

    fn get_pharmacy(&self, id: uuid::Uuid) -> BoxFuture<'_, DbResult<Option<PharmacyProfile>>>;

    /// ## Summary
    /// Replaces the whole inventory atomically. Returns the stored entries.
    fn replace_medicines(
        &self,
        id: uuid::Uuid,
        medicines: Vec<MedicineEntry>,
    ) -> BoxFuture<'_, DbResult<Option<Vec<MedicineEntry>>>>;

    /// ## Summary
    /// Replaces the location atomically; both coordinates change together.
    fn update_location(
        &self,
        id: uuid::Uuid,
        location: GeoPoint,
    ) -> BoxFuture<'_, DbResult<Option<PharmacyProfile>>>;
}
