use std::sync::Arc;

use diesel_async::scoped_futures::ScopedFutureExt;
use futures::FutureExt;
use futures::future::BoxFuture;

use medfinder_core::geo::GeoPoint;

use crate::db::DbProvider;
use crate::db::query::{geo_near, pharmacy};
use crate::db::spatial_index::{self, IndexState, IndexStatus};
use crate::db::transaction::with_transaction;
use crate::error::DbResult;
use crate::model::medicine::MedicineEntry;
use crate::model::pharmacy::{NewPharmacyRecord, PharmacyProfile};
use crate::pipeline::{MatchPipeline, PharmacyMatch};
use crate::store::PharmacyStore;

/// `PostgreSQL` backend; spatial queries use the `earthdistance` GiST index
/// when it is ready and a spherical scan otherwise.
#[derive(Clone)]
pub struct PgPharmacyStore {
    provider: Arc<dyn DbProvider>,
    index: IndexStatus,
}

impl PgPharmacyStore {
    #[must_use]
    pub fn new(provider: Arc<dyn DbProvider>) -> Self {
        Self {
            provider,
            index: IndexStatus::default(),
        }
    }
}

impl PharmacyStore for PgPharmacyStore {
    fn index_state(&self) -> IndexState {
        self.index.get()
    }

    fn ensure_spatial_index(&self) -> BoxFuture<'_, DbResult<()>> {
        async move {
            let result = match self.provider.get_connection().await {
                Ok(mut conn) => spatial_index::ensure_index(&mut conn).await,
                Err(e) => Err(e),
            };
            self.index.set(if result.is_ok() {
                IndexState::Ready
            } else {
                IndexState::Unavailable
            });
            result
        }
        .boxed()
    }

    fn run_match_pipeline<'a>(
        &'a self,
        pipeline: &'a MatchPipeline,
    ) -> BoxFuture<'a, DbResult<Vec<PharmacyMatch>>> {
        async move {
            let strategy = self.index.get().strategy();
            let mut conn = self.provider.get_connection().await?;
            geo_near::run_match_pipeline(&mut conn, pipeline, strategy).await
        }
        .boxed()
    }

    fn create_pharmacy(&self, record: NewPharmacyRecord) -> BoxFuture<'_, DbResult<PharmacyProfile>> {
        async move {
            let mut conn = self.provider.get_connection().await?;
            let profile = with_transaction(&mut conn, move |tx| {
                async move { pharmacy::insert(tx, &record).await }.scope_boxed()
            })
            .await?;
            tracing::info!(pharmacy_id = %profile.id, "Pharmacy created");
            Ok(profile)
        }
        .boxed()
    }

    fn list_pharmacies(&self) -> BoxFuture<'_, DbResult<Vec<PharmacyProfile>>> {
        async move {
            let mut conn = self.provider.get_connection().await?;
            pharmacy::list_profiles(&mut conn).await
        }
        .boxed()
    }

    fn get_pharmacy(&self, id: uuid::Uuid) -> BoxFuture<'_, DbResult<Option<PharmacyProfile>>> {
        async move {
            let mut conn = self.provider.get_connection().await?;
            pharmacy::find_profile(&mut conn, id).await
        }
        .boxed()
    }

    fn replace_medicines(
        &self,
        id: uuid::Uuid,
        medicines: Vec<MedicineEntry>,
    ) -> BoxFuture<'_, DbResult<Option<Vec<MedicineEntry>>>> {
        async move {
            let mut conn = self.provider.get_connection().await?;
            with_transaction(&mut conn, move |tx| {
                async move {
                    if !pharmacy::touch(tx, id).await? {
                        return Ok(None);
                    }
                    let removed = pharmacy::delete_inventory(tx, id).await?;
                    let inserted = pharmacy::insert_inventory(tx, id, &medicines).await?;
                    tracing::debug!(pharmacy_id = %id, removed, inserted, "Inventory replaced");
                    Ok(Some(medicines))
                }
                .scope_boxed()
            })
            .await
        }
        .boxed()
    }

    fn update_location(
        &self,
        id: uuid::Uuid,
        location: GeoPoint,
    ) -> BoxFuture<'_, DbResult<Option<PharmacyProfile>>> {
        async move {
            let mut conn = self.provider.get_connection().await?;
            if pharmacy::update_location(&mut conn, id, location)
                .await?
                .is_none()
            {
                return Ok(None);
            }
            pharmacy::find_profile(&mut conn, id).await
        }
        .boxed()
    }
}
