use chrono::Utc;

use medfinder_core::config::SearchConfig;
use medfinder_db::db::spatial_index::IndexState;
use medfinder_db::pipeline::PharmacyMatch;
use medfinder_db::store::PharmacyStore;

use crate::error::{ServiceError, ServiceResult};
use crate::search::params::SearchQuery;

/// ## Summary
/// Finds pharmacies within the query radius stocking at least one requested
/// medicine, nearest first, each carrying only its matching medicines.
///
/// A pure read. An empty result is a success.
///
/// ## Errors
/// - `IndexUnavailable` when the spatial index is not ready and the
///   configuration forbids scanning.
/// - `Timeout` when the staged query exceeds `search.timeout_ms`.
/// - `DatabaseError` when the store fails.
#[tracing::instrument(skip(store, config), fields(
    near = %query.near,
    max_distance_km = query.max_distance_km,
    terms = query.medicines.len(),
))]
pub async fn find_matching_pharmacies(
    store: &dyn PharmacyStore,
    config: &SearchConfig,
    query: &SearchQuery,
) -> ServiceResult<Vec<PharmacyMatch>> {
    let index_state = store.index_state();
    if config.require_spatial_index && index_state != IndexState::Ready {
        return Err(ServiceError::IndexUnavailable(format!(
            "spatial index is {index_state}"
        )));
    }

    let expired_before = config.hide_expired.then(|| Utc::now().date_naive());
    let timeout = config.timeout();
    let pipeline = query
        .to_pipeline(expired_before)?
        .with_time_limit(Some(timeout));

    let matches = tokio::time::timeout(timeout, store.run_match_pipeline(&pipeline))
        .await
        .map_err(|_elapsed| ServiceError::Timeout(timeout))??;

    tracing::debug!(
        results = matches.len(),
        strategy = ?index_state.strategy(),
        "Medicine search completed"
    );
    Ok(matches)
}
