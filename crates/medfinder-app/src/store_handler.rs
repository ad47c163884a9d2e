use salvo::async_trait;
use std::sync::Arc;

use crate::error::AppResult;
use medfinder_core::error::CoreError;
use medfinder_db::store::PharmacyStore;

pub struct StoreHandler {
    pub store: Arc<dyn PharmacyStore>,
}

#[async_trait]
impl salvo::Handler for StoreHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(Arc::clone(&self.store));
    }
}

/// ## Summary
/// Retrieves the pharmacy store from the depot.
///
/// ## Errors
/// Returns an error if no store was injected.
pub fn get_store_from_depot(depot: &salvo::Depot) -> AppResult<Arc<dyn PharmacyStore>> {
    depot
        .obtain::<Arc<dyn PharmacyStore>>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Pharmacy store not found in depot").into())
}
