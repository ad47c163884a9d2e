//! Pharmacy routes under `/api/users`.

use salvo::{Request, Router};

use medfinder_core::constants::{
    MEDICINES_ROUTE_COMPONENT, UPDATE_MEDICINES_ROUTE_COMPONENT, USERS_ROUTE_COMPONENT,
};
use medfinder_service::error::ServiceError;

use crate::error::AppResult;

mod medicines;
mod pharmacy;
mod search;


#[must_use]
pub fn routes() -> Router {
    Router::with_path(USERS_ROUTE_COMPONENT)
        .get(pharmacy::list)
        .post(pharmacy::create)
        .push(Router::with_path(MEDICINES_ROUTE_COMPONENT).get(search::find_medicines))
        .push(Router::with_path(UPDATE_MEDICINES_ROUTE_COMPONENT).post(medicines::update_medicines))
        .push(
            Router::with_path("{id}")
                .get(pharmacy::show)
                .post(pharmacy::update_location),
        )
}

/// ## Summary
/// Parses the `{id}` path segment as a pharmacy id.
///
/// ## Errors
/// Returns `ValidationError` when the segment is missing or not a UUID.
fn pharmacy_id(req: &Request) -> AppResult<uuid::Uuid> {
    let raw = req.param::<String>("id").unwrap_or_default();
    uuid::Uuid::parse_str(&raw)
        .map_err(|e| ServiceError::ValidationError(format!("Invalid pharmacy id {raw:?}: {e}")).into())
}
