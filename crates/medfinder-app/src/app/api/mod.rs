mod health;
pub mod response;
mod users;

#[cfg(test)]
pub(crate) mod test_support;

use salvo::Router;

use crate::middleware::identity::IdentityMiddleware;

// Re-export route constants from core
pub use medfinder_core::constants::{
    API_ROUTE_COMPONENT, API_ROUTE_PREFIX, HEALTH_ROUTE_PREFIX, MEDICINES_ROUTE_PREFIX,
    UPDATE_MEDICINES_ROUTE_PREFIX, USERS_ROUTE_PREFIX,
};

/// ## Summary
/// Constructs the API router: health check and pharmacy routes.
///
/// Expects `StoreHandler` and `ConfigHandler` to be hooped by the caller.
#[must_use]
pub fn routes() -> Router {
    Router::with_path(API_ROUTE_COMPONENT)
        .hoop(IdentityMiddleware)
        .push(health::routes())
        .push(users::routes())
}
