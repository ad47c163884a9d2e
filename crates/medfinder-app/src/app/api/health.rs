use salvo::http::StatusCode;
use salvo::{Depot, Response, Router, handler};
use serde::Serialize;

use medfinder_core::constants::HEALTH_ROUTE_COMPONENT;
use medfinder_db::db::spatial_index::IndexState;

use crate::app::api::response::{render_error, render_success};
use crate::store_handler::get_store_from_depot;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Health {
    spatial_index: IndexState,
}

#[handler]
async fn health(depot: &mut Depot, res: &mut Response) {
    match get_store_from_depot(depot) {
        Ok(store) => render_success(
            res,
            StatusCode::OK,
            "OK",
            Health {
                spatial_index: store.index_state(),
            },
        ),
        Err(e) => render_error(res, &e),
    }
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(HEALTH_ROUTE_COMPONENT).get(health)
}
