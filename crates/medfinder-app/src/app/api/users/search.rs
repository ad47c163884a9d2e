use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, handler};

use medfinder_db::pipeline::PharmacyMatch;
use medfinder_service::search::{SearchParams, SearchQuery, find_matching_pharmacies};

use crate::app::api::response::{render_error, render_success};
use crate::config::get_config_from_depot;
use crate::error::AppResult;
use crate::store_handler::get_store_from_depot;

fn search_params(req: &Request) -> SearchParams {
    SearchParams {
        longitude: req.query::<String>("longitude"),
        latitude: req.query::<String>("latitude"),
        max_distance: req.query::<String>("maxDistance"),
        medicines: req.query::<String>("medicines"),
    }
}

async fn search(req: &Request, depot: &Depot) -> AppResult<Vec<PharmacyMatch>> {
    // Validation happens before the store is even looked up.
    let query = SearchQuery::parse(&search_params(req))?;

    let store = get_store_from_depot(depot)?;
    let config = get_config_from_depot(depot)?;
    Ok(find_matching_pharmacies(store.as_ref(), &config.search, &query).await?)
}

/// ## Summary
/// GET /api/users/medicines - nearby pharmacies stocking the requested medicines.
///
/// Query: `longitude`, `latitude`, `maxDistance` (km), optional `medicines`
/// (comma separated). Responds with matches nearest first, each with its
/// `distance` in meters and only its matching medicines.
///
/// ## Errors
/// Returns HTTP 400 for missing or malformed parameters, 503 when the spatial
/// index is required but unavailable, 504 on timeout and 500 on storage failure.
#[handler]
pub async fn find_medicines(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match search(req, depot).await {
        Ok(matches) => {
            render_success(res, StatusCode::OK, "Users retrieved successfully", matches);
        }
        Err(e) => render_error(res, &e),
    }
}
