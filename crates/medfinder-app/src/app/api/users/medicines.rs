use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, handler};

use medfinder_db::model::medicine::MedicineEntry;
use medfinder_service::error::ServiceError;
use medfinder_service::identity::caller_from_depot;
use medfinder_service::pharmacy::{UpdateMedicinesRequest, replace_medicines};

use crate::app::api::response::{render_error, render_success};
use crate::config::get_config_from_depot;
use crate::error::AppResult;
use crate::store_handler::get_store_from_depot;

async fn update(req: &mut Request, depot: &Depot) -> AppResult<Vec<MedicineEntry>> {
    let body: UpdateMedicinesRequest = req.parse_json().await.map_err(|e| {
        ServiceError::ValidationError(format!(
            "Invalid input. Provide a valid userId and an array of medicines. ({e})"
        ))
    })?;

    let store = get_store_from_depot(depot)?;
    let config = get_config_from_depot(depot)?;
    Ok(replace_medicines(store.as_ref(), caller_from_depot(depot), config.auth.method, body).await?)
}

/// ## Summary
/// POST /api/users/updateMedicines - replace a pharmacy's inventory wholesale.
///
/// ## Errors
/// Returns HTTP 400 for a malformed body or entry, 403 when the caller does
/// not own the pharmacy, 404 for an unknown pharmacy and 500 on storage failure.
#[handler]
pub async fn update_medicines(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match update(req, depot).await {
        Ok(medicines) => render_success(
            res,
            StatusCode::OK,
            "Medicines replaced successfully",
            medicines,
        ),
        Err(e) => render_error(res, &e),
    }
}
