use salvo::http::StatusCode;
use salvo::{Depot, Request, Response, handler};
use serde::Serialize;

use medfinder_db::model::pharmacy::PharmacyProfile;
use medfinder_service::error::ServiceError;
use medfinder_service::identity::caller_from_depot;
use medfinder_service::pharmacy::{
    CreatePharmacyRequest, UpdateLocationRequest, create_pharmacy, get_pharmacy, list_pharmacies,
    update_location as move_pharmacy,
};

use crate::app::api::response::{render_error, render_success};
use crate::app::api::users::pharmacy_id;
use crate::config::get_config_from_depot;
use crate::error::AppResult;
use crate::store_handler::get_store_from_depot;

#[derive(Debug, Serialize)]
struct PharmacyList {
    length: usize,
    users: Vec<PharmacyProfile>,
}

/// ## Summary
/// GET /api/users - every pharmacy record.
#[handler]
pub async fn list(depot: &mut Depot, res: &mut Response) {
    let result: AppResult<Vec<PharmacyProfile>> = async {
        let store = get_store_from_depot(depot)?;
        Ok(list_pharmacies(store.as_ref()).await?)
    }
    .await;

    match result {
        Ok(users) => render_success(
            res,
            StatusCode::OK,
            "Users retrieved successfully",
            PharmacyList {
                length: users.len(),
                users,
            },
        ),
        Err(e) => render_error(res, &e),
    }
}

async fn create_inner(req: &mut Request, depot: &Depot) -> AppResult<PharmacyProfile> {
    let body: CreatePharmacyRequest = req
        .parse_json()
        .await
        .map_err(|e| ServiceError::ValidationError(format!("Failed to create user: {e}")))?;

    let store = get_store_from_depot(depot)?;
    Ok(create_pharmacy(store.as_ref(), body).await?)
}

/// ## Summary
/// POST /api/users - create a pharmacy with its initial inventory.
///
/// ## Errors
/// Returns HTTP 400 for a malformed body, 409 when the email or phone is
/// taken and 500 on storage failure.
#[handler]
pub async fn create(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match create_inner(req, depot).await {
        Ok(profile) => render_success(res, StatusCode::CREATED, "User created successfully!", profile),
        Err(e) => render_error(res, &e),
    }
}

async fn get_inner(req: &Request, depot: &Depot) -> AppResult<PharmacyProfile> {
    let id = pharmacy_id(req)?;
    let store = get_store_from_depot(depot)?;
    Ok(get_pharmacy(store.as_ref(), id).await?)
}

/// ## Summary
/// GET /api/users/{id} - one pharmacy record.
#[handler]
pub async fn show(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match get_inner(req, depot).await {
        Ok(profile) => render_success(res, StatusCode::OK, "User retrieved successfully", profile),
        Err(e) => render_error(res, &e),
    }
}

async fn update_location_inner(req: &mut Request, depot: &Depot) -> AppResult<PharmacyProfile> {
    let id = pharmacy_id(req)?;
    let body: UpdateLocationRequest = req.parse_json().await.map_err(|e| {
        ServiceError::ValidationError(format!(
            "Invalid location format. Provide [longitude, latitude]. ({e})"
        ))
    })?;

    let store = get_store_from_depot(depot)?;
    let config = get_config_from_depot(depot)?;
    Ok(move_pharmacy(store.as_ref(), caller_from_depot(depot), config.auth.method, id, body).await?)
}

/// ## Summary
/// POST /api/users/{id} - move a pharmacy to `{"coordinates": [longitude, latitude]}`.
///
/// ## Errors
/// Returns HTTP 400 for bad coordinates, 403 when the caller does not own the
/// pharmacy, 404 for an unknown pharmacy and 500 on storage failure.
#[handler]
pub async fn update_location(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match update_location_inner(req, depot).await {
        Ok(profile) => render_success(
            res,
            StatusCode::OK,
            "User location updated successfully!",
            profile,
        ),
        Err(e) => render_error(res, &e),
    }
}
