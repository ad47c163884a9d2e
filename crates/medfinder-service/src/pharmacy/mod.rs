//! Pharmacy record services: creation, lookup, inventory replacement and
//! location updates.

use serde::Deserialize;

use medfinder_core::config::AuthMethod;
use medfinder_core::geo::GeoPoint;
use medfinder_db::model::medicine::MedicineEntry;
use medfinder_db::model::pharmacy::{NewPharmacyRecord, PharmacyProfile};
use medfinder_db::store::PharmacyStore;

use crate::error::{ServiceError, ServiceResult};
use crate::identity::{Caller, authorize_mutation};


pub const PHARMACY_NOT_FOUND: &str = "User not found";

/// Body of a pharmacy creation request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePharmacyRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub pharmacy_name: Option<String>,
    pub location: GeoPoint,
    #[serde(default)]
    pub medicines: Vec<MedicineEntry>,
}

/// Body of an inventory replacement request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMedicinesRequest {
    pub user_id: Option<uuid::Uuid>,
    pub medicines: Option<Vec<MedicineEntry>>,
}

/// Body of a location update request: `[longitude, latitude]`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLocationRequest {
    pub coordinates: Option<Vec<f64>>,
}

fn required_text(field: &str, value: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::ValidationError(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// ## Summary
/// Checks every entry of an inventory.
///
/// ## Errors
/// Returns `ValidationError` naming the first entry with an empty name or a
/// negative or non-finite price.
pub fn validate_medicines(medicines: &[MedicineEntry]) -> ServiceResult<()> {
    for (position, entry) in medicines.iter().enumerate() {
        if entry.name.trim().is_empty() {
            return Err(ServiceError::ValidationError(format!(
                "medicines[{position}].name is required"
            )));
        }
        if !entry.price.is_finite() || entry.price < 0.0 {
            return Err(ServiceError::ValidationError(format!(
                "medicines[{position}].price must be a non-negative number"
            )));
        }
    }
    Ok(())
}

fn normalize_medicines(medicines: Vec<MedicineEntry>) -> Vec<MedicineEntry> {
    medicines
        .into_iter()
        .map(|entry| MedicineEntry {
            name: entry.name.trim().to_string(),
            ..entry
        })
        .collect()
}

/// ## Summary
/// Creates a pharmacy record with its initial inventory.
///
/// Emails are stored lowercased; the optional display name is dropped when blank.
///
/// ## Errors
/// Returns `ValidationError` for missing profile fields or bad entries, and
/// `Conflict` when the email or phone is already registered.
#[tracing::instrument(skip(store, request), fields(email = %request.email))]
pub async fn create_pharmacy(
    store: &dyn PharmacyStore,
    request: CreatePharmacyRequest,
) -> ServiceResult<PharmacyProfile> {
    validate_medicines(&request.medicines)?;

    let record = NewPharmacyRecord {
        name: required_text("name", &request.name)?,
        email: required_text("email", &request.email)?.to_lowercase(),
        phone: required_text("phone", &request.phone)?,
        pharmacy_name: request
            .pharmacy_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty()),
        location: request.location,
        medicines: normalize_medicines(request.medicines),
    };

    Ok(store.create_pharmacy(record).await?)
}

/// ## Errors
/// Returns `DatabaseError` if the store fails.
pub async fn list_pharmacies(store: &dyn PharmacyStore) -> ServiceResult<Vec<PharmacyProfile>> {
    let pharmacies = store.list_pharmacies().await?;
    if pharmacies.is_empty() {
        tracing::debug!("No pharmacies registered");
    }
    Ok(pharmacies)
}

/// ## Errors
/// Returns `NotFound` for an unknown id.
pub async fn get_pharmacy(store: &dyn PharmacyStore, id: uuid::Uuid) -> ServiceResult<PharmacyProfile> {
    store
        .get_pharmacy(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(PHARMACY_NOT_FOUND.to_string()))
}

/// ## Summary
/// Replaces a pharmacy's inventory wholesale.
///
/// ## Errors
/// Returns `ValidationError` when `userId` or `medicines` is missing or an
/// entry is invalid, `Forbidden` when the caller does not own the record, and
/// `NotFound` for an unknown id.
#[tracing::instrument(skip(store, request), fields(pharmacy_id = ?request.user_id))]
pub async fn replace_medicines(
    store: &dyn PharmacyStore,
    caller: Caller,
    auth: AuthMethod,
    request: UpdateMedicinesRequest,
) -> ServiceResult<Vec<MedicineEntry>> {
    let (Some(id), Some(medicines)) = (request.user_id, request.medicines) else {
        return Err(ServiceError::ValidationError(
            "Invalid input. Provide a valid userId and an array of medicines.".to_string(),
        ));
    };

    authorize_mutation(caller, auth, id)?;
    validate_medicines(&medicines)?;

    store
        .replace_medicines(id, normalize_medicines(medicines))
        .await?
        .ok_or_else(|| ServiceError::NotFound(PHARMACY_NOT_FOUND.to_string()))
}

/// ## Summary
/// Moves a pharmacy to new coordinates.
///
/// ## Errors
/// Returns `ValidationError` unless exactly two in-range coordinates are
/// given, `Forbidden` when the caller does not own the record, and `NotFound`
/// for an unknown id.
#[tracing::instrument(skip(store, request))]
pub async fn update_location(
    store: &dyn PharmacyStore,
    caller: Caller,
    auth: AuthMethod,
    id: uuid::Uuid,
    request: UpdateLocationRequest,
) -> ServiceResult<PharmacyProfile> {
    authorize_mutation(caller, auth, id)?;

    let location = request
        .coordinates
        .as_deref()
        .map(GeoPoint::from_coordinates)
        .unwrap_or_else(|| GeoPoint::from_coordinates(&[]))?;

    store
        .update_location(id, location)
        .await?
        .ok_or_else(|| ServiceError::NotFound(PHARMACY_NOT_FOUND.to_string()))
}
