use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Deserialize;

use medfinder_core::constants::METERS_PER_KILOMETER;
use medfinder_core::geo::GeoPoint;
use medfinder_core::util::fold::fold_medicine_list;
use medfinder_db::pipeline::{GeoNear, MatchPipeline, MedicineMatch};

use crate::error::{ServiceError, ServiceResult};

/// Raw query string of the medicine search, exactly as received.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub longitude: Option<String>,
    pub latitude: Option<String>,
    pub max_distance: Option<String>,
    pub medicines: Option<String>,
}

/// A validated, normalized medicine search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub near: GeoPoint,
    pub max_distance_km: f64,
    /// Case-folded medicine names; empty means no medicine filter.
    pub medicines: BTreeSet<String>,
}

fn required_number(name: &'static str, raw: Option<&str>) -> ServiceResult<f64> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ServiceError::ValidationError(format!("Missing required parameter: {name}")))?;

    let value: f64 = raw.parse().map_err(|e| {
        ServiceError::ValidationError(format!("Invalid {name}: {raw:?} is not a number ({e})"))
    })?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(ServiceError::ValidationError(format!(
            "Invalid {name}: {raw:?} is not a finite number"
        )))
    }
}

impl SearchQuery {
    /// ## Summary
    /// Validates raw parameters. Runs before any storage access.
    ///
    /// ## Errors
    /// Returns `ValidationError` if `longitude`, `latitude` or `maxDistance`
    /// is missing, not a finite number, or out of range.
    pub fn parse(params: &SearchParams) -> ServiceResult<Self> {
        let longitude = required_number("longitude", params.longitude.as_deref())?;
        let latitude = required_number("latitude", params.latitude.as_deref())?;
        let max_distance_km = required_number("maxDistance", params.max_distance.as_deref())?;

        if max_distance_km <= 0.0 {
            return Err(ServiceError::ValidationError(format!(
                "Invalid maxDistance: must be greater than zero, got {max_distance_km}"
            )));
        }

        Ok(Self {
            near: GeoPoint::new(longitude, latitude)?,
            max_distance_km,
            medicines: params
                .medicines
                .as_deref()
                .map(fold_medicine_list)
                .unwrap_or_default(),
        })
    }

    #[must_use]
    pub fn max_distance_meters(&self) -> f64 {
        self.max_distance_km * METERS_PER_KILOMETER
    }

    /// ## Summary
    /// Composes the staged pipeline for this query.
    ///
    /// ## Errors
    /// Returns `ValidationError` if the radius overflows once in meters.
    pub fn to_pipeline(&self, expired_before: Option<NaiveDate>) -> ServiceResult<MatchPipeline> {
        let geo_near = GeoNear::new(self.near, self.max_distance_meters())?;
        Ok(MatchPipeline::new(geo_near)
            .with_medicine_match(MedicineMatch::new(self.medicines.clone()))
            .hiding_expired_before(expired_before))
    }
}

impl TryFrom<&SearchParams> for SearchQuery {
    type Error = ServiceError;

    fn try_from(params: &SearchParams) -> Result<Self, Self::Error> {
        Self::parse(params)
    }
}
