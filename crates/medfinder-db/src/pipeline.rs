//! Staged medicine-match pipeline.
//!
//! ## Summary
//! A [`MatchPipeline`] describes the three stages of a medicine search:
//!
//! 1. **Proximity** ([`GeoNear`]): records within a spherical radius, each
//!    annotated with its distance in meters, nearest first.
//! 2. **Medicine filter** ([`MedicineMatch`]): when present, drop records with
//!    no inventory entry whose folded name is in the match set.
//! 3. **Projection** ([`project`]): emit the allow-listed [`PharmacyMatch`]
//!    with only the matching inventory entries.
//!
//! Backends execute stages 1 and 2 natively and share [`project`] for
//! stage 3, so filtering semantics are defined once.

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use medfinder_core::error::{CoreError, CoreResult};
use medfinder_core::geo::GeoPoint;
use medfinder_core::util::fold::fold_medicine_name;

use crate::model::medicine::{MedicineEntry, MedicineRow};

/// Proximity stage: everything within `max_distance_meters` of `near`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoNear {
    near: GeoPoint,
    max_distance_meters: f64,
}

impl GeoNear {
    /// ## Errors
    /// Returns `ValidationError` unless the radius is finite and positive.
    pub fn new(near: GeoPoint, max_distance_meters: f64) -> CoreResult<Self> {
        if !max_distance_meters.is_finite() || max_distance_meters <= 0.0 {
            return Err(CoreError::ValidationError(format!(
                "maximum distance must be a finite positive number, got {max_distance_meters}"
            )));
        }
        Ok(Self {
            near,
            max_distance_meters,
        })
    }

    #[must_use]
    pub const fn near(&self) -> GeoPoint {
        self.near
    }

    #[must_use]
    pub const fn max_distance_meters(&self) -> f64 {
        self.max_distance_meters
    }

    #[must_use]
    pub fn contains(&self, distance_meters: f64) -> bool {
        distance_meters <= self.max_distance_meters
    }
}

/// Medicine filter stage: a set of case-folded medicine names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicineMatch {
    names: BTreeSet<String>,
}

impl MedicineMatch {
    /// Returns `None` for an empty set; an empty filter is no filter.
    #[must_use]
    pub fn new(folded_names: BTreeSet<String>) -> Option<Self> {
        if folded_names.is_empty() {
            None
        } else {
            Some(Self {
                names: folded_names,
            })
        }
    }

    #[must_use]
    pub const fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    #[must_use]
    pub fn matches(&self, folded_name: &str) -> bool {
        self.names.contains(folded_name)
    }
}

/// A full search: proximity, optional medicine filter, projection.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchPipeline {
    pub geo_near: GeoNear,
    pub medicine_match: Option<MedicineMatch>,
    /// Entries expiring before this date are invisible to stages 2 and 3.
    pub expired_before: Option<NaiveDate>,
    /// Upper bound a backend may enforce on its own statements.
    pub time_limit: Option<Duration>,
}

impl MatchPipeline {
    #[must_use]
    pub const fn new(geo_near: GeoNear) -> Self {
        Self {
            geo_near,
            medicine_match: None,
            expired_before: None,
            time_limit: None,
        }
    }

    #[must_use]
    pub fn with_medicine_match(mut self, medicine_match: Option<MedicineMatch>) -> Self {
        self.medicine_match = medicine_match;
        self
    }

    #[must_use]
    pub const fn hiding_expired_before(mut self, date: Option<NaiveDate>) -> Self {
        self.expired_before = date;
        self
    }

    #[must_use]
    pub const fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    /// Whether an inventory entry survives into the projected result.
    #[must_use]
    pub fn keeps_entry(&self, medicine: &StoredMedicine) -> bool {
        let fresh = self
            .expired_before
            .is_none_or(|cutoff| medicine.entry.expiry_date >= cutoff);
        let wanted = self
            .medicine_match
            .as_ref()
            .is_none_or(|m| m.matches(&medicine.name_folded));
        fresh && wanted
    }

    /// Stage 2 evaluated in process.
    #[must_use]
    pub fn passes_medicine_filter(&self, inventory: &[StoredMedicine]) -> bool {
        self.medicine_match.is_none() || inventory.iter().any(|m| self.keeps_entry(m))
    }
}

/// An inventory entry paired with its folded name.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredMedicine {
    pub name_folded: String,
    pub entry: MedicineEntry,
}

impl StoredMedicine {
    #[must_use]
    pub fn new(entry: MedicineEntry) -> Self {
        Self {
            name_folded: fold_medicine_name(&entry.name),
            entry,
        }
    }
}

impl TryFrom<MedicineRow> for StoredMedicine {
    type Error = CoreError;

    fn try_from(row: MedicineRow) -> CoreResult<Self> {
        Ok(Self {
            name_folded: row.name_folded.clone(),
            entry: MedicineEntry::try_from(row)?,
        })
    }
}

/// Output of stage 1: a record in range with its distance.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub pharmacy_name: Option<String>,
    pub location: GeoPoint,
    pub distance: f64,
}

/// Query Result Entity: constructed per query, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyMatch {
    #[serde(rename = "_id")]
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub pharmacy_name: Option<String>,
    pub location: GeoPoint,
    /// Meters from the query point.
    pub distance: f64,
    pub medicines: Vec<MedicineEntry>,
}

/// Orders candidates nearest first; ties break on id for stable output.
pub fn sort_by_distance(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
}

/// ## Summary
/// Projection stage. Emits one [`PharmacyMatch`] per candidate, in candidate
/// order, carrying only the inventory entries the pipeline keeps.
///
/// A candidate whose kept inventory is empty while a medicine filter is active
/// is dropped rather than emitted with an empty list.
#[must_use]
pub fn project(
    pipeline: &MatchPipeline,
    candidates: Vec<Candidate>,
    mut inventory: HashMap<uuid::Uuid, Vec<StoredMedicine>>,
) -> Vec<PharmacyMatch> {
    candidates
        .into_iter()
        .filter_map(|candidate| {
            let medicines: Vec<MedicineEntry> = inventory
                .remove(&candidate.id)
                .unwrap_or_default()
                .into_iter()
                .filter(|m| pipeline.keeps_entry(m))
                .map(|m| m.entry)
                .collect();

            if pipeline.medicine_match.is_some() && medicines.is_empty() {
                return None;
            }

            Some(PharmacyMatch {
                id: candidate.id,
                name: candidate.name,
                email: candidate.email,
                phone: candidate.phone,
                pharmacy_name: candidate.pharmacy_name,
                location: candidate.location,
                distance: candidate.distance,
                medicines,
            })
        })
        .collect()
}
