//! In-memory backend.
//!
//! ## Summary
//! Records live in a `BTreeMap` behind a `tokio` `RwLock`. The spatial index
//! is a set of `(latitude, id)` pairs: a radius query takes the latitude band
//! that can contain matches, then bounds each record by its exact haversine
//! distance. Without the index every record is measured.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::RwLock;

use medfinder_core::geo::GeoPoint;

use crate::db::spatial_index::{IndexState, IndexStatus, SPATIAL_INDEX_NAME};
use crate::error::{DbError, DbResult};
use crate::model::medicine::MedicineEntry;
use crate::model::pharmacy::{NewPharmacyRecord, PharmacyProfile};
use crate::pipeline::{
    Candidate, MatchPipeline, PharmacyMatch, StoredMedicine, project, sort_by_distance,
};
use crate::store::PharmacyStore;

/// Totally ordered latitude for the band index.
#[derive(Debug, Clone, Copy)]
struct LatitudeKey(f64);

impl PartialEq for LatitudeKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for LatitudeKey {}

impl PartialOrd for LatitudeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LatitudeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Default)]
struct LatitudeIndex(BTreeSet<(LatitudeKey, uuid::Uuid)>);

impl LatitudeIndex {
    fn insert(&mut self, location: GeoPoint, id: uuid::Uuid) {
        self.0.insert((LatitudeKey(location.latitude()), id));
    }

    fn remove(&mut self, location: GeoPoint, id: uuid::Uuid) {
        self.0.remove(&(LatitudeKey(location.latitude()), id));
    }

    fn band(&self, min: f64, max: f64) -> impl Iterator<Item = uuid::Uuid> + '_ {
        self.0
            .range((LatitudeKey(min), uuid::Uuid::nil())..=(LatitudeKey(max), uuid::Uuid::max()))
            .map(|(_, id)| *id)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    records: BTreeMap<uuid::Uuid, PharmacyProfile>,
    /// `None` until the spatial index is ensured.
    latitude_index: Option<LatitudeIndex>,
}

impl MemoryState {
    fn candidate_ids(&self, pipeline: &MatchPipeline) -> Vec<uuid::Uuid> {
        match &self.latitude_index {
            Some(index) => {
                let (min, max) = pipeline
                    .geo_near
                    .near()
                    .latitude_band(pipeline.geo_near.max_distance_meters());
                index.band(min, max).collect()
            }
            None => self.records.keys().copied().collect(),
        }
    }

    fn conflict(&self, record: &NewPharmacyRecord) -> Option<DbError> {
        self.records.values().find_map(|existing| {
            if existing.email == record.email {
                Some(DbError::Conflict(
                    "A pharmacy with this email already exists".to_string(),
                ))
            } else if existing.phone == record.phone {
                Some(DbError::Conflict(
                    "A pharmacy with this phone already exists".to_string(),
                ))
            } else {
                None
            }
        })
    }
}

/// Process-local backend for development and tests.
#[derive(Debug, Default)]
pub struct MemoryPharmacyStore {
    state: RwLock<MemoryState>,
    index: IndexStatus,
    index_disabled: bool,
}

impl MemoryPharmacyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose spatial index can never be created; every query scans.
    #[must_use]
    pub fn without_spatial_index() -> Self {
        Self {
            index_disabled: true,
            ..Self::default()
        }
    }
}

impl PharmacyStore for MemoryPharmacyStore {
    fn index_state(&self) -> IndexState {
        self.index.get()
    }

    fn ensure_spatial_index(&self) -> BoxFuture<'_, DbResult<()>> {
        async move {
            if self.index_disabled {
                self.index.set(IndexState::Unavailable);
                return Err(DbError::IndexUnavailable(format!(
                    "{SPATIAL_INDEX_NAME} is disabled for this store"
                )));
            }

            let mut state = self.state.write().await;
            if state.latitude_index.is_none() {
                let mut index = LatitudeIndex::default();
                for (id, profile) in &state.records {
                    index.insert(profile.location, *id);
                }
                state.latitude_index = Some(index);
            }
            self.index.set(IndexState::Ready);
            Ok(())
        }
        .boxed()
    }

    fn run_match_pipeline<'a>(
        &'a self,
        pipeline: &'a MatchPipeline,
    ) -> BoxFuture<'a, DbResult<Vec<PharmacyMatch>>> {
        async move {
            let state = self.state.read().await;
            let near = pipeline.geo_near.near();

            let mut candidates = Vec::new();
            let mut inventory = HashMap::new();
            for id in state.candidate_ids(pipeline) {
                let Some(profile) = state.records.get(&id) else {
                    continue;
                };
                let distance = near.distance_meters(&profile.location);
                if !pipeline.geo_near.contains(distance) {
                    continue;
                }

                let stored: Vec<StoredMedicine> = profile
                    .medicines
                    .iter()
                    .cloned()
                    .map(StoredMedicine::new)
                    .collect();
                if !pipeline.passes_medicine_filter(&stored) {
                    continue;
                }

                candidates.push(Candidate {
                    id,
                    name: profile.name.clone(),
                    email: profile.email.clone(),
                    phone: profile.phone.clone(),
                    pharmacy_name: profile.pharmacy_name.clone(),
                    location: profile.location,
                    distance,
                });
                inventory.insert(id, stored);
            }

            sort_by_distance(&mut candidates);
            tracing::debug!(candidates = candidates.len(), "Proximity and filter stages done");
            Ok(project(pipeline, candidates, inventory))
        }
        .boxed()
    }

    fn create_pharmacy(&self, record: NewPharmacyRecord) -> BoxFuture<'_, DbResult<PharmacyProfile>> {
        async move {
            let mut state = self.state.write().await;
            if let Some(conflict) = state.conflict(&record) {
                return Err(conflict);
            }

            let now = chrono::Utc::now();
            let profile = PharmacyProfile {
                id: uuid::Uuid::now_v7(),
                name: record.name,
                email: record.email,
                phone: record.phone,
                pharmacy_name: record.pharmacy_name,
                location: record.location,
                medicines: record.medicines,
                created_at: now,
                updated_at: now,
            };

            if let Some(index) = state.latitude_index.as_mut() {
                index.insert(profile.location, profile.id);
            }
            state.records.insert(profile.id, profile.clone());
            tracing::info!(pharmacy_id = %profile.id, "Pharmacy created");
            Ok(profile)
        }
        .boxed()
    }

    fn list_pharmacies(&self) -> BoxFuture<'_, DbResult<Vec<PharmacyProfile>>> {
        async move {
            let state = self.state.read().await;
            let mut profiles: Vec<PharmacyProfile> = state.records.values().cloned().collect();
            profiles.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(profiles)
        }
        .boxed()
    }

    fn get_pharmacy(&self, id: uuid::Uuid) -> BoxFuture<'_, DbResult<Option<PharmacyProfile>>> {
        async move { Ok(self.state.read().await.records.get(&id).cloned()) }.boxed()
    }

    fn replace_medicines(
        &self,
        id: uuid::Uuid,
        medicines: Vec<MedicineEntry>,
    ) -> BoxFuture<'_, DbResult<Option<Vec<MedicineEntry>>>> {
        async move {
            let mut state = self.state.write().await;
            let Some(profile) = state.records.get_mut(&id) else {
                return Ok(None);
            };
            profile.medicines.clone_from(&medicines);
            profile.updated_at = chrono::Utc::now();
            Ok(Some(medicines))
        }
        .boxed()
    }

    fn update_location(
        &self,
        id: uuid::Uuid,
        location: GeoPoint,
    ) -> BoxFuture<'_, DbResult<Option<PharmacyProfile>>> {
        async move {
            let mut state = self.state.write().await;
            let MemoryState {
                records,
                latitude_index,
            } = &mut *state;

            let Some(profile) = records.get_mut(&id) else {
                return Ok(None);
            };
            if let Some(index) = latitude_index.as_mut() {
                index.remove(profile.location, id);
                index.insert(location, id);
            }
            profile.location = location;
            profile.updated_at = chrono::Utc::now();
            Ok(Some(profile.clone()))
        }
        .boxed()
    }
}
