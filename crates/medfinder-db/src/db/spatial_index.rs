//! Spatial index lifecycle.
//!
//! ## Summary
//! Pharmacy locations are indexed with a GiST index over
//! `ll_to_earth(latitude, longitude)` from the `cube`/`earthdistance`
//! extensions. [`ensure_index`] creates the extensions and the index and is
//! safe to call on every start. The outcome is kept in an [`IndexStatus`]
//! shared by every query, which picks its [`ProximityStrategy`] from it.
//!
//! A missing index never changes query results: the scan strategy applies
//! the same spherical radius bound, only without the index prefilter.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;

use crate::error::{DbError, DbResult};
use crate::store::PharmacyStore;

pub const SPATIAL_INDEX_NAME: &str = "pharmacy_location_earth_idx";

const ENSURE_INDEX_STATEMENTS: [&str; 3] = [
    "CREATE EXTENSION IF NOT EXISTS cube",
    "CREATE EXTENSION IF NOT EXISTS earthdistance",
    "CREATE INDEX IF NOT EXISTS pharmacy_location_earth_idx \
     ON pharmacy USING gist (ll_to_earth(latitude, longitude))",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexState {
    /// `initialize` has not run yet.
    Uninitialized,
    Ready,
    /// Index creation failed; queries scan or refuse, depending on configuration.
    Unavailable,
}

impl IndexState {
    const fn to_u8(self) -> u8 {
        match self {
            Self::Uninitialized => 0,
            Self::Ready => 1,
            Self::Unavailable => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Ready,
            2 => Self::Unavailable,
            _ => Self::Uninitialized,
        }
    }

    #[must_use]
    pub const fn strategy(self) -> ProximityStrategy {
        match self {
            Self::Ready => ProximityStrategy::Indexed,
            Self::Uninitialized | Self::Unavailable => ProximityStrategy::Scan,
        }
    }
}

impl std::fmt::Display for IndexState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready => "ready",
            Self::Unavailable => "unavailable",
        })
    }
}

/// How the proximity stage finds its candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProximityStrategy {
    /// Prefilter through the spatial index, then bound by exact distance.
    Indexed,
    /// Compute the spherical distance of every record.
    Scan,
}

/// Process-wide spatial index state, cheap to clone and share.
#[derive(Debug, Clone, Default)]
pub struct IndexStatus(Arc<AtomicU8>);

impl IndexStatus {
    #[must_use]
    pub fn get(&self) -> IndexState {
        IndexState::from_u8(AtomicU8::load(&self.0, Ordering::Acquire))
    }

    pub fn set(&self, state: IndexState) {
        AtomicU8::store(&self.0, state.to_u8(), Ordering::Release);
    }
}

/// ## Summary
/// Creates the `earthdistance` extensions and the location index if missing.
///
/// Idempotent: every statement is `IF NOT EXISTS`.
///
/// ## Errors
/// Returns `IndexUnavailable` carrying the database error if any statement fails.
#[tracing::instrument(skip(conn))]
pub async fn ensure_index(conn: &mut AsyncPgConnection) -> DbResult<()> {
    for statement in ENSURE_INDEX_STATEMENTS {
        tracing::trace!(statement, "Ensuring spatial index");
        diesel::sql_query(statement)
            .execute(conn)
            .await
            .map_err(|e| DbError::IndexUnavailable(e.to_string()))?;
    }
    Ok(())
}

/// ## Summary
/// Brings the store's spatial index up once during process startup.
///
/// Failure is logged and reported through the returned state; it never aborts
/// startup. Queries observe the same state through the store.
#[tracing::instrument(skip(store))]
pub async fn initialize(store: &dyn PharmacyStore) -> IndexState {
    match store.ensure_spatial_index().await {
        Ok(()) => {
            tracing::info!(index = SPATIAL_INDEX_NAME, "Spatial index ready");
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                index = SPATIAL_INDEX_NAME,
                "Failed to create spatial index; proximity queries will scan"
            );
        }
    }
    store.index_state()
}
