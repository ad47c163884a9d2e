//! Proximity and medicine-filter stages executed in `PostgreSQL`.
//!
//! ## Summary
//! Stage 1 and stage 2 run as one statement: a subquery annotates every
//! candidate with its distance, the outer query bounds it by the radius and
//! applies the medicine `EXISTS` filter, ordered nearest first. Stage 3 loads
//! the matching inventory of the survivors. Both statements share one
//! read-only `REPEATABLE READ` snapshot. When the pipeline carries a time
//! limit it becomes the snapshot's `statement_timeout`, so the server cancels
//! work the caller has already given up on.

use std::collections::HashMap;
use std::time::Duration;

use diesel::prelude::*;
use diesel::sql_types::{Array, Bool, Date, Float8, Nullable, Text, Uuid as SqlUuid};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use medfinder_core::geo::{EARTH_RADIUS_METERS, GeoPoint};

use crate::db::query::pharmacy::inventory_for;
use crate::db::schema::medicine;
use crate::db::spatial_index::ProximityStrategy;
use crate::db::transaction::with_read_snapshot;
use crate::error::DbResult;
use crate::model::medicine::MedicineRow;
use crate::pipeline::{Candidate, MatchPipeline, PharmacyMatch, StoredMedicine, project};

#[derive(Debug, QueryableByName)]
struct GeoNearRow {
    #[diesel(sql_type = SqlUuid)]
    id: uuid::Uuid,
    #[diesel(sql_type = Text)]
    name: String,
    #[diesel(sql_type = Text)]
    email: String,
    #[diesel(sql_type = Text)]
    phone: String,
    #[diesel(sql_type = Nullable<Text>)]
    pharmacy_name: Option<String>,
    #[diesel(sql_type = Float8)]
    longitude: f64,
    #[diesel(sql_type = Float8)]
    latitude: f64,
    #[diesel(sql_type = Float8)]
    distance: f64,
}

impl TryFrom<GeoNearRow> for Candidate {
    type Error = medfinder_core::error::CoreError;

    fn try_from(row: GeoNearRow) -> Result<Self, Self::Error> {
        Ok(Self {
            location: GeoPoint::new(row.longitude, row.latitude)?,
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            pharmacy_name: row.pharmacy_name,
            distance: row.distance,
        })
    }
}

// Binds: $1 longitude, $2 latitude, $3 radius in meters, $4 filter enabled,
// $5 folded medicine names, $6 expiry cutoff.
const INDEXED_CANDIDATES: &str = "\
    SELECT p.id, p.name, p.email, p.phone, p.pharmacy_name, p.longitude, p.latitude, \
           earth_distance(ll_to_earth($2, $1), ll_to_earth(p.latitude, p.longitude)) AS distance \
    FROM pharmacy p \
    WHERE earth_box(ll_to_earth($2, $1), $3) @> ll_to_earth(p.latitude, p.longitude)";

const MEDICINE_FILTER: &str = "\
    ($4 = FALSE OR EXISTS ( \
        SELECT 1 FROM medicine m \
        WHERE m.pharmacy_id = near.id \
          AND m.name_folded = ANY($5) \
          AND ($6::date IS NULL OR m.expiry_date >= $6)))";

fn scan_candidates() -> String {
    format!(
        "SELECT p.id, p.name, p.email, p.phone, p.pharmacy_name, p.longitude, p.latitude, \
                2 * {EARTH_RADIUS_METERS:.1} * asin(least(1.0, sqrt( \
                    power(sin(radians(p.latitude - $2) / 2), 2) \
                    + cos(radians($2)) * cos(radians(p.latitude)) \
                    * power(sin(radians(p.longitude - $1) / 2), 2)))) AS distance \
         FROM pharmacy p"
    )
}

/// ## Summary
/// Builds the stage 1 + stage 2 statement for the given strategy.
///
/// Both strategies bound candidates by the same spherical distance, so they
/// return identical rows.
#[must_use]
pub fn proximity_sql(strategy: ProximityStrategy) -> String {
    let candidates = match strategy {
        ProximityStrategy::Indexed => INDEXED_CANDIDATES.to_string(),
        ProximityStrategy::Scan => scan_candidates(),
    };
    format!(
        "SELECT near.id, near.name, near.email, near.phone, near.pharmacy_name, \
                near.longitude, near.latitude, near.distance \
         FROM ({candidates}) AS near \
         WHERE near.distance <= $3 AND {MEDICINE_FILTER} \
         ORDER BY near.distance ASC, near.id ASC"
    )
}

async fn load_candidates(
    conn: &mut AsyncPgConnection,
    pipeline: &MatchPipeline,
    strategy: ProximityStrategy,
) -> DbResult<Vec<Candidate>> {
    let near = pipeline.geo_near.near();
    let terms: Vec<String> = pipeline
        .medicine_match
        .as_ref()
        .map(|m| m.names().iter().cloned().collect())
        .unwrap_or_default();

    let rows: Vec<GeoNearRow> = diesel::sql_query(proximity_sql(strategy))
        .bind::<Float8, _>(near.longitude())
        .bind::<Float8, _>(near.latitude())
        .bind::<Float8, _>(pipeline.geo_near.max_distance_meters())
        .bind::<Bool, _>(pipeline.medicine_match.is_some())
        .bind::<Array<Text>, _>(terms)
        .bind::<Nullable<Date>, _>(pipeline.expired_before)
        .load(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(Candidate::try_from)
        .collect::<Result<Vec<_>, _>>()?)
}

async fn load_matching_inventory(
    conn: &mut AsyncPgConnection,
    pipeline: &MatchPipeline,
    candidates: &[Candidate],
) -> DbResult<HashMap<uuid::Uuid, Vec<StoredMedicine>>> {
    let mut grouped: HashMap<uuid::Uuid, Vec<StoredMedicine>> = HashMap::new();
    if candidates.is_empty() {
        return Ok(grouped);
    }

    let mut query = inventory_for(candidates.iter().map(|c| c.id).collect());
    if let Some(medicine_match) = &pipeline.medicine_match {
        let names: Vec<String> = medicine_match.names().iter().cloned().collect();
        query = query.filter(medicine::name_folded.eq_any(names));
    }
    if let Some(cutoff) = pipeline.expired_before {
        query = query.filter(medicine::expiry_date.ge(cutoff));
    }

    let rows: Vec<MedicineRow> = query.select(MedicineRow::as_select()).load(conn).await?;
    for row in rows {
        grouped
            .entry(row.pharmacy_id)
            .or_default()
            .push(StoredMedicine::try_from(row)?);
    }
    Ok(grouped)
}

/// `SET LOCAL` only lasts until the snapshot transaction ends. Zero would
/// disable the timeout, so the limit is at least one millisecond.
fn statement_timeout_sql(limit: Duration) -> String {
    format!("SET LOCAL statement_timeout = {}", limit.as_millis().max(1))
}

/// ## Summary
/// Runs the full match pipeline against one consistent snapshot.
///
/// ## Errors
/// Returns database errors, or `CoreError` if a stored location is invalid.
#[tracing::instrument(skip(conn, pipeline), fields(
    near = %pipeline.geo_near.near(),
    max_distance_m = pipeline.geo_near.max_distance_meters(),
))]
pub async fn run_match_pipeline(
    conn: &mut AsyncPgConnection,
    pipeline: &MatchPipeline,
    strategy: ProximityStrategy,
) -> DbResult<Vec<PharmacyMatch>> {
    let pipeline = pipeline.clone();
    with_read_snapshot(conn, move |tx| {
        async move {
            if let Some(limit) = pipeline.time_limit {
                diesel::sql_query(statement_timeout_sql(limit))
                    .execute(tx)
                    .await?;
            }

            let candidates = load_candidates(tx, &pipeline, strategy).await?;
            tracing::debug!(candidates = candidates.len(), "Proximity and filter stages done");

            let inventory = load_matching_inventory(tx, &pipeline, &candidates).await?;
            Ok(project(&pipeline, candidates, inventory))
        }
        .scope_boxed()
    })
    .await
}
