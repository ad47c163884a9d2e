//! Proximity search against `PostgreSQL`.
//!
//! Exercises both proximity strategies: the scan that runs before the spatial
//! index exists and the `earthdistance` index prefilter after it is built.

use std::collections::BTreeSet;

use salvo::http::StatusCode;
use salvo::test::{ResponseExt, TestClient};
use diesel_async::RunQueryDsl;
use serde_json::Value;

use medfinder_test::component::config::SearchConfig;
use medfinder_test::component::constants::MEDICINES_ROUTE_PREFIX;
use medfinder_test::component::db::pipeline::{GeoNear, MatchPipeline, MedicineMatch, PharmacyMatch};
use medfinder_test::component::db::spatial_index::IndexState;
use medfinder_test::component::db::store::PharmacyStore;
use medfinder_test::component::geo::GeoPoint;
use medfinder_test::component::search::{SearchParams, SearchQuery, find_matching_pharmacies};

use super::helpers::*;

fn origin() -> GeoPoint {
    GeoPoint::new(ORIGIN.0, ORIGIN.1).unwrap()
}

fn query(max_distance_km: &str, medicines: Option<&str>) -> SearchQuery {
    SearchQuery::parse(&SearchParams {
        longitude: Some(ORIGIN.0.to_string()),
        latitude: Some(ORIGIN.1.to_string()),
        max_distance: Some(max_distance_km.to_string()),
        medicines: medicines.map(str::to_string),
    })
    .unwrap()
}

fn summary(matches: &[PharmacyMatch]) -> Vec<(uuid::Uuid, i64, Vec<String>)> {
    matches
        .iter()
        .map(|m| {
            #[expect(clippy::cast_possible_truncation)]
            let meters = m.distance.round() as i64;
            (
                m.id,
                meters,
                m.medicines.iter().map(|e| e.name.clone()).collect(),
            )
        })
        .collect()
}

async fn seed_neighbourhood(store: &dyn PharmacyStore) {
    seed_pharmacy(
        store,
        "north3",
        north_of_origin(3.0),
        vec![
            medicine("Paracetamol", far_future()),
            medicine("Amoxicillin", far_future()),
        ],
    )
    .await;
    seed_pharmacy(
        store,
        "east1",
        east_of_origin(1.0),
        vec![medicine("PARACETAMOL", far_future())],
    )
    .await;
    seed_pharmacy(
        store,
        "north8",
        north_of_origin(8.0),
        vec![medicine("Ibuprofen", far_future())],
    )
    .await;
    seed_pharmacy(store, "empty5", north_of_origin(5.0), Vec::new()).await;
    seed_pharmacy(
        store,
        "far40",
        north_of_origin(40.0),
        vec![medicine("Paracetamol", far_future())],
    )
    .await;
}

#[test_log::test(tokio::test)]
async fn scan_strategy_finds_subset_within_radius() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let store = db.store();
    assert_eq!(store.index_state(), IndexState::Uninitialized);
    seed_neighbourhood(&store).await;

    let matches = find_matching_pharmacies(
        &store,
        &SearchConfig::default(),
        &query("10", Some("Paracetamol,Ibuprofen")),
    )
    .await
    .unwrap();

    let emails: Vec<&str> = matches.iter().map(|m| m.email.as_str()).collect();
    assert_eq!(
        emails,
        vec!["east1@example.com", "north3@example.com", "north8@example.com"]
    );
    assert_eq!(matches[1].medicines.len(), 1);
    assert_eq!(matches[1].medicines[0].name, "Paracetamol");
    assert!((matches[1].distance - 3000.0).abs() < 1.0);

    db.cleanup().await;
}

#[test_log::test(tokio::test)]
async fn indexed_and_scan_strategies_agree() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let store = db.store();
    seed_neighbourhood(&store).await;

    let searches = [
        query("10", Some("Paracetamol,Ibuprofen")),
        query("10", None),
        query("1", Some("paracetamol")),
        query("50", Some("amoxicillin")),
        query("0.5", None),
    ];

    let mut scanned = Vec::new();
    for search in &searches {
        let found = find_matching_pharmacies(&store, &SearchConfig::default(), search)
            .await
            .unwrap();
        scanned.push(summary(&found));
    }

    if let Err(e) = store.ensure_spatial_index().await {
        eprintln!("earthdistance unavailable, skipping indexed comparison: {e}");
        db.cleanup().await;
        return;
    }
    assert_eq!(store.index_state(), IndexState::Ready);

    for (search, expected) in searches.iter().zip(&scanned) {
        let found = find_matching_pharmacies(&store, &SearchConfig::default(), search)
            .await
            .unwrap();
        assert_eq!(&summary(&found), expected, "search {search:?}");
    }

    db.cleanup().await;
}

#[test_log::test(tokio::test)]
async fn ensuring_the_index_is_idempotent() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let store = db.store();

    let first = store.ensure_spatial_index().await;
    let second = store.ensure_spatial_index().await;
    assert_eq!(first.is_ok(), second.is_ok());
    let expected = if first.is_ok() {
        IndexState::Ready
    } else {
        IndexState::Unavailable
    };
    assert_eq!(store.index_state(), expected);

    db.cleanup().await;
}

#[test_log::test(tokio::test)]
async fn expired_entries_are_hidden_when_requested() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let store = db.store();
    let today = chrono::Utc::now().date_naive();
    let yesterday = today.pred_opt().unwrap();

    seed_pharmacy(
        &store,
        "stale",
        north_of_origin(1.0),
        vec![
            medicine("Paracetamol", yesterday),
            medicine("Cetirizine", far_future()),
        ],
    )
    .await;

    let geo_near = GeoNear::new(origin(), 5_000.0).unwrap();
    let wanted = MedicineMatch::new(BTreeSet::from(["paracetamol".to_string()]));

    let visible = store
        .run_match_pipeline(&MatchPipeline::new(geo_near).with_medicine_match(wanted.clone()))
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);

    let hidden = store
        .run_match_pipeline(
            &MatchPipeline::new(geo_near)
                .with_medicine_match(wanted)
                .hiding_expired_before(Some(today)),
        )
        .await
        .unwrap();
    assert!(hidden.is_empty());

    let unfiltered = store
        .run_match_pipeline(&MatchPipeline::new(geo_near).hiding_expired_before(Some(today)))
        .await
        .unwrap();
    assert_eq!(unfiltered.len(), 1);
    let names: Vec<&str> = unfiltered[0]
        .medicines
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(names, vec!["Cetirizine"]);

    db.cleanup().await;
}

#[test_log::test(tokio::test)]
async fn time_limited_pipeline_runs_inside_its_snapshot() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let store = db.store();
    seed_neighbourhood(&store).await;

    let geo_near = GeoNear::new(origin(), 4_000.0).unwrap();
    let limited = MatchPipeline::new(geo_near)
        .with_time_limit(Some(std::time::Duration::from_secs(5)));
    let found = store.run_match_pipeline(&limited).await.unwrap();
    let unlimited = store
        .run_match_pipeline(&MatchPipeline::new(geo_near))
        .await
        .unwrap();
    assert_eq!(summary(&found), summary(&unlimited));
    assert_eq!(found.len(), 2);

    // The timeout is transaction-local and must not leak into the pool.
    let mut conn = db.pool.get().await.unwrap();
    let rows: Vec<StatementTimeout> = diesel::sql_query("SHOW statement_timeout")
        .load(&mut conn)
        .await
        .unwrap();
    assert_eq!(rows[0].statement_timeout, "0");

    drop(conn);
    db.cleanup().await;
}

#[derive(diesel::QueryableByName)]
struct StatementTimeout {
    #[diesel(sql_type = diesel::sql_types::Text)]
    statement_timeout: String,
}

#[test_log::test(tokio::test)]
async fn http_search_over_postgres() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let store = std::sync::Arc::new(db.store());
    seed_neighbourhood(store.as_ref()).await;
    let service = create_db_test_service(store, test_config(&db.database_url));

    let url = format!(
        "http://127.0.0.1:5800{MEDICINES_ROUTE_PREFIX}?longitude={}&latitude={}&maxDistance=1&medicines=Paracetamol,Ibuprofen",
        ORIGIN.0, ORIGIN.1
    );
    let mut res = TestClient::get(url).send(&service).await;
    assert_eq!(res.status_code, Some(StatusCode::OK));

    let body: Value = res.take_json().await.unwrap();
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["email"], "east1@example.com");
    assert_eq!(data[0]["medicines"][0]["name"], "PARACETAMOL");

    db.cleanup().await;
}
