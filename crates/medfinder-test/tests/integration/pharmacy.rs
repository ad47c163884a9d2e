//! Pharmacy record persistence against `PostgreSQL`.

use medfinder_test::component::db::DbError;
use medfinder_test::component::db::pipeline::{GeoNear, MatchPipeline};
use medfinder_test::component::db::store::PharmacyStore;
use medfinder_test::component::geo::GeoPoint;
use medfinder_test::component::model::pharmacy::NewPharmacyRecord;

use super::helpers::*;

#[test_log::test(tokio::test)]
async fn create_then_read_back() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let store = db.store();

    let created = seed_pharmacy(
        &store,
        "asha",
        north_of_origin(2.0),
        vec![
            medicine("Paracetamol", far_future()),
            medicine("Amoxicillin", far_future()),
        ],
    )
    .await;

    let fetched = store.get_pharmacy(created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);
    let names: Vec<&str> = fetched.medicines.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Paracetamol", "Amoxicillin"]);

    assert!(store.get_pharmacy(uuid::Uuid::now_v7()).await.unwrap().is_none());
    assert_eq!(store.list_pharmacies().await.unwrap().len(), 1);

    db.cleanup().await;
}

#[test_log::test(tokio::test)]
async fn duplicate_email_is_a_conflict() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let store = db.store();
    let first = seed_pharmacy(&store, "asha", north_of_origin(2.0), Vec::new()).await;

    let result = store
        .create_pharmacy(NewPharmacyRecord {
            name: "Someone Else".to_string(),
            email: first.email.clone(),
            phone: "phone-other".to_string(),
            pharmacy_name: None,
            location: north_of_origin(4.0),
            medicines: Vec::new(),
        })
        .await;
    assert!(matches!(result, Err(DbError::Conflict(_))), "{result:?}");
    assert_eq!(store.list_pharmacies().await.unwrap().len(), 1);

    db.cleanup().await;
}

#[test_log::test(tokio::test)]
async fn replace_medicines_is_wholesale() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let store = db.store();
    let created = seed_pharmacy(
        &store,
        "asha",
        north_of_origin(2.0),
        vec![medicine("Paracetamol", far_future())],
    )
    .await;

    let replaced = store
        .replace_medicines(
            created.id,
            vec![
                medicine("Ibuprofen", far_future()),
                medicine("Cetirizine", far_future()),
            ],
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(replaced.len(), 2);

    let fetched = store.get_pharmacy(created.id).await.unwrap().unwrap();
    let names: Vec<&str> = fetched.medicines.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Ibuprofen", "Cetirizine"]);

    let unknown = store
        .replace_medicines(uuid::Uuid::now_v7(), Vec::new())
        .await
        .unwrap();
    assert!(unknown.is_none());

    db.cleanup().await;
}

#[test_log::test(tokio::test)]
async fn moved_pharmacy_is_found_at_new_location() {
    let Some(db) = TestDb::new().await else {
        return;
    };
    let store = db.store();
    let created = seed_pharmacy(
        &store,
        "asha",
        north_of_origin(30.0),
        vec![medicine("Paracetamol", far_future())],
    )
    .await;

    let origin = GeoPoint::new(ORIGIN.0, ORIGIN.1).unwrap();
    let pipeline = MatchPipeline::new(GeoNear::new(origin, 5_000.0).unwrap());
    assert!(store.run_match_pipeline(&pipeline).await.unwrap().is_empty());

    let moved = store
        .update_location(created.id, north_of_origin(2.0))
        .await
        .unwrap()
        .unwrap();
    assert!(moved.updated_at >= created.updated_at);

    let found = store.run_match_pipeline(&pipeline).await.unwrap();
    assert_eq!(found.len(), 1);
    assert!((found[0].distance - 2000.0).abs() < 1.0);

    db.cleanup().await;
}
