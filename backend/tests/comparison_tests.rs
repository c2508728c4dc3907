//! Comparison pipeline against the seeded local repository: selection,
//! concurrent fetch, fallback and table layout.

mod support;

use std::sync::Arc;

use serde_json::json;

use facility_compare::api::{CellValue, NavigationTarget, RowSection};
use facility_compare::db::{FacilityRepository, LocalRepository};
use facility_compare::models::{FacilityId, FacilityType, GeoPoint};
use facility_compare::services::{
    build_comparison_table, ComparisonService, LoadOutcome, SelectionStore,
};

fn select(store: &SelectionStore, facility_type: FacilityType, ids: &[&str]) {
    for id in ids {
        assert!(store.add(&json!({"_id": id, "name": format!("Listing {}", id)}), facility_type));
    }
}

fn service(repo: &LocalRepository) -> ComparisonService {
    let repository: Arc<dyn FacilityRepository> = Arc::new(repo.clone());
    ComparisonService::new(repository)
}

#[tokio::test]
async fn test_hospital_table_from_seeded_repository() {
    let repo = support::seeded_repository();
    let store = SelectionStore::new();
    select(&store, FacilityType::Hospital, &["h1", "h2", "h3"]);

    let svc = service(&repo);
    let (lat, lon) = support::DELHI;
    let outcome = svc
        .load_comparison(&store.snapshot(), Some(GeoPoint::new(lat, lon)))
        .await
        .unwrap();
    let loaded = outcome.applied().unwrap().clone();
    assert!(loaded.degraded.is_empty());

    let table = build_comparison_table(&loaded);
    assert_eq!(table.facility_type, FacilityType::Hospital);
    let names: Vec<&str> = table.header.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["AIIMS", "Safdarjung", "Max Saket"]);
    assert_eq!(table.header[0].locality, "New Delhi, Delhi");
    assert_eq!(
        table.header[0].detail,
        NavigationTarget::detail(FacilityType::Hospital, FacilityId::new("h1"))
    );

    let address = table.row("Address").unwrap();
    assert_eq!(
        address.cells[0].to_string(),
        "1 Ring Road, New Delhi, Delhi, 110001"
    );

    let monday = table.row("Monday").unwrap();
    assert_eq!(monday.section, RowSection::Hours);
    assert_eq!(monday.cells[0].to_string(), "9:00 AM - 9:00 PM");

    let emergency = table.row("24/7 Emergency").unwrap();
    assert!(emergency
        .cells
        .iter()
        .all(|c| *c == CellValue::Availability { available: true }));

    let distance = table.row("Distance").unwrap();
    assert_eq!(distance.cells[0].to_string(), "0.0 km away");

    let cost = table.row("Starting Cost").unwrap();
    assert_eq!(cost.cells[0].to_string(), "₹600");
    assert_eq!(cost.best_index, Some(0));

    assert_eq!(table.feature_count, 2);
    assert!(table.row("ICU").is_some());
    assert!(table.row("Pharmacy").is_some());
    assert_eq!(table.labels().last(), Some(&"Actions"));
}

#[tokio::test]
async fn test_laboratory_table() {
    let repo = support::seeded_repository();
    repo.insert_record(
        FacilityType::Laboratory,
        &json!({"_id": "l2", "name": "Metropolis", "reportTime": "48 hours"}),
    )
    .unwrap();
    let store = SelectionStore::new();
    select(&store, FacilityType::Laboratory, &["l1", "l2"]);

    let svc = service(&repo);
    let outcome = svc.load_comparison(&store.snapshot(), None).await.unwrap();
    let table = build_comparison_table(outcome.applied().unwrap());

    assert!(table.row("24/7 Emergency").is_none());
    let home = table.row("Home Collection").unwrap();
    assert_eq!(home.cells[0].to_string(), "Available");
    assert_eq!(home.cells[1].to_string(), "Not Available");
    assert_eq!(table.row("Report Time").unwrap().cells[1].to_string(), "48 hours");

    let cost = table.row("Starting Cost").unwrap();
    assert_eq!(cost.cells[0].to_string(), "₹350");
    assert_eq!(cost.best_index, Some(0));

    let distance = table.row("Distance").unwrap();
    assert!(distance.cells.iter().all(|c| c.to_string() == "Enable GPS"));
    assert_eq!(distance.best_index, None);

    let accredited = table.row("NABL Accredited").unwrap();
    assert_eq!(accredited.cells[0], CellValue::Presence { available: true });
    assert_eq!(accredited.cells[1], CellValue::Presence { available: false });
}

#[tokio::test]
async fn test_failed_fetch_degrades_only_that_slot() {
    let repo = support::seeded_repository();
    repo.mark_unreachable(FacilityType::Hospital, &FacilityId::new("h2"));
    let store = SelectionStore::new();
    select(&store, FacilityType::Hospital, &["h1", "h2"]);

    let svc = service(&repo);
    let outcome = svc.load_comparison(&store.snapshot(), None).await.unwrap();
    let loaded = outcome.applied().unwrap();
    assert_eq!(loaded.degraded, vec![FacilityId::new("h2")]);
    assert!(!loaded.all_failed());

    let table = build_comparison_table(loaded);
    assert_eq!(table.header[0].name, "AIIMS");
    assert_eq!(table.header[1].name, "Listing h2");
    assert_eq!(table.row("Phone").unwrap().cells[1].to_string(), "N/A");
    assert_eq!(table.degraded, vec![FacilityId::new("h2")]);
}

#[tokio::test]
async fn test_unknown_facility_falls_back_to_summary() {
    let repo = support::seeded_repository();
    let store = SelectionStore::new();
    select(&store, FacilityType::Hospital, &["h1", "missing"]);

    let svc = service(&repo);
    let outcome = svc.load_comparison(&store.snapshot(), None).await.unwrap();
    let loaded = outcome.applied().unwrap();
    assert_eq!(loaded.items.len(), 2);
    assert!(loaded.is_degraded(&FacilityId::new("missing")));
}

#[tokio::test]
async fn test_refresh_picks_up_changed_records() {
    let repo = support::seeded_repository();
    let store = SelectionStore::new();
    select(&store, FacilityType::Hospital, &["h1", "h2"]);
    let svc = service(&repo);

    let first = svc.load_comparison(&store.snapshot(), None).await.unwrap();
    assert_eq!(first.applied().unwrap().items[1].phone.as_deref(), Some("011-2658-8500"));

    repo.insert_record(
        FacilityType::Hospital,
        &json!({"_id": "h2", "name": "Safdarjung", "phone": "011-2616-5060"}),
    )
    .unwrap();

    let refreshed = svc.refresh().await.unwrap();
    let loaded = refreshed.applied().unwrap();
    assert_eq!(loaded.sequence, 2);
    assert_eq!(loaded.items[1].phone.as_deref(), Some("011-2616-5060"));
    assert_eq!(svc.current().unwrap().sequence, 2);
}

#[tokio::test]
async fn test_slow_earlier_load_is_discarded() {
    let repo = support::seeded_repository();
    repo.set_latency(
        FacilityType::Hospital,
        &FacilityId::new("h1"),
        std::time::Duration::from_millis(150),
    );
    let svc = service(&repo);

    let slow = SelectionStore::new();
    select(&slow, FacilityType::Hospital, &["h1", "h2"]);
    let fast = SelectionStore::new();
    select(&fast, FacilityType::Hospital, &["h3", "h4"]);
    let slow_snapshot = slow.snapshot();
    let fast_snapshot = fast.snapshot();

    let (first, second) = tokio::join!(svc.load_comparison(&slow_snapshot, None), async {
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        svc.load_comparison(&fast_snapshot, None).await
    });

    let first = first.unwrap();
    assert!(matches!(
        first,
        LoadOutcome::Superseded {
            sequence: 1,
            latest: 2,
            ..
        }
    ));
    assert_eq!(first.batch().items[0].name, "AIIMS");
    assert!(matches!(second.unwrap(), LoadOutcome::Applied(_)));
    let names: Vec<String> = svc
        .current()
        .unwrap()
        .items
        .iter()
        .map(|i| i.name.clone())
        .collect();
    assert_eq!(names, vec!["Max Saket", "Fortis"]);
}
