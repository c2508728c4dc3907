#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::api::NavigationTarget;
    use crate::db::repositories::LocalRepository;
    use crate::models::{FacilityId, FacilityType, GeoPoint};
    use crate::services::compare::{
        CompareError, ComparisonService, LoadOutcome, Navigator,
    };
    use crate::services::selection::{SelectionSnapshot, SelectionStore};

    #[derive(Default)]
    struct RecordingNavigator {
        visited: Mutex<Vec<NavigationTarget>>,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, target: NavigationTarget) {
            self.visited.lock().push(target);
        }
    }

    fn hospital(id: &str, lon: f64, lat: f64) -> Value {
        json!({
            "_id": id,
            "name": format!("Hospital {}", id),
            "location": {"type": "Point", "coordinates": [lon, lat]},
            "googleRating": 4.0,
            "facilities": ["ICU"]
        })
    }

    fn setup(ids: &[&str]) -> (LocalRepository, Arc<SelectionSnapshot>) {
        let repo = LocalRepository::new();
        let store = SelectionStore::new();
        for id in ids {
            let record = hospital(id, 77.2090, 28.6139);
            repo.insert_record(FacilityType::Hospital, &record).unwrap();
            assert!(store.add(&json!({"_id": id, "name": "from listing"}), FacilityType::Hospital));
        }
        (repo, store.snapshot())
    }

    fn service(repo: &LocalRepository) -> ComparisonService {
        ComparisonService::new(Arc::new(repo.clone()))
    }

    #[tokio::test]
    async fn test_requires_two_items() {
        let (repo, selection) = setup(&["h1"]);
        let svc = service(&repo);
        let err = svc.load_comparison(&selection, None).await.unwrap_err();
        assert_eq!(err, CompareError::InsufficientSelection { count: 1, min: 2 });
        assert_eq!(err.code(), "INSUFFICIENT_SELECTION");
        assert!(svc.current().is_none());

        let empty = SelectionSnapshot::default();
        assert!(svc.load_comparison(&empty, None).await.is_err());
    }

    #[tokio::test]
    async fn test_load_preserves_order_and_sets_distance() {
        let (repo, selection) = setup(&["h2", "h1"]);
        let svc = service(&repo);
        let mumbai = GeoPoint::new(19.0760, 72.8777);

        let outcome = svc.load_comparison(&selection, Some(mumbai)).await.unwrap();
        let loaded = outcome.applied().unwrap();
        let ids: Vec<&str> = loaded.items.iter().map(|d| d.identity.as_str()).collect();
        assert_eq!(ids, vec!["h2", "h1"]);
        assert_eq!(loaded.items[0].name, "Hospital h2");

        let km = loaded.items[0].distance_km.unwrap();
        assert!((1150.0..=1160.0).contains(&km), "got {}", km);
        assert!(loaded.degraded.is_empty());
        assert!(!loaded.all_failed());
        assert_eq!(svc.current().unwrap().sequence, loaded.sequence);
    }

    #[tokio::test]
    async fn test_no_location_leaves_distance_empty() {
        let (repo, selection) = setup(&["h1", "h2"]);
        let svc = service(&repo);
        let outcome = svc.load_comparison(&selection, None).await.unwrap();
        assert!(outcome
            .applied()
            .unwrap()
            .items
            .iter()
            .all(|d| d.distance_km.is_none()));
    }

    #[tokio::test]
    async fn test_failed_fetch_falls_back_to_summary() {
        let (repo, selection) = setup(&["h1", "h2"]);
        repo.mark_unreachable(FacilityType::Hospital, &FacilityId::new("h2"));
        let svc = service(&repo);

        let outcome = svc.load_comparison(&selection, None).await.unwrap();
        let loaded = outcome.applied().unwrap();
        assert_eq!(loaded.items.len(), 2);
        assert_eq!(loaded.items[1].identity, FacilityId::new("h2"));
        assert_eq!(loaded.items[1].name, "from listing");
        assert!(loaded.is_degraded(&FacilityId::new("h2")));
        assert!(!loaded.is_degraded(&FacilityId::new("h1")));
        assert!(!loaded.all_failed());
    }

    #[tokio::test]
    async fn test_all_failed_still_renders() {
        let (repo, selection) = setup(&["h1", "h2"]);
        repo.set_healthy(false);
        let svc = service(&repo);

        let outcome = svc.load_comparison(&selection, None).await.unwrap();
        let loaded = outcome.applied().unwrap();
        assert!(loaded.all_failed());
        assert_eq!(loaded.items.len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_without_load() {
        let (repo, _) = setup(&["h1", "h2"]);
        let svc = service(&repo);
        assert_eq!(svc.refresh().await.unwrap_err(), CompareError::NothingLoaded);
    }

    #[tokio::test]
    async fn test_refresh_replaces_whole_batch() {
        let (repo, selection) = setup(&["h1", "h2"]);
        let svc = service(&repo);
        let first = svc.load_comparison(&selection, None).await.unwrap();
        let first = first.applied().unwrap().clone();

        repo.insert_record(
            FacilityType::Hospital,
            &json!({"_id": "h1", "name": "Renamed", "googleRating": 4.8}),
        )
        .unwrap();

        let second = svc.refresh().await.unwrap();
        let second = second.applied().unwrap();
        assert!(second.sequence > first.sequence);
        assert_eq!(second.items[0].name, "Renamed");
        assert!(second.last_updated >= first.last_updated);
        assert_eq!(first.items[0].name, "Hospital h1");
        assert_eq!(svc.issued(), 2);
    }

    #[tokio::test]
    async fn test_stale_load_is_discarded() {
        let (repo, slow_selection) = setup(&["h1", "h2"]);
        repo.set_latency(
            FacilityType::Hospital,
            &FacilityId::new("h1"),
            Duration::from_millis(150),
        );
        let store = SelectionStore::new();
        for id in ["h2", "h3"] {
            repo.insert_record(FacilityType::Hospital, &hospital(id, 72.8, 19.0))
                .unwrap();
            store.add(&json!({"_id": id}), FacilityType::Hospital);
        }
        let fast_selection = store.snapshot();
        let svc = service(&repo);

        let (slow, fast) = tokio::join!(svc.load_comparison(&slow_selection, None), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            svc.load_comparison(&fast_selection, None).await
        });

        let fast = fast.unwrap();
        assert!(matches!(fast, LoadOutcome::Applied(_)));
        match slow.unwrap() {
            LoadOutcome::Superseded {
                sequence,
                latest,
                batch,
            } => {
                assert_eq!((sequence, latest), (1, 2));
                assert_eq!(batch.sequence, 1);
                assert_eq!(batch.items[0].identity, FacilityId::new("h1"));
            }
            other => panic!("expected a superseded load, got {:?}", other),
        }

        let current = svc.current().unwrap();
        assert_eq!(current.sequence, 2);
        assert_eq!(current.items[1].identity, FacilityId::new("h3"));
    }

    #[tokio::test]
    async fn test_superseded_before_anything_stored_keeps_its_batch() {
        let (repo, selection) = setup(&["h1", "h2"]);
        repo.set_latency(
            FacilityType::Hospital,
            &FacilityId::new("h1"),
            Duration::from_millis(150),
        );
        let svc = service(&repo);

        let (first, second) = tokio::join!(svc.load_comparison(&selection, None), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            svc.load_comparison(&selection, None).await
        });

        let first = first.unwrap();
        assert!(first.is_superseded());
        assert!(first.applied().is_none());
        assert_eq!(first.batch().items.len(), 2);
        assert_eq!(first.batch().sequence, 1);

        let second = second.unwrap();
        assert_eq!(second.batch().sequence, 2);
        assert_eq!(svc.current().unwrap().sequence, 2);
    }

    #[tokio::test]
    async fn test_open_redirects_small_selection() {
        let (repo, selection) = setup(&["h1"]);
        let svc = service(&repo);
        let navigator = RecordingNavigator::default();

        let opened = svc.open(&selection, None, &navigator).await.unwrap();
        assert!(opened.is_none());
        assert_eq!(*navigator.visited.lock(), vec![NavigationTarget::Listing]);
    }

    #[tokio::test]
    async fn test_open_loads_full_selection() {
        let (repo, selection) = setup(&["h1", "h2", "h3"]);
        let svc = service(&repo);
        let navigator = RecordingNavigator::default();

        let opened = svc.open(&selection, None, &navigator).await.unwrap();
        assert_eq!(opened.unwrap().applied().unwrap().items.len(), 3);
        assert!(navigator.visited.lock().is_empty());
    }
}
