//! Family synchronization tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dynablock_core::storage::{self, DocumentStorage};
use dynablock_core::{Error, FamilyId, HostDocument, Point3d};
use dynablock_storage::MemoryBackend;
use dynablock_testing::{init_test_logging, panel_family, rect_values, TestBench};

/// Storage that counts writes.
#[derive(Default)]
struct CountingStorage {
    inner: MemoryBackend,
    writes: AtomicUsize,
}

impl DocumentStorage for CountingStorage {
    fn get(&self, section: &str, key: &str) -> storage::Result<Option<String>> {
        self.inner.get(section, key)
    }

    fn set(&self, section: &str, key: &str, value: &str) -> storage::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(section, key, value)
    }

    fn is_persistent(&self) -> bool {
        false
    }
}

fn bench_with_instances(count: usize) -> (TestBench, FamilyId) {
    init_test_logging();
    let mut bench = TestBench::new();
    let family_id = bench.add_family(panel_family());
    for i in 0..count {
        bench.place(&family_id, rect_values(1.0, 2.1), Point3d::new(i as f64 * 2.0, 0.0, 0.0));
    }
    (bench, family_id)
}

#[test]
fn test_sync_rebuilds_every_instance() {
    let (mut bench, family_id) = bench_with_instances(3);

    let report = bench.sync(&family_id, rect_values(1.2, 2.4)).unwrap();

    assert!(report.is_clean());
    assert_eq!(report.rebuilt.len(), 3);
    assert!(report.pruned.is_empty());

    let registry = bench.registry();
    assert_eq!(registry.instance_count(), 3);
    for (old_id, new_id) in &report.rebuilt {
        assert_ne!(old_id, new_id);
        assert!(registry.get_instance(old_id).is_none());
        assert!(registry.get_instance(new_id).is_some());
        assert!(bench.doc.find_object(new_id).is_some());
    }
}

#[test]
fn test_sync_keeps_instance_values() {
    init_test_logging();
    let mut bench = TestBench::new();
    let family_id = bench.add_family(panel_family());
    bench.place(&family_id, rect_values(1.5, 2.0), Point3d::ORIGIN);

    let report = bench.sync(&family_id, rect_values(3.0, 3.0)).unwrap();
    let (_, new_id) = &report.rebuilt[0];

    let registry = bench.registry();
    assert_eq!(registry.get_instance(new_id).unwrap().values, rect_values(1.5, 2.0));
    assert_eq!(registry.get_family(&family_id).unwrap().parameters, rect_values(3.0, 3.0));
    assert_eq!(bench.doc.definition_count(), 1);
}

#[test]
fn test_sync_prunes_externally_deleted_instances() {
    let (mut bench, family_id) = bench_with_instances(2);
    let gone = bench
        .registry()
        .iter_instances_for_family(&family_id)
        .map(|(id, _)| id.clone())
        .next()
        .unwrap();
    assert!(bench.doc.remove_externally(&gone));

    let report = bench.sync(&family_id, rect_values(1.0, 2.1)).unwrap();

    assert!(report.is_clean());
    assert_eq!(report.pruned, vec![gone.clone()]);
    assert_eq!(report.rebuilt.len(), 1);

    let registry = bench.registry();
    assert_eq!(registry.instance_count(), 1);
    assert!(registry.get_instance(&gone).is_none());
}

#[test]
fn test_sync_isolates_delete_failures() {
    let (mut bench, family_id) = bench_with_instances(3);
    bench.doc.faults_mut().fail_next_delete = true;

    let report = bench.sync(&family_id, rect_values(1.0, 2.1)).unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.rebuilt.len(), 2);
    assert!(matches!(report.failed[0].1, Error::DeleteFailed(_)));
    assert_eq!(report.lost().count(), 0);

    // The instance that could not be deleted keeps its binding.
    let (kept, _) = &report.failed[0];
    let registry = bench.registry();
    assert_eq!(registry.instance_count(), 3);
    assert!(registry.get_instance(kept).is_some());
    assert!(bench.doc.find_object(kept).is_some());
}

#[test]
fn test_sync_drops_lost_instances() {
    let (mut bench, family_id) = bench_with_instances(3);
    bench.doc.faults_mut().fail_next_placement = true;

    let report = bench.sync(&family_id, rect_values(1.0, 2.1)).unwrap();

    let lost: Vec<_> = report.lost().cloned().collect();
    assert_eq!(lost.len(), 1);
    assert_eq!(report.rebuilt.len(), 2);

    let registry = bench.registry();
    assert_eq!(registry.instance_count(), 2);
    assert!(registry.get_instance(&lost[0]).is_none());
    assert_eq!(bench.doc.object_count(), 2);
}

#[test]
fn test_sync_persists_once() {
    init_test_logging();
    let counting = Arc::new(CountingStorage::default());
    let mut bench = TestBench {
        storage: counting.clone(),
        ..TestBench::new()
    };
    let family_id = bench.add_family(panel_family());
    for i in 0..4 {
        bench.place(&family_id, rect_values(1.0, 2.1), Point3d::new(i as f64, 0.0, 0.0));
    }
    let before = counting.writes.load(Ordering::SeqCst);

    bench.sync(&family_id, rect_values(2.0, 2.0)).unwrap();

    assert_eq!(counting.writes.load(Ordering::SeqCst) - before, 1);
}

#[test]
fn test_sync_unknown_family() {
    let (mut bench, _) = bench_with_instances(1);

    let result = bench.sync(&FamilyId::new("missing"), rect_values(1.0, 1.0));

    assert!(matches!(result, Err(Error::FamilyNotFound(_))));
}

#[test]
fn test_sync_rejects_bad_defaults() {
    let (mut bench, family_id) = bench_with_instances(1);
    let mut defaults = rect_values(1.0, 1.0);
    defaults.remove("Height");

    let result = bench.sync(&family_id, defaults);

    assert!(matches!(result, Err(Error::InvalidParameters(_))));
    let registry = bench.registry();
    assert_eq!(registry.get_family(&family_id).unwrap().parameters, rect_values(1.0, 2.1));
}

#[test]
fn test_sync_empty_family() {
    let (mut bench, family_id) = bench_with_instances(0);

    let report = bench.sync(&family_id, rect_values(0.9, 2.0)).unwrap();

    assert!(report.rebuilt.is_empty() && report.pruned.is_empty() && report.is_clean());
    assert_eq!(
        bench.registry().get_family(&family_id).unwrap().parameters,
        rect_values(0.9, 2.0)
    );
}
