use super::*;
use rustc_hash::FxHashSet;

#[test]
fn fresh_ids_are_distinct() {
    let ids: FxHashSet<NodeId> = (0..1000).map(|_| NodeId::fresh()).collect();
    assert_eq!(ids.len(), 1000);
}

#[test]
fn fresh_ids_increase() {
    let a = NodeId::fresh();
    let b = NodeId::fresh();
    assert!(b > a);
}

#[test]
fn fresh_ids_distinct_across_threads() {
    let handles: Vec<_> = (0..4)
        .map(|_| std::thread::spawn(|| (0..250).map(|_| NodeId::fresh()).collect::<Vec<_>>()))
        .collect();
    let mut all = FxHashSet::default();
    for handle in handles {
        for id in handle.join().unwrap_or_default() {
            assert!(all.insert(id), "duplicate id {id:?}");
        }
    }
    assert_eq!(all.len(), 1000);
}

#[test]
fn raw_round_trip_and_format() {
    let id = NodeId::from_raw(42);
    assert_eq!(id.raw(), 42);
    assert_eq!(format!("{id:?}"), "NodeId(42)");
    assert_eq!(id.to_string(), "#42");
}
