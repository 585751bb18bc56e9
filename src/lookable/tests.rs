use super::*;
use crate::Observable;

#[test]
fn read_scope_records_each_cell_once_in_order() {
    let a = Observable::new(1);
    let b = Observable::new(2);
    let (sum, seen) = read_scope(|| a.get() + b.get() + a.get());
    assert_eq!(sum, 4);
    assert_eq!(seen.len(), 2);
    assert!(same_node(&seen[0], &a.node()));
    assert!(same_node(&seen[1], &b.node()));
}

#[test]
fn nested_scopes_both_see_inner_reads() {
    let a = Observable::new(1);
    let b = Observable::new(2);
    let (inner, outer) = read_scope(|| {
        let (_, inner) = read_scope(|| a.get());
        b.get();
        inner
    });
    assert_eq!(inner.len(), 1);
    assert_eq!(outer.len(), 2);
}

#[test]
fn watcher_is_empty_at_rest() {
    let a = Observable::new(1);
    assert_eq!(getter_watcher_count(), 0);
    let (_, _) = read_scope(|| {
        assert_eq!(getter_watcher_count(), 1);
        a.get()
    });
    assert_eq!(getter_watcher_count(), 0);
}

#[test]
fn watcher_is_empty_after_panic() {
    let a = Observable::new(1);
    let r = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        read_scope(|| {
            a.get();
            panic!("derivation failed");
        })
    }));
    assert!(r.is_err());
    assert_eq!(getter_watcher_count(), 0);
}

#[test]
fn reads_outside_scope_are_not_recorded() {
    let a = Observable::new(1);
    a.get();
    let (_, seen) = read_scope(|| ());
    assert!(seen.is_empty());
}

#[test]
fn kind_display() {
    assert_eq!(CellKind::Observable.to_string(), "observable");
    assert_eq!(CellKind::Computed.to_string(), "computed");
    assert!(CellKind::Observable.is_settable());
    assert!(!CellKind::Computed.is_settable());
}
