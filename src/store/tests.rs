use super::*;
use crate::{
    hook::{ManualScheduler, TestHost},
    Computed, Observable,
};
use serde_json::json;

fn store() -> (Observable<i32>, Observable<String>, Store) {
    let count = Observable::new(1);
    let name = Observable::new(String::from("duck"));
    let double = Computed::new({
        let count = count.clone();
        move || count.get() * 2
    });
    let store = Store::new()
        .with("count", count.clone())
        .with("name", name.clone())
        .with("double", double);
    (count, name, store)
}

#[test]
fn snapshot() {
    let (count, _, store) = store();
    assert_eq!(
        store.snapshot().unwrap(),
        json!({ "count": 1, "name": "duck", "double": 2 })
    );
    count.set(5);
    assert_eq!(store.snapshot().unwrap()["double"], json!(10));
}

#[test]
fn snapshot_error_names_key() {
    let (_, _, mut store) = store();
    store.insert(
        "bad",
        Observable::new(std::collections::HashMap::from([(vec![1_u8], 1_i32)])),
    );
    let e = store.snapshot().unwrap_err();
    assert!(matches!(&e, Error::Snapshot { key, .. } if key == "bad"));
    assert_eq!(e.to_string(), "failed to snapshot `bad`");
}

#[test]
fn pick() {
    let (_, _, store) = store();
    let picked = store.pick(&["name", "double"]).unwrap();
    assert_eq!(picked.len(), 2);
    assert_eq!(picked.get::<String>("name").unwrap(), "duck");
    assert_eq!(picked.get::<i32>("double"), Some(&2));
    assert_eq!(picked.get::<String>("double"), None);
    assert_eq!(picked.get::<i32>("count"), None);
}

#[test]
fn unknown_key() {
    let (_, _, store) = store();
    let e = store.pick(&["name", "nope"]).err().unwrap();
    assert!(matches!(&e, Error::UnknownKey(key) if key == "nope"));
    assert_eq!(e.to_string(), "no cell named `nope` in the store");
}

#[test]
fn introspection() {
    let (_, _, store) = store();
    assert_eq!(store.len(), 3);
    assert!(store.contains_key("count"));
    assert_eq!(store.kind_of("double"), Some(CellKind::Computed));
    assert_eq!(store.kind_of("name"), Some(CellKind::Observable));
    assert_eq!(
        store.keys().collect::<Vec<_>>(),
        ["count", "double", "name"]
    );
}

#[test]
fn use_store() {
    let (count, name, store) = store();
    let mut host = TestHost::new(Rc::new(ManualScheduler::new()));
    let opts = HookOptions::default();
    let picked = host
        .render(|h| store.use_store(h, &["count"], &opts))
        .unwrap();
    assert_eq!(picked.get::<i32>("count"), Some(&1));
    host.mount();

    name.set("goose".into());
    assert!(!host.needs_render());
    count.set(2);
    assert!(host.needs_render());
    let picked = host
        .render(|h| store.use_store(h, &["count"], &opts))
        .unwrap();
    assert_eq!(picked.get::<i32>("count"), Some(&2));
}
