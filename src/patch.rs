use serde_json::{Map, Value};

use crate::{
    hook::{use_lookable, HookHost, HookOptions},
    Observable,
};


/// Applies `patchlets` to `original`, left to right.
///
/// Objects are merged key by key, recursively. Any other value in a patchlet,
/// arrays and `null` included, replaces what it patches. Keys present only in
/// a patchlet are added. A top-level `null` patchlet changes nothing.
pub fn patch<'a>(original: &Value, patchlets: impl IntoIterator<Item = &'a Value>) -> Value {
    patchlets
        .into_iter()
        .fold(original.clone(), |output, patchlet| match patchlet {
            Value::Null => output,
            _ => patch_one(&output, patchlet),
        })
}

fn patch_one(original: &Value, patchlet: &Value) -> Value {
    match (original, patchlet) {
        (Value::Object(original), Value::Object(patchlet)) => {
            Value::Object(merge(original, patchlet))
        }
        _ => patchlet.clone(),
    }
}

fn merge(original: &Map<String, Value>, patchlet: &Map<String, Value>) -> Map<String, Value> {
    let mut output = Map::new();
    for (key, value) in original {
        let value = match patchlet.get(key) {
            None => value.clone(),
            Some(patched) => patch_one(value, patched),
        };
        output.insert(key.clone(), value);
    }
    for (key, value) in patchlet {
        if !output.contains_key(key) {
            output.insert(key.clone(), value.clone());
        }
    }
    output
}

impl Observable<Value> {
    /// Sets the patched value.
    pub fn patch<'a>(&self, patchlets: impl IntoIterator<Item = &'a Value>) {
        self.update(|value| patch(value, patchlets));
    }
}

/// Component-local JSON state. Patch it through the returned observable.
pub fn use_patchable<H: HookHost>(
    host: &mut H,
    init: impl FnOnce() -> Value,
    options: &HookOptions,
) -> (Value, Observable<Value>) {
    let state = host.use_ref(|| Observable::deep(init()));
    let value = use_lookable(host, &*state, options);
    (value, (*state).clone())
}
