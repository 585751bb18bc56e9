use std::{any::Any, collections::BTreeMap, rc::Rc};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    hook::{use_watches, watch, HookHost, HookOptions, Watch},
    CellKind, Equate, Error, Lookable, Result,
};

#[cfg(test)]
mod tests;

/// Named cells of different types.
#[derive(Clone, Default)]
pub struct Store {
    cells: BTreeMap<String, Rc<dyn StoreCell>>,
}

trait StoreCell {
    fn watch(&self) -> Rc<dyn Watch>;
    fn look(&self) -> Box<dyn Any>;
    fn snapshot(&self) -> serde_json::Result<Value>;
    fn kind(&self) -> CellKind;
}

struct Entry<L>(L);

impl<L> StoreCell for Entry<L>
where
    L: Lookable,
    L::Value: Equate + Serialize,
{
    fn watch(&self) -> Rc<dyn Watch> {
        watch(&self.0)
    }
    fn look(&self) -> Box<dyn Any> {
        Box::new(self.0.get())
    }
    fn snapshot(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self.0.get())
    }
    fn kind(&self) -> CellKind {
        self.0.kind()
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<L>(mut self, name: impl Into<String>, cell: L) -> Self
    where
        L: Lookable,
        L::Value: Equate + Serialize,
    {
        self.insert(name, cell);
        self
    }

    /// Adds `cell` under `name`. Returns `true` if it replaced another cell.
    pub fn insert<L>(&mut self, name: impl Into<String>, cell: L) -> bool
    where
        L: Lookable,
        L::Value: Equate + Serialize,
    {
        self.cells
            .insert(name.into(), Rc::new(Entry(cell)))
            .is_some()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.cells.contains_key(name)
    }
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }
    pub fn len(&self) -> usize {
        self.cells.len()
    }
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
    pub fn kind_of(&self, name: &str) -> Option<CellKind> {
        self.cells.get(name).map(|cell| cell.kind())
    }

    /// Current values of every cell as a JSON object keyed by name.
    pub fn snapshot(&self) -> Result<Value> {
        let mut values = Map::new();
        for (key, cell) in &self.cells {
            let value = cell.snapshot().map_err(|source| Error::Snapshot {
                key: key.clone(),
                source,
            })?;
            values.insert(key.clone(), value);
        }
        Ok(Value::Object(values))
    }

    /// Current values of the named cells.
    pub fn pick(&self, keys: &[&str]) -> Result<Picked> {
        let cells = self.cells_of(keys)?;
        Ok(Picked::read(&cells))
    }

    /// Hook over the named cells. Unknown names fail before any hook runs.
    pub fn use_store<H: HookHost>(
        &self,
        host: &mut H,
        keys: &[&str],
        options: &HookOptions,
    ) -> Result<Picked> {
        let cells = self.cells_of(keys)?;
        use_watches(
            host,
            || cells.iter().map(|(_, cell)| cell.watch()).collect(),
            options,
        );
        Ok(Picked::read(&cells))
    }

    fn cells_of(&self, keys: &[&str]) -> Result<Vec<(String, Rc<dyn StoreCell>)>> {
        keys.iter()
            .map(|&key| match self.cells.get(key) {
                Some(cell) => Ok((key.to_string(), cell.clone())),
                None => Err(Error::UnknownKey(key.to_string())),
            })
            .collect()
    }
}

/// Values read from a [`Store`], by name.
pub struct Picked(BTreeMap<String, Box<dyn Any>>);

impl Picked {
    fn read(cells: &[(String, Rc<dyn StoreCell>)]) -> Self {
        Self(
            cells
                .iter()
                .map(|(key, cell)| (key.clone(), cell.look()))
                .collect(),
        )
    }

    /// The value named `key`, or `None` if it is absent or not a `T`.
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.0.get(key)?.downcast_ref()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
