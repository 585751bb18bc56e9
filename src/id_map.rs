use std::{
    borrow::Borrow,
    collections::{BTreeMap, BTreeSet},
    rc::Rc,
};

use derive_ex::derive_ex;

use crate::{CellKind, Listener, Lookable, Node, Observable, Subscription};


/// A record with a stable identifier.
pub trait Identified {
    type Id: Ord + Clone + 'static;
    fn id(&self) -> Self::Id;
}

pub type IdMap<T> = BTreeMap<<T as Identified>::Id, T>;

/// An observable map of records keyed by their id.
///
/// Each batch operation publishes at most once. Records equal to the stored
/// ones do not count as changes.
#[derive_ex(Clone, bound())]
pub struct ObservableIdMap<T: Identified + 'static>(Observable<Rc<IdMap<T>>>);

impl<T> ObservableIdMap<T>
where
    T: Identified + Clone + PartialEq + 'static,
{
    pub fn new(records: impl IntoIterator<Item = T>) -> Self {
        Self::from_map(records.into_iter().map(|r| (r.id(), r)).collect())
    }
    pub fn from_map(map: IdMap<T>) -> Self {
        Self(Observable::with_eq_fn(Rc::new(map), |a, b| Rc::ptr_eq(a, b)))
    }

    pub fn get(&self) -> Rc<IdMap<T>> {
        self.0.get()
    }
    pub fn get_by_id(&self, id: &T::Id) -> Option<T> {
        self.0.with(|map| map.get(id).cloned())
    }
    pub fn len(&self) -> usize {
        self.0.with(|map| map.len())
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn ids(&self) -> Vec<T::Id> {
        self.0.with(|map| map.keys().cloned().collect())
    }
    pub fn values(&self) -> Vec<T> {
        self.0.with(|map| map.values().cloned().collect())
    }

    /// Inserts or replaces `records`. Returns whether anything changed.
    pub fn update_objects(&self, records: impl IntoIterator<Item = T>) -> bool {
        let current = self.0.peek(Rc::clone);
        let mut next: Option<IdMap<T>> = None;
        for record in records {
            let id = record.id();
            match &mut next {
                Some(map) => {
                    map.insert(id, record);
                }
                None if current.get(&id) != Some(&record) => {
                    let mut map = (*current).clone();
                    map.insert(id, record);
                    next = Some(map);
                }
                None => {}
            }
        }
        match next {
            Some(map) => {
                tracing::trace!(len = map.len(), "updated records");
                self.0.set(Rc::new(map));
                true
            }
            None => false,
        }
    }

    /// Removes the records with the given ids. Returns whether any was present.
    pub fn pop_by_ids<Q: Borrow<T::Id>>(&self, ids: impl IntoIterator<Item = Q>) -> bool {
        let ids: BTreeSet<T::Id> = ids.into_iter().map(|id| id.borrow().clone()).collect();
        let current = self.0.peek(Rc::clone);
        if !ids.iter().any(|id| current.contains_key(id)) {
            return false;
        }
        let map = current
            .iter()
            .filter(|(id, _)| !ids.contains(*id))
            .map(|(id, r)| (id.clone(), r.clone()))
            .collect();
        self.0.set(Rc::new(map));
        true
    }

    /// Replaces every record with those in `map`.
    pub fn set(&self, map: IdMap<T>) {
        self.0.set(Rc::new(map));
    }

    /// Restores the records the map was created with. Does nothing if the map
    /// has not changed since.
    pub fn reset(&self) {
        self.0.reset();
    }
}

impl<T> Lookable for ObservableIdMap<T>
where
    T: Identified + Clone + PartialEq + 'static,
{
    type Value = Rc<IdMap<T>>;

    fn get(&self) -> Self::Value {
        self.get()
    }
    fn subscribe(&self, listener: Listener<Self::Value>) -> Subscription {
        self.0.subscribe(listener)
    }
    fn unsubscribe(&self, listener: &Listener<Self::Value>) {
        self.0.unsubscribe(listener)
    }
    fn is_subscribed(&self, listener: &Listener<Self::Value>) -> bool {
        self.0.is_subscribed(listener)
    }
    fn subscriber_count(&self) -> usize {
        self.0.subscriber_count()
    }
    fn kind(&self) -> CellKind {
        CellKind::Observable
    }
    fn node(&self) -> Node {
        self.0.node()
    }
}
