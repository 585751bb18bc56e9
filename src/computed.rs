use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use derive_ex::derive_ex;

use crate::{
    equality::EqFn,
    lookable::{announce, read_scope},
    same_node, AnyLookable, CellKind, Equality, Equate, Listener, Lookable, Node, Publisher,
    Subscription,
};

#[cfg(test)]
mod tests;

/// A cell derived from other cells.
///
/// The derivation runs lazily on the first `get` or `subscribe`. Every cell
/// it reads becomes a dependency; when any of them publishes, the derivation
/// runs again and the set of dependencies is replaced by what that run read.
///
/// # Invariants
///
/// - While subscribed to, the cached value equals the derivation applied to
///   the current values of its dependencies.
/// - Subscribers are notified only when the equality says the recomputed
///   value differs from the cached one. The first computed value is never
///   compared.
/// - Dependencies read only by nested computeds during their first
///   computation are captured too, and dropped by the next recomputation.
///
/// # Failure Modes
///
/// A panicking derivation unwinds out of `get` (or out of the `set` that
/// triggered it). The cached value and the dependency set keep their last
/// good state. A first computation that panicked runs again on the next read.
///
/// Propagation is synchronous: a `set` settles every dependent computed
/// recursively on the caller's stack, so a very long chain of computeds can
/// exhaust it.
#[derive_ex(Clone, bound())]
pub struct Computed<T: 'static>(Rc<ComputedNode<T>>);

struct ComputedNode<T: 'static> {
    derive: Box<dyn Fn() -> T>,
    value: RefCell<Option<T>>,
    equality: EqFn<T>,
    publisher: Publisher<T>,
    deps: RefCell<Vec<Node>>,
    recompute: Rc<dyn Fn()>,
}

impl<T: Clone + 'static> Computed<T> {
    pub fn new(derive: impl Fn() -> T + 'static) -> Self
    where
        T: Equate,
    {
        Self::with_equality(derive, Equality::Is)
    }
    pub fn shallow(derive: impl Fn() -> T + 'static) -> Self
    where
        T: Equate,
    {
        Self::with_equality(derive, Equality::Shallow)
    }
    pub fn deep(derive: impl Fn() -> T + 'static) -> Self
    where
        T: Equate,
    {
        Self::with_equality(derive, Equality::Deep)
    }
    pub fn with_equality(derive: impl Fn() -> T + 'static, equality: Equality<T>) -> Self
    where
        T: Equate,
    {
        Self::from_eq_fn(derive, equality.into_fn())
    }
    pub fn with_eq_fn(
        derive: impl Fn() -> T + 'static,
        equality: impl Fn(&T, &T) -> bool + 'static,
    ) -> Self {
        Self::from_eq_fn(derive, Rc::new(equality))
    }
    fn from_eq_fn(derive: impl Fn() -> T + 'static, equality: EqFn<T>) -> Self {
        Self(Rc::new_cyclic(|this: &Weak<ComputedNode<T>>| {
            let this = this.clone();
            ComputedNode {
                derive: Box::new(derive),
                value: RefCell::new(None),
                equality,
                publisher: Publisher::new(),
                deps: RefCell::new(Vec::new()),
                recompute: Rc::new(move || {
                    if let Some(node) = this.upgrade() {
                        node.recompute();
                    }
                }),
            }
        }))
    }

    pub fn get(&self) -> T {
        let value = self.0.value();
        announce(self.0.clone());
        value
    }

    pub fn subscribe(&self, listener: Listener<T>) -> Subscription {
        self.0.ensure_computed();
        self.0.publisher.subscribe(listener)
    }
    pub fn unsubscribe(&self, listener: &Listener<T>) {
        self.0.publisher.unsubscribe(listener);
    }
    pub fn is_subscribed(&self, listener: &Listener<T>) -> bool {
        self.0.publisher.is_subscribed(listener)
    }
    pub fn subscriber_count(&self) -> usize {
        self.0.publisher.subscriber_count()
    }

    /// Whether the first computation has completed.
    pub fn is_computed(&self) -> bool {
        self.0.value.borrow().is_some()
    }
    pub fn dependency_count(&self) -> usize {
        self.0.deps.borrow().len()
    }
    pub fn dependencies(&self) -> Vec<Node> {
        self.0.deps.borrow().clone()
    }

    pub fn node(&self) -> Node {
        self.0.clone()
    }
}

impl<T: Clone + 'static> ComputedNode<T> {
    fn value(&self) -> T {
        if let Some(value) = &*self.value.borrow() {
            return value.clone();
        }
        self.recompute()
    }

    fn ensure_computed(&self) {
        if self.value.borrow().is_none() {
            self.recompute();
        }
    }

    fn recompute(&self) -> T {
        let (value, seen) = read_scope(|| (self.derive)());
        let mut fresh = Vec::new();
        let mut stale = Vec::new();
        {
            let mut deps = self.deps.borrow_mut();
            for node in &seen {
                if !deps.iter().any(|d| same_node(d, node)) {
                    fresh.push(node.clone());
                }
            }
            deps.retain(|d| {
                let carried = seen.iter().any(|n| same_node(n, d));
                if !carried {
                    stale.push(d.clone());
                }
                carried
            });
            deps.extend(fresh.iter().cloned());
        }
        for node in &fresh {
            node.watch(&self.recompute);
        }
        for node in &stale {
            node.unwatch(&self.recompute);
        }
        if !stale.is_empty() {
            tracing::trace!(
                stale = stale.len(),
                remaining = seen.len(),
                "shed dependencies"
            );
        }
        tracing::trace!(fresh = fresh.len(), deps = seen.len(), "recomputed");
        self.store(value)
    }

    /// Caches `value` and publishes it unless it equals the cached one.
    /// Returns the value left in the cache.
    fn store(&self, value: T) -> T {
        let old = self.value.borrow().clone();
        match old {
            Some(old) if (self.equality)(&old, &value) => old,
            _ => {
                *self.value.borrow_mut() = Some(value.clone());
                self.publisher.publish(&value);
                value
            }
        }
    }
}

impl<T: Clone + 'static> AnyLookable for ComputedNode<T> {
    fn kind(&self) -> CellKind {
        CellKind::Computed
    }
    fn watch(&self, listener: &Rc<dyn Fn()>) {
        self.ensure_computed();
        self.publisher.insert(Listener::from_rc(listener.clone()));
    }
    fn unwatch(&self, listener: &Rc<dyn Fn()>) {
        self.publisher
            .unsubscribe(&Listener::from_rc(listener.clone()));
    }
    fn is_watched_by(&self, listener: &Rc<dyn Fn()>) -> bool {
        self.publisher
            .is_subscribed(&Listener::from_rc(listener.clone()))
    }
    fn subscriber_count(&self) -> usize {
        self.publisher.subscriber_count()
    }
    fn dependency_count(&self) -> usize {
        self.deps.borrow().len()
    }
}

impl<T: 'static> Drop for ComputedNode<T> {
    fn drop(&mut self) {
        for node in self.deps.get_mut().drain(..) {
            node.unwatch(&self.recompute);
        }
    }
}

impl<T: Clone + 'static> Lookable for Computed<T> {
    type Value = T;

    fn get(&self) -> T {
        self.get()
    }
    fn subscribe(&self, listener: Listener<T>) -> Subscription {
        self.subscribe(listener)
    }
    fn unsubscribe(&self, listener: &Listener<T>) {
        self.unsubscribe(listener)
    }
    fn is_subscribed(&self, listener: &Listener<T>) -> bool {
        self.is_subscribed(listener)
    }
    fn subscriber_count(&self) -> usize {
        self.subscriber_count()
    }
    fn kind(&self) -> CellKind {
        CellKind::Computed
    }
    fn node(&self) -> Node {
        self.node()
    }
    fn dependency_count(&self) -> usize {
        self.dependency_count()
    }
    fn depends_on_node(&self, node: &Node) -> bool {
        self.0.deps.borrow().iter().any(|d| same_node(d, node))
    }
}

impl<T: fmt::Debug> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.value.try_borrow() {
            Ok(value) => match &*value {
                Some(value) => fmt::Debug::fmt(value, f),
                None => write!(f, "<uncomputed>"),
            },
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}
