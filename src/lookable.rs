use std::{cell::RefCell, mem::take, rc::Rc};

use parse_display::Display;

use crate::{Listener, Publisher, Subscription};

/// What kind of cell a [`Lookable`] is. Only observables can be set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[display(style = "snake_case")]
pub enum CellKind {
    Observable,
    Computed,
}

impl CellKind {
    pub fn is_settable(self) -> bool {
        matches!(self, CellKind::Observable)
    }
}

/// Type-erased view of a cell, used for dependency edges.
pub trait AnyLookable: 'static {
    fn kind(&self) -> CellKind;

    /// Adds a listener that ignores the published value.
    fn watch(&self, listener: &Rc<dyn Fn()>);
    fn unwatch(&self, listener: &Rc<dyn Fn()>);
    fn is_watched_by(&self, listener: &Rc<dyn Fn()>) -> bool;

    fn subscriber_count(&self) -> usize;
    fn dependency_count(&self) -> usize;
}

/// Shared handle to an erased cell. Two nodes are the same cell when they
/// share an allocation.
pub type Node = Rc<dyn AnyLookable>;

pub fn same_node(a: &Node, b: &Node) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// The read/subscribe contract shared by every cell.
pub trait Lookable: Clone + 'static {
    type Value: Clone + 'static;

    /// Returns the current value and reports the read to an enclosing
    /// derivation, if any.
    fn get(&self) -> Self::Value;

    fn subscribe(&self, listener: Listener<Self::Value>) -> Subscription;
    fn unsubscribe(&self, listener: &Listener<Self::Value>);
    fn is_subscribed(&self, listener: &Listener<Self::Value>) -> bool;
    fn subscriber_count(&self) -> usize;

    fn kind(&self) -> CellKind;
    fn node(&self) -> Node;

    fn dependency_count(&self) -> usize {
        self.node().dependency_count()
    }
    fn depends_on_node(&self, _node: &Node) -> bool {
        false
    }
    fn depends_on(&self, other: &impl Lookable) -> bool {
        self.depends_on_node(&other.node())
    }

    fn subscribe_fn(&self, f: impl Fn(&Self::Value) + 'static) -> Subscription {
        self.subscribe(Listener::new(f))
    }
}

thread_local! {
    static GETTER_WATCHER: Publisher<Node> = Publisher::new();
}

/// Reports a read of `node` to every active [`ReadScope`].
pub(crate) fn announce(node: Node) {
    GETTER_WATCHER.with(|watcher| watcher.publish(&node));
}

/// Number of derivations currently collecting reads on this thread.
///
/// Zero whenever no derivation is running.
pub fn getter_watcher_count() -> usize {
    GETTER_WATCHER.with(|watcher| watcher.subscriber_count())
}

/// Collects the distinct cells read while it is alive, in read order.
pub(crate) struct ReadScope {
    seen: Rc<RefCell<Vec<Node>>>,
    _subscription: Subscription,
}

impl ReadScope {
    pub fn begin() -> Self {
        let seen = Rc::new(RefCell::new(Vec::<Node>::new()));
        let subscription = {
            let seen = seen.clone();
            GETTER_WATCHER.with(|watcher| {
                watcher.subscribe(Listener::new(move |node: &Node| {
                    let mut seen = seen.borrow_mut();
                    if !seen.iter().any(|n| same_node(n, node)) {
                        seen.push(node.clone());
                    }
                }))
            })
        };
        Self {
            seen,
            _subscription: subscription,
        }
    }

    pub fn finish(self) -> Vec<Node> {
        let Self {
            seen,
            _subscription,
        } = self;
        drop(_subscription);
        let seen = take(&mut *seen.borrow_mut());
        tracing::trace!(reads = seen.len(), "read scope finished");
        seen
    }
}

/// Runs `f` and returns its result with the cells it read.
pub(crate) fn read_scope<T>(f: impl FnOnce() -> T) -> (T, Vec<Node>) {
    let scope = ReadScope::begin();
    let value = f();
    (value, scope.finish())
}

#[cfg(test)]
mod tests;
