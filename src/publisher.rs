use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use derive_ex::derive_ex;

use crate::Subscription;

/// A change listener.
///
/// Two listeners are the same subscriber when they share the same callback
/// allocation, so a cloned `Listener` can be used to unsubscribe the original.
#[derive_ex(Clone, bound())]
pub struct Listener<T: 'static>(Callback<T>);

enum Callback<T: 'static> {
    Value(Rc<dyn Fn(&T)>),
    Notify(Rc<dyn Fn()>),
}
impl<T> Clone for Callback<T> {
    fn clone(&self) -> Self {
        match self {
            Callback::Value(f) => Callback::Value(f.clone()),
            Callback::Notify(f) => Callback::Notify(f.clone()),
        }
    }
}

impl<T: 'static> Listener<T> {
    /// A listener that receives the published value.
    pub fn new(f: impl Fn(&T) + 'static) -> Self {
        Self(Callback::Value(Rc::new(f)))
    }

    /// A listener that is only told that something changed.
    pub fn notify(f: impl Fn() + 'static) -> Self {
        Self(Callback::Notify(Rc::new(f)))
    }

    /// Wraps a shared callback. Listeners built from the same `Rc` are the
    /// same subscriber, whatever their value type.
    pub fn from_rc(f: Rc<dyn Fn()>) -> Self {
        Self(Callback::Notify(f))
    }

    pub fn call(&self, value: &T) {
        match &self.0 {
            Callback::Value(f) => f(value),
            Callback::Notify(f) => f(),
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }

    fn addr(&self) -> *const () {
        match &self.0 {
            Callback::Value(f) => Rc::as_ptr(f) as *const (),
            Callback::Notify(f) => Rc::as_ptr(f) as *const (),
        }
    }

    fn downgrade(&self) -> WeakListener<T> {
        match &self.0 {
            Callback::Value(f) => WeakListener::Value(Rc::downgrade(f)),
            Callback::Notify(f) => WeakListener::Notify(Rc::downgrade(f)),
        }
    }
}

/// Identity of a listener that does not keep its callback alive.
enum WeakListener<T: 'static> {
    Value(Weak<dyn Fn(&T)>),
    Notify(Weak<dyn Fn()>),
}

impl<T: 'static> WeakListener<T> {
    fn addr(&self) -> *const () {
        match self {
            WeakListener::Value(f) => f.as_ptr() as *const (),
            WeakListener::Notify(f) => f.as_ptr() as *const (),
        }
    }
}
impl<T: 'static> PartialEq for Listener<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}
impl<T: 'static> Eq for Listener<T> {}

impl<T: 'static> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener").field(&self.addr()).finish()
    }
}

/// An ordered set of listeners.
///
/// Listeners are called in subscription order. Subscribing a listener that is
/// already present does nothing.
#[derive_ex(Clone, bound())]
pub struct Publisher<T: 'static>(Rc<PublisherData<T>>);

struct PublisherData<T: 'static> {
    listeners: RefCell<Vec<Listener<T>>>,
}

impl<T: 'static> PublisherData<T> {
    fn insert(&self, listener: Listener<T>) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        if listeners.contains(&listener) {
            return false;
        }
        listeners.push(listener);
        true
    }
    fn remove(&self, listener: &Listener<T>) -> bool {
        self.remove_addr(listener.addr())
    }
    fn remove_addr(&self, addr: *const ()) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(index) = listeners.iter().position(|l| l.addr() == addr) {
            listeners.remove(index);
            true
        } else {
            false
        }
    }
    fn contains(&self, listener: &Listener<T>) -> bool {
        self.listeners.borrow().contains(listener)
    }
}

impl<T: 'static> Publisher<T> {
    pub fn new() -> Self {
        Self(Rc::new(PublisherData {
            listeners: RefCell::new(Vec::new()),
        }))
    }

    /// Adds `listener` and returns a guard that removes it.
    ///
    /// The guard keeps neither the publisher nor the callback alive.
    pub fn subscribe(&self, listener: Listener<T>) -> Subscription {
        let weak = listener.downgrade();
        self.0.insert(listener);
        Subscription::from_weak_fn(Rc::downgrade(&self.0), move |data| {
            data.remove_addr(weak.addr());
        })
    }

    /// Adds `listener` without a guard. Returns `false` if it was already present.
    pub fn insert(&self, listener: Listener<T>) -> bool {
        self.0.insert(listener)
    }

    /// Removes `listener`. Returns `false` if it was not present.
    pub fn unsubscribe(&self, listener: &Listener<T>) -> bool {
        self.0.remove(listener)
    }

    /// Calls every listener that was subscribed when the call started.
    ///
    /// A listener removed by an earlier listener during the same call is
    /// skipped. Listeners added during the call are not called.
    pub fn publish(&self, value: &T) {
        let listeners = self.0.listeners.borrow().clone();
        for listener in &listeners {
            if self.0.contains(listener) {
                listener.call(value);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.0.listeners.borrow().len()
    }

    pub fn is_subscribed(&self, listener: &Listener<T>) -> bool {
        self.0.contains(listener)
    }
}
impl<T: 'static> Default for Publisher<T> {
    fn default() -> Self {
        Self::new()
    }
}
impl<T: 'static> fmt::Debug for Publisher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
