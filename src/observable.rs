use std::{cell::RefCell, fmt, rc::Rc};

use derive_ex::derive_ex;
use serde::{Deserialize, Serialize};

use crate::{
    equality::EqFn, lookable::announce, AnyLookable, CellKind, Equality, Equate, Listener,
    Lookable, Node, Publisher, Subscription,
};


/// A settable cell.
///
/// `set` publishes only when the equality says the new value differs from
/// the current one. The default equality is [`Equality::Is`].
#[derive_ex(Clone, bound())]
pub struct Observable<T: 'static>(Rc<ObservableNode<T>>);

struct ObservableNode<T: 'static> {
    value: RefCell<T>,
    initial: T,
    equality: EqFn<T>,
    publisher: Publisher<T>,
}

impl<T: Clone + 'static> Observable<T> {
    pub fn new(value: T) -> Self
    where
        T: Equate,
    {
        Self::with_equality(value, Equality::Is)
    }
    pub fn shallow(value: T) -> Self
    where
        T: Equate,
    {
        Self::with_equality(value, Equality::Shallow)
    }
    pub fn deep(value: T) -> Self
    where
        T: Equate,
    {
        Self::with_equality(value, Equality::Deep)
    }
    pub fn with_equality(value: T, equality: Equality<T>) -> Self
    where
        T: Equate,
    {
        Self::from_eq_fn(value, equality.into_fn())
    }
    pub fn with_eq_fn(value: T, equality: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Self::from_eq_fn(value, Rc::new(equality))
    }
    fn from_eq_fn(value: T, equality: EqFn<T>) -> Self {
        Self(Rc::new(ObservableNode {
            initial: value.clone(),
            value: RefCell::new(value),
            equality,
            publisher: Publisher::new(),
        }))
    }

    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Reads the value by reference.
    ///
    /// `f` must not set this observable.
    pub fn with<U>(&self, f: impl FnOnce(&T) -> U) -> U {
        announce(self.0.clone());
        self.peek(f)
    }

    /// Reads the value without reporting the read to an enclosing derivation.
    pub(crate) fn peek<U>(&self, f: impl FnOnce(&T) -> U) -> U {
        f(&self.0.value.borrow())
    }

    /// Assigns `value` and notifies subscribers unless it equals the current
    /// value. Dependent computeds are settled before this returns.
    pub fn set(&self, value: T) {
        let changed = !(self.0.equality)(&self.0.value.borrow(), &value);
        if changed {
            *self.0.value.borrow_mut() = value.clone();
            self.0.publisher.publish(&value);
        }
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let value = self.peek(f);
        self.set(value);
    }

    /// Sets the value this observable was created with.
    pub fn reset(&self) {
        self.set(self.0.initial.clone());
    }

    pub fn initial(&self) -> &T {
        &self.0.initial
    }

    pub fn subscribe(&self, listener: Listener<T>) -> Subscription {
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

    pub fn node(&self) -> Node {
        self.0.clone()
    }
}

impl<T: Clone + 'static> Lookable for Observable<T> {
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
        CellKind::Observable
    }
    fn node(&self) -> Node {
        self.node()
    }
}

impl<T: 'static> AnyLookable for ObservableNode<T> {
    fn kind(&self) -> CellKind {
        CellKind::Observable
    }
    fn watch(&self, listener: &Rc<dyn Fn()>) {
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
        0
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.value.try_borrow() {
            Ok(value) => fmt::Debug::fmt(&*value, f),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}
impl<T> Serialize for Observable<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        match self.0.value.try_borrow() {
            Ok(value) => T::serialize(&*value, serializer),
            Err(_) => Err(serde::ser::Error::custom("borrowed")),
        }
    }
}
impl<'de, T> Deserialize<'de> for Observable<T>
where
    T: Deserialize<'de> + Equate + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Observable<T>, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        T::deserialize(deserializer).map(|value| Observable::new(value))
    }
}
