use std::{
    mem::take,
    rc::{Rc, Weak},
};

/// Guard for a listener registration.
///
/// Dropping the guard removes the listener, so `let _ = cell.subscribe(..)`
/// unsubscribes immediately. Use [`Subscription::detach`] to keep the listener
/// for as long as the source lives.
#[derive(Default)]
#[must_use]
pub struct Subscription(RawSubscription);

impl Subscription {
    pub fn empty() -> Self {
        Subscription(RawSubscription::Empty)
    }
    pub fn from_fn(f: impl FnOnce() + 'static) -> Self {
        Subscription(RawSubscription::Fn(Box::new(f)))
    }
    pub fn from_weak_fn<T: 'static>(
        this: Weak<T>,
        unsubscribe: impl FnOnce(Rc<T>) + 'static,
    ) -> Self {
        Self::from_fn(move || {
            if let Some(this) = this.upgrade() {
                unsubscribe(this)
            }
        })
    }
    pub fn is_empty(&self) -> bool {
        matches!(self.0, RawSubscription::Empty)
    }

    /// Removes the listener now.
    pub fn unsubscribe(self) {}

    /// Leaves the listener registered.
    pub fn detach(mut self) {
        self.0 = RawSubscription::Empty;
    }
}
impl FromIterator<Subscription> for Subscription {
    fn from_iter<I: IntoIterator<Item = Subscription>>(iter: I) -> Self {
        Subscription(RawSubscription::Many(iter.into_iter().collect()))
    }
}
impl Drop for Subscription {
    fn drop(&mut self) {
        match take(&mut self.0) {
            RawSubscription::Empty => {}
            RawSubscription::Fn(f) => f(),
            RawSubscription::Many(subscriptions) => drop(subscriptions),
        }
    }
}

#[derive(Default)]
enum RawSubscription {
    #[default]
    Empty,
    Fn(Box<dyn FnOnce() + 'static>),
    Many(Vec<Subscription>),
}
