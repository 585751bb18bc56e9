use std::{any::Any, rc::Rc};

use crate::{EqualityMode, Equate, Lookable, Node};

/// A cell watched by a hook, with its value type erased.
pub trait Watch: 'static {
    fn node(&self) -> Node;

    /// Reads the current value.
    fn look(&self) -> Box<dyn Looked>;
}

/// A value read through [`Watch::look`].
pub trait Looked: Any {
    /// Compares with another looked value. Values of different types are
    /// never the same.
    fn same(&self, other: &dyn Looked, mode: EqualityMode) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<T: Equate + Any> Looked for T {
    fn same(&self, other: &dyn Looked, mode: EqualityMode) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self.equate(other, mode))
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<L> Watch for L
where
    L: Lookable,
    L::Value: Equate,
{
    fn node(&self) -> Node {
        Lookable::node(self)
    }
    fn look(&self) -> Box<dyn Looked> {
        Box::new(self.get())
    }
}

/// Erases `cell` for the array form of [`use_lookables`](super::use_lookables).
pub fn watch<L>(cell: &L) -> Rc<dyn Watch>
where
    L: Lookable,
    L::Value: Equate,
{
    Rc::new(cell.clone())
}

/// The cells passed to one hook call.
///
/// Tuples of cell references yield a tuple of their values. A list of
/// erased cells only subscribes and yields `()`.
pub trait WatchSet {
    type Values;
    fn watches(&self) -> Vec<Rc<dyn Watch>>;
    fn values(&self) -> Self::Values;
}

macro_rules! impl_watch_set_for_tuple {
    ($($l:ident $i:tt),*) => {
        impl<'a, $($l),*> WatchSet for ($(&'a $l,)*)
        where
            $($l: Lookable, $l::Value: Equate,)*
        {
            type Values = ($($l::Value,)*);
            fn watches(&self) -> Vec<Rc<dyn Watch>> {
                vec![$(watch(self.$i)),*]
            }
            fn values(&self) -> Self::Values {
                ($(self.$i.get(),)*)
            }
        }
    };
}

impl_watch_set_for_tuple!(A 0);
impl_watch_set_for_tuple!(A 0, B 1);
impl_watch_set_for_tuple!(A 0, B 1, C 2);
impl_watch_set_for_tuple!(A 0, B 1, C 2, D 3);
impl_watch_set_for_tuple!(A 0, B 1, C 2, D 3, E 4);
impl_watch_set_for_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_watch_set_for_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_watch_set_for_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);

impl WatchSet for Vec<Rc<dyn Watch>> {
    type Values = ();
    fn watches(&self) -> Vec<Rc<dyn Watch>> {
        self.clone()
    }
    fn values(&self) -> Self::Values {}
}

impl WatchSet for &[Rc<dyn Watch>] {
    type Values = ();
    fn watches(&self) -> Vec<Rc<dyn Watch>> {
        self.to_vec()
    }
    fn values(&self) -> Self::Values {}
}
