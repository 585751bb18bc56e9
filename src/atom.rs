use derive_ex::derive_ex;

use crate::{
    hook::{use_lookable, HookHost, HookOptions},
    CellKind, Computed, Equality, Equate, Error, Listener, Lookable, Node, Observable, Result,
    Subscription,
};


/// A cell that is either a settable source or derived from other atoms.
#[derive_ex(Clone, bound())]
pub struct Atom<T: 'static>(AtomCell<T>);

enum AtomCell<T: 'static> {
    Source(Observable<T>),
    Derived(Computed<T>),
}
impl<T> Clone for AtomCell<T> {
    fn clone(&self) -> Self {
        match self {
            AtomCell::Source(o) => AtomCell::Source(o.clone()),
            AtomCell::Derived(c) => AtomCell::Derived(c.clone()),
        }
    }
}

/// Reads other atoms inside [`Atom::derived`].
pub struct AtomGetter(());

impl AtomGetter {
    pub fn get<T: Clone + 'static>(&self, atom: &Atom<T>) -> T {
        atom.value()
    }
}

impl<T: Clone + 'static> Atom<T> {
    pub fn new(value: T) -> Self
    where
        T: Equate,
    {
        Self::new_with(value, Equality::Is)
    }
    pub fn new_with(value: T, equality: Equality<T>) -> Self
    where
        T: Equate,
    {
        Self(AtomCell::Source(Observable::with_equality(value, equality)))
    }
    pub fn derived(derive: impl Fn(&AtomGetter) -> T + 'static) -> Self
    where
        T: Equate,
    {
        Self::derived_with(derive, Equality::Is)
    }
    pub fn derived_with(derive: impl Fn(&AtomGetter) -> T + 'static, equality: Equality<T>) -> Self
    where
        T: Equate,
    {
        let derived = Computed::with_equality(move || derive(&AtomGetter(())), equality);
        Self(AtomCell::Derived(derived))
    }

    pub fn value(&self) -> T {
        match &self.0 {
            AtomCell::Source(o) => o.get(),
            AtomCell::Derived(c) => c.get(),
        }
    }

    pub fn setter(&self) -> AtomSetter<T> {
        AtomSetter {
            target: match &self.0 {
                AtomCell::Source(o) => Some(o.clone()),
                AtomCell::Derived(_) => None,
            },
        }
    }

    pub fn kind(&self) -> CellKind {
        match &self.0 {
            AtomCell::Source(_) => CellKind::Observable,
            AtomCell::Derived(_) => CellKind::Computed,
        }
    }
}

impl<T> From<Observable<T>> for Atom<T> {
    fn from(value: Observable<T>) -> Self {
        Self(AtomCell::Source(value))
    }
}
impl<T> From<Computed<T>> for Atom<T> {
    fn from(value: Computed<T>) -> Self {
        Self(AtomCell::Derived(value))
    }
}

/// Sets the value of an atom. Fails for derived atoms.
#[derive_ex(Clone, bound())]
pub struct AtomSetter<T: 'static> {
    target: Option<Observable<T>>,
}

impl<T: Clone + 'static> AtomSetter<T> {
    pub fn set(&self, value: T) -> Result<()> {
        match &self.target {
            Some(target) => {
                target.set(value);
                Ok(())
            }
            None => Err(Error::NotSettable {
                kind: CellKind::Computed,
            }),
        }
    }
    pub fn is_settable(&self) -> bool {
        self.target.is_some()
    }
}

/// Returns the current value of `atom` together with its setter.
pub fn atom_pair<T: Clone + 'static>(atom: &Atom<T>) -> (T, AtomSetter<T>) {
    (atom.value(), atom.setter())
}

pub fn use_atom_value<H: HookHost, T>(host: &mut H, atom: &Atom<T>, options: &HookOptions) -> T
where
    T: Clone + Equate + 'static,
{
    use_lookable(host, atom, options)
}

pub fn use_atom<H: HookHost, T>(
    host: &mut H,
    atom: &Atom<T>,
    options: &HookOptions,
) -> (T, AtomSetter<T>)
where
    T: Clone + Equate + 'static,
{
    (use_atom_value(host, atom, options), atom.setter())
}

impl<T: Clone + 'static> Lookable for Atom<T> {
    type Value = T;

    fn get(&self) -> T {
        self.value()
    }
    fn subscribe(&self, listener: Listener<T>) -> Subscription {
        match &self.0 {
            AtomCell::Source(o) => o.subscribe(listener),
            AtomCell::Derived(c) => c.subscribe(listener),
        }
    }
    fn unsubscribe(&self, listener: &Listener<T>) {
        match &self.0 {
            AtomCell::Source(o) => o.unsubscribe(listener),
            AtomCell::Derived(c) => c.unsubscribe(listener),
        }
    }
    fn is_subscribed(&self, listener: &Listener<T>) -> bool {
        match &self.0 {
            AtomCell::Source(o) => o.is_subscribed(listener),
            AtomCell::Derived(c) => c.is_subscribed(listener),
        }
    }
    fn subscriber_count(&self) -> usize {
        match &self.0 {
            AtomCell::Source(o) => o.subscriber_count(),
            AtomCell::Derived(c) => c.subscriber_count(),
        }
    }
    fn kind(&self) -> CellKind {
        self.kind()
    }
    fn node(&self) -> Node {
        match &self.0 {
            AtomCell::Source(o) => o.node(),
            AtomCell::Derived(c) => c.node(),
        }
    }
    fn depends_on_node(&self, node: &Node) -> bool {
        match &self.0 {
            AtomCell::Source(_) => false,
            AtomCell::Derived(c) => c.depends_on_node(node),
        }
    }
}
