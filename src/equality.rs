use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    hash::Hash,
    rc::Rc,
    sync::Arc,
};

use parse_display::Display;

/// Comparison used to decide whether a new value is a change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display)]
#[display(style = "snake_case")]
pub enum EqualityMode {
    /// Same identity: pointer equality for `Rc`/`Arc`, value equality for
    /// plain data.
    #[default]
    Is,
    /// Same entries, each compared by identity.
    Shallow,
    /// Structurally equal all the way down.
    Deep,
}

/// Values that can be compared under each [`EqualityMode`].
///
/// Owned data has no identity of its own, so `is` on a container looks
/// through it to the first shared (`Rc`/`Arc`) layer.
pub trait Equate {
    fn is(&self, other: &Self) -> bool;
    fn shallow_eq(&self, other: &Self) -> bool {
        self.is(other)
    }
    fn deep_eq(&self, other: &Self) -> bool;

    fn equate(&self, other: &Self, mode: EqualityMode) -> bool {
        match mode {
            EqualityMode::Is => self.is(other),
            EqualityMode::Shallow => self.shallow_eq(other),
            EqualityMode::Deep => self.deep_eq(other),
        }
    }
}

macro_rules! impl_equate_by_partial_eq {
    ($($t:ty),* $(,)?) => {
        $(
            impl Equate for $t {
                fn is(&self, other: &Self) -> bool {
                    self == other
                }
                fn deep_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

impl_equate_by_partial_eq!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    str,
    String,
    &'static str,
    serde_json::Value,
    std::time::Duration,
);

impl<T: Equate + ?Sized> Equate for Rc<T> {
    fn is(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
    fn shallow_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other) || (**self).shallow_eq(other)
    }
    fn deep_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other) || (**self).deep_eq(other)
    }
}

impl<T: Equate + ?Sized> Equate for Arc<T> {
    fn is(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
    fn shallow_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other) || (**self).shallow_eq(other)
    }
    fn deep_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other) || (**self).deep_eq(other)
    }
}

impl<T: Equate + ?Sized> Equate for Box<T> {
    fn is(&self, other: &Self) -> bool {
        (**self).is(other)
    }
    fn shallow_eq(&self, other: &Self) -> bool {
        (**self).shallow_eq(other)
    }
    fn deep_eq(&self, other: &Self) -> bool {
        (**self).deep_eq(other)
    }
}

impl<T: Equate> Equate for Option<T> {
    fn is(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.is(b),
            (None, None) => true,
            _ => false,
        }
    }
    fn deep_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.deep_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: Equate> Equate for [T] {
    fn is(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.is(b))
    }
    fn deep_eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.deep_eq(b))
    }
}

impl<T: Equate> Equate for Vec<T> {
    fn is(&self, other: &Self) -> bool {
        self.as_slice().is(other)
    }
    fn deep_eq(&self, other: &Self) -> bool {
        self.as_slice().deep_eq(other)
    }
}

impl<K: Ord, V: Equate> Equate for BTreeMap<K, V> {
    fn is(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other)
                .all(|((k0, v0), (k1, v1))| k0 == k1 && v0.is(v1))
    }
    fn deep_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other)
                .all(|((k0, v0), (k1, v1))| k0 == k1 && v0.deep_eq(v1))
    }
}

impl<K: Eq + Hash, V: Equate> Equate for HashMap<K, V> {
    fn is(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| v.is(o)))
    }
    fn deep_eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).is_some_and(|o| v.deep_eq(o)))
    }
}

macro_rules! impl_equate_for_tuple {
    ($($t:ident $i:tt),*) => {
        impl<$($t: Equate),*> Equate for ($($t,)*) {
            fn is(&self, other: &Self) -> bool {
                $(self.$i.is(&other.$i))&&*
            }
            fn deep_eq(&self, other: &Self) -> bool {
                $(self.$i.deep_eq(&other.$i))&&*
            }
        }
    };
}

impl_equate_for_tuple!(A 0, B 1);
impl_equate_for_tuple!(A 0, B 1, C 2);
impl_equate_for_tuple!(A 0, B 1, C 2, D 3);

pub(crate) type EqFn<T> = Rc<dyn Fn(&T, &T) -> bool>;

/// Equality of a cell: one of the built-in modes or a custom function.
pub enum Equality<T> {
    Is,
    Shallow,
    Deep,
    Custom(Rc<dyn Fn(&T, &T) -> bool>),
}

impl<T> Equality<T> {
    pub fn custom(f: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Equality::Custom(Rc::new(f))
    }

    /// The built-in mode, or `None` for a custom function.
    pub fn mode(&self) -> Option<EqualityMode> {
        match self {
            Equality::Is => Some(EqualityMode::Is),
            Equality::Shallow => Some(EqualityMode::Shallow),
            Equality::Deep => Some(EqualityMode::Deep),
            Equality::Custom(_) => None,
        }
    }

    pub(crate) fn into_fn(self) -> EqFn<T>
    where
        T: Equate + 'static,
    {
        match self {
            Equality::Custom(f) => f,
            Equality::Is => Rc::new(|a: &T, b: &T| a.is(b)),
            Equality::Shallow => Rc::new(|a: &T, b: &T| a.shallow_eq(b)),
            Equality::Deep => Rc::new(|a: &T, b: &T| a.deep_eq(b)),
        }
    }
}
impl<T> From<EqualityMode> for Equality<T> {
    fn from(mode: EqualityMode) -> Self {
        match mode {
            EqualityMode::Is => Equality::Is,
            EqualityMode::Shallow => Equality::Shallow,
            EqualityMode::Deep => Equality::Deep,
        }
    }
}
impl<T> Default for Equality<T> {
    fn default() -> Self {
        Equality::Is
    }
}
impl<T> Clone for Equality<T> {
    fn clone(&self) -> Self {
        match self {
            Equality::Is => Equality::Is,
            Equality::Shallow => Equality::Shallow,
            Equality::Deep => Equality::Deep,
            Equality::Custom(f) => Equality::Custom(f.clone()),
        }
    }
}
impl<T> fmt::Debug for Equality<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode() {
            Some(mode) => write!(f, "Equality::{mode:?}"),
            None => write!(f, "Equality::Custom(..)"),
        }
    }
}
