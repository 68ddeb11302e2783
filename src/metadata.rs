//! Metadata store filled in while controllers are being defined.
//!
//! Every definition call (`prefix`, `get`, `before`, ...) records a value
//! against a [`Target`] under a typed [`Key`]. Nothing is interpreted at
//! that point; bootstrap reads the store back into descriptors. Definition
//! calls may therefore come in any order, and readers must cope with a
//! target that is only partly filled in.
//!
//! Scalar keys overwrite, list keys append:
//!
//! ```rust
//! use castor::metadata::{Key, MetadataStore, Target};
//!
//! struct Users;
//! const PREFIX: Key<String> = Key::scalar("prefix");
//! const TAGS: Key<&str> = Key::list("tags");
//!
//! let mut store = MetadataStore::new();
//! let users = Target::of::<Users>();
//! store.record(users, &PREFIX, "/a".to_owned());
//! store.record(users, &PREFIX, "/b".to_owned());
//! store.record(users, &TAGS, "x");
//! store.record(users, &TAGS, "y");
//!
//! assert_eq!(store.get(users, &PREFIX).map(String::as_str), Some("/b"));
//! assert_eq!(store.get_all(users, &TAGS).copied().collect::<Vec<_>>(), ["x", "y"]);
//! ```

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// A type, or one named member of a type, that metadata is attached to.
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Target {
    type_id: TypeId,
    type_name: &'static str,
    member: Option<&'static str>,
}

impl Target {
    pub fn of<T: 'static>() -> Self {
        Self { type_id: TypeId::of::<T>(), type_name: type_name::<T>(), member: None }
    }

    pub fn member<T: 'static>(member: &'static str) -> Self {
        Self::of::<T>().with_member(member)
    }

    /// The same type, pointing at `member`.
    pub fn with_member(self, member: &'static str) -> Self {
        Self { member: Some(member), ..self }
    }

    /// The same type, without the member.
    pub fn owner(self) -> Self {
        Self { member: None, ..self }
    }

    pub fn type_id(&self) -> TypeId { self.type_id }

    /// Last path segment of the type name, e.g. `UsersController`.
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.type_name)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.member {
            Some(m) => write!(f, "{}::{m}", self.short_name()),
            None => f.write_str(self.short_name()),
        }
    }
}

/// Strips module paths from a type name (`a::b::Foo` → `Foo`).
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let end = full.find('<').unwrap_or(full.len());
    match full[..end].rfind("::") {
        Some(i) => &full[i + 2..],
        None => full,
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum KeyKind {
    Scalar,
    List,
}

/// A typed metadata key. Declare keys as `const`s next to their readers.
pub struct Key<V> {
    name: &'static str,
    kind: KeyKind,
    _value: PhantomData<fn() -> V>,
}

impl<V> Key<V> {
    pub const fn scalar(name: &'static str) -> Self {
        Self { name, kind: KeyKind::Scalar, _value: PhantomData }
    }

    pub const fn list(name: &'static str) -> Self {
        Self { name, kind: KeyKind::List, _value: PhantomData }
    }
}

type Value = Box<dyn Any + Send + Sync>;

/// Associative storage from `(target, key)` to recorded values.
///
/// Owned by an [`App`](crate::App); independent apps never share a store.
#[derive(Default)]
pub struct MetadataStore {
    entries: HashMap<(Target, &'static str), Vec<Value>>,
}

impl MetadataStore {
    pub fn new() -> Self { Self::default() }

    /// Attaches `value` to `target`. Replaces the previous value for scalar
    /// keys; appends for list keys.
    pub fn record<V: Send + Sync + 'static>(&mut self, target: Target, key: &Key<V>, value: V) {
        let slot = self.entries.entry((target, key.name)).or_default();
        if key.kind == KeyKind::Scalar {
            slot.clear();
        }
        slot.push(Box::new(value));
    }

    /// Reads a scalar key. `None` when nothing was recorded.
    pub fn get<V: 'static>(&self, target: Target, key: &Key<V>) -> Option<&V> {
        self.entries
            .get(&(target, key.name))
            .and_then(|slot| slot.last())
            .and_then(|v| v.downcast_ref())
    }

    /// Reads a list key in recording order. Empty when nothing was recorded.
    pub fn get_all<'a, V: 'static>(
        &'a self,
        target: Target,
        key: &Key<V>,
    ) -> impl Iterator<Item = &'a V> + use<'a, V> {
        let name = key.name;
        self.entries
            .get(&(target, name))
            .into_iter()
            .flatten()
            .filter_map(|v| v.downcast_ref())
    }

    /// Whether anything at all was recorded against `target`.
    pub fn contains(&self, target: Target) -> bool {
        self.entries.keys().any(|(t, _)| *t == target)
    }
}

impl fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|((t, k), v)| ((t, k), v.len())))
            .finish()
    }
}
