//! Generic registry trait for immutable name lookups
//!
//! Registries are built once and then read-only. A reload builds a fresh
//! registry and swaps it in whole; nothing is mutated in place.

use std::borrow::Borrow;

/// A read-only registry for key-value lookups
pub trait Registry {
    /// The key type used for lookups
    type Key;

    /// The value type stored in the registry
    type Value;

    /// Get a value by key
    fn get<Q>(&self, key: &Q) -> Option<&Self::Value>
    where
        Self::Key: Borrow<Q>,
        Q: ?Sized + Eq + std::hash::Hash;

    /// Check if the registry contains a key
    fn contains<Q>(&self, key: &Q) -> bool
    where
        Self::Key: Borrow<Q>,
        Q: ?Sized + Eq + std::hash::Hash,
    {
        self.get(key).is_some()
    }

    /// List all key-value pairs
    fn iter(&self) -> impl Iterator<Item = (&Self::Key, &Self::Value)>;

    /// Number of entries in the registry
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Accumulates registrations, then `.build()` creates an immutable registry.
pub trait RegistryBuilder: Default {
    type Registry: Registry;
    type Key;
    type Value;

    fn register(self, key: Self::Key, value: Self::Value) -> Self;

    fn build(self) -> Self::Registry;
}
