//! Internal implementation details.

pub(crate) mod circular;

pub use circular::ResolutionStack;

#[cfg(feature = "ahash")]
pub(crate) type Hasher = ahash::RandomState;
#[cfg(not(feature = "ahash"))]
pub(crate) type Hasher = std::collections::hash_map::RandomState;

pub(crate) type Map<K, V> = indexmap::IndexMap<K, V, Hasher>;
pub(crate) type Set<T> = indexmap::IndexSet<T, Hasher>;
