//! Collection aliases used throughout the crate.

pub type HashMap<K, V> = rustc_hash::FxHashMap<K, V>;
pub type HashSet<T> = rustc_hash::FxHashSet<T>;

pub use std::collections::{BTreeMap, BTreeSet};
