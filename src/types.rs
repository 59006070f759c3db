/// Zero-based index into the reference table (first-seen order).
pub type RefIndex = usize;
/// Zero-based index into the read table (first-seen order).
pub type ReadIndex = usize;

// Fast hash maps using AHash instead of the default SipHash.
// Import these throughout the codebase with `use crate::types::HashMap`.
// Also import `HashMapExt` when you need `::new()` or `::with_capacity()`.
pub(crate) type HashMap<K, V> = ahash::HashMap<K, V>;
pub(crate) type HashSet<K> = ahash::HashSet<K>;
pub(crate) use ahash::HashMapExt;
pub(crate) use ahash::HashSetExt;
