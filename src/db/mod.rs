//! Backing persistence media for the photo store.
//!
//! A medium is an opaque string-to-string namespace. The store layer above it
//! owns the record encoding; a medium only keeps keys in the order they were
//! first inserted and hands values back verbatim.

mod schema;
pub mod memory;
pub mod sqlite;

use std::sync::Arc;

use crate::error::StoreResult;

pub use memory::MemoryBackend;
pub use schema::SCHEMA;
pub use sqlite::SqliteBackend;

/// Key-value medium the photo store persists into.
pub trait KeyValueBackend: Send + Sync {
    /// All keys, in the order the medium yields them.
    fn get_all_keys(&self) -> StoreResult<Vec<String>>;

    /// Values for `keys`, one pair per requested key. A key that vanished
    /// since it was listed comes back with `None`.
    fn get_many(&self, keys: &[String]) -> StoreResult<Vec<(String, Option<String>)>>;

    /// Insert or overwrite a single value.
    fn set_value(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove every entry.
    fn clear_all(&self) -> StoreResult<()>;
}

impl<B: KeyValueBackend + ?Sized> KeyValueBackend for Arc<B> {
    fn get_all_keys(&self) -> StoreResult<Vec<String>> {
        (**self).get_all_keys()
    }

    fn get_many(&self, keys: &[String]) -> StoreResult<Vec<(String, Option<String>)>> {
        (**self).get_many(keys)
    }

    fn set_value(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set_value(key, value)
    }

    fn clear_all(&self) -> StoreResult<()> {
        (**self).clear_all()
    }
}
