//! Scoped key/value persistence for Gatekeep.
//!
//! Provides the [`Storage`] trait that abstracts over where session data
//! lives, plus two implementations:
//!
//! - [`MemoryStorage`]: plain in-process maps, for tests and embedding
//! - [`FileStorage`]: one JSON file per scope, write-through
//!
//! Every operation is addressed by a [`Scope`]. The *durable* scope
//! outlives the process; the *ephemeral* scope only lives as long as one
//! host session and is emptied by the host calling
//! [`Storage::clear`]`(Scope::Ephemeral)` when that session ends.
//!
//! # Feature Flags
//!
//! - `file` (default): [`FileStorage`]

mod error;
#[cfg(feature = "file")]
mod file;
mod memory;

pub use error::StorageError;
#[cfg(feature = "file")]
pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};

/// Which persistence lifetime a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Survives full restarts of the host application.
    Durable,
    /// Survives reloads within one host session; cleared when it ends.
    Ephemeral,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Durable => write!(f, "durable"),
            Self::Ephemeral => write!(f, "ephemeral"),
        }
    }
}

/// Raw string key/value storage with two independent scopes.
///
/// Implementations hold no business logic. A read either returns the whole
/// stored value or `None`; there are no partial reads.
pub trait Storage: Send + Sync + 'static {
    /// Returns the value stored under `key`, or `None` if absent.
    fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, scope: Scope, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deletes `key`. Removing an absent key is not an error.
    fn remove(&self, scope: Scope, key: &str) -> Result<(), StorageError>;

    /// Deletes every key in `scope`.
    fn clear(&self, scope: Scope) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(scope, key)
    }

    fn set(&self, scope: Scope, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(scope, key, value)
    }

    fn remove(&self, scope: Scope, key: &str) -> Result<(), StorageError> {
        (**self).remove(scope, key)
    }

    fn clear(&self, scope: Scope) -> Result<(), StorageError> {
        (**self).clear(scope)
    }
}

/// Typed JSON helpers layered on top of any [`Storage`].
///
/// Implemented for every `Storage` automatically, so callers just
/// `use gatekeep_storage::StorageExt` and get `get_json`/`set_json`.
pub trait StorageExt: Storage {
    /// Reads and decodes a JSON value.
    ///
    /// # Errors
    /// Returns [`StorageError::Decode`] if the stored text is not a valid
    /// `T`. The caller never receives a half-filled record.
    fn get_json<T: DeserializeOwned>(
        &self,
        scope: Scope,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        match self.get(scope, key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StorageError::Decode {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    /// Encodes a value as JSON and stores it.
    fn set_json<T: Serialize + ?Sized>(
        &self,
        scope: Scope,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(StorageError::Encode)?;
        self.set(scope, key, &raw)
    }
}

impl<S: Storage + ?Sized> StorageExt for S {}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
        flag: bool,
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(Scope::Durable.to_string(), "durable");
        assert_eq!(Scope::Ephemeral.to_string(), "ephemeral");
    }

    #[test]
    fn test_set_json_then_get_json_returns_record() {
        let storage = MemoryStorage::new();
        let record = Record {
            name: "a".into(),
            flag: true,
        };

        storage.set_json(Scope::Durable, "rec", &record).unwrap();
        let loaded: Option<Record> =
            storage.get_json(Scope::Durable, "rec").unwrap();

        assert_eq!(loaded, Some(record));
    }

    #[test]
    fn test_get_json_missing_key_returns_none() {
        let storage = MemoryStorage::new();

        let loaded: Option<Record> =
            storage.get_json(Scope::Ephemeral, "nope").unwrap();

        assert!(loaded.is_none());
    }

    #[test]
    fn test_get_json_malformed_value_returns_decode_error() {
        let storage = MemoryStorage::new();
        storage.set(Scope::Durable, "rec", "{\"name\": 3").unwrap();

        let result: Result<Option<Record>, _> =
            storage.get_json(Scope::Durable, "rec");

        assert!(
            matches!(result, Err(StorageError::Decode { ref key, .. }) if key == "rec"),
            "got {result:?}"
        );
    }
}
