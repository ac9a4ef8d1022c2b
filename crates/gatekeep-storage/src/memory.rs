//! In-process storage backed by two hash maps.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::{Scope, Storage, StorageError};

#[derive(Debug, Default)]
struct Scopes {
    durable: HashMap<String, String>,
    ephemeral: HashMap<String, String>,
}

impl Scopes {
    fn scope_mut(&mut self, scope: Scope) -> &mut HashMap<String, String> {
        match scope {
            Scope::Durable => &mut self.durable,
            Scope::Ephemeral => &mut self.ephemeral,
        }
    }
}

/// A [`Storage`] that keeps everything in memory.
///
/// Nothing survives the process, so the durable/ephemeral split only
/// matters through [`Storage::clear`]. Used by tests and by hosts that
/// manage persistence elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    scopes: Mutex<Scopes>,
}

impl MemoryStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys held in `scope`.
    ///
    /// # Errors
    /// Returns [`StorageError::Unavailable`] if the lock is poisoned.
    pub fn len(&self, scope: Scope) -> Result<usize, StorageError> {
        Ok(self.lock()?.scope_mut(scope).len())
    }

    /// Returns `true` if `scope` holds no keys.
    ///
    /// # Errors
    /// Returns [`StorageError::Unavailable`] if the lock is poisoned.
    pub fn is_empty(&self, scope: Scope) -> Result<bool, StorageError> {
        Ok(self.len(scope)? == 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Scopes>, StorageError> {
        self.scopes
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".into()))
    }
}

impl Storage for MemoryStorage {
    fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.scope_mut(scope).get(key).cloned())
    }

    fn set(&self, scope: Scope, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock()?
            .scope_mut(scope)
            .insert(key.to_string(), value.to_string());
        tracing::debug!(%scope, key, "stored value");
        Ok(())
    }

    fn remove(&self, scope: Scope, key: &str) -> Result<(), StorageError> {
        self.lock()?.scope_mut(scope).remove(key);
        tracing::debug!(%scope, key, "removed value");
        Ok(())
    }

    fn clear(&self, scope: Scope) -> Result<(), StorageError> {
        self.lock()?.scope_mut(scope).clear();
        tracing::debug!(%scope, "cleared scope");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_same_scope_returns_value() {
        let storage = MemoryStorage::new();

        storage.set(Scope::Durable, "k", "v").unwrap();

        assert_eq!(storage.get(Scope::Durable, "k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_scopes_are_independent() {
        let storage = MemoryStorage::new();
        storage.set(Scope::Durable, "k", "durable").unwrap();
        storage.set(Scope::Ephemeral, "k", "ephemeral").unwrap();

        assert_eq!(
            storage.get(Scope::Durable, "k").unwrap().as_deref(),
            Some("durable")
        );
        assert_eq!(
            storage.get(Scope::Ephemeral, "k").unwrap().as_deref(),
            Some("ephemeral")
        );
    }

    #[test]
    fn test_remove_absent_key_is_ok() {
        let storage = MemoryStorage::new();

        assert!(storage.remove(Scope::Ephemeral, "missing").is_ok());
    }

    #[test]
    fn test_clear_ephemeral_keeps_durable() {
        let storage = MemoryStorage::new();
        storage.set(Scope::Durable, "remember", "1").unwrap();
        storage.set(Scope::Ephemeral, "token", "t").unwrap();
        storage.set(Scope::Ephemeral, "user", "u").unwrap();

        storage.clear(Scope::Ephemeral).unwrap();

        assert!(storage.is_empty(Scope::Ephemeral).unwrap());
        assert_eq!(storage.len(Scope::Durable).unwrap(), 1);
    }

    #[test]
    fn test_len_poisoned_lock_returns_unavailable() {
        let storage = std::sync::Arc::new(MemoryStorage::new());
        let poisoner = std::sync::Arc::clone(&storage);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.scopes.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(matches!(
            storage.len(Scope::Durable),
            Err(StorageError::Unavailable(_))
        ));
        assert!(storage.is_empty(Scope::Ephemeral).is_err());
    }
}
