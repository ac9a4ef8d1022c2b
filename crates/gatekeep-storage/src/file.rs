//! File-backed storage: one JSON object file per scope.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/durable.json     ← survives restarts, never cleared by the host
//! <root>/ephemeral.json   ← deleted when the host calls clear(Ephemeral)
//! ```
//!
//! Both files are loaded once in [`FileStorage::open`] and rewritten on every
//! mutation (write-through), so a freshly started process always sees the
//! last committed state. A mutation reaches the in-memory map only after its
//! file has been written; a failed write leaves both unchanged.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::{Scope, Storage, StorageError};

type Entries = BTreeMap<String, String>;

#[derive(Debug)]
struct Loaded {
    durable: Entries,
    ephemeral: Entries,
}

impl Loaded {
    fn entries(&mut self, scope: Scope) -> &mut Entries {
        match scope {
            Scope::Durable => &mut self.durable,
            Scope::Ephemeral => &mut self.ephemeral,
        }
    }
}

/// A [`Storage`] persisted as JSON files in a directory.
#[derive(Debug)]
pub struct FileStorage {
    root: PathBuf,
    state: Mutex<Loaded>,
}

impl FileStorage {
    /// Opens (or creates) a storage rooted at `root`.
    ///
    /// Existing scope files are read eagerly.
    ///
    /// # Errors
    /// - [`StorageError::Io`] if the directory cannot be created or a file
    ///   cannot be read.
    /// - [`StorageError::Decode`] if a scope file is not a JSON object of
    ///   strings.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(StorageError::Io)?;

        let durable = read_entries(&scope_path(&root, Scope::Durable))?;
        let ephemeral = read_entries(&scope_path(&root, Scope::Ephemeral))?;

        tracing::debug!(
            root = %root.display(),
            durable = durable.len(),
            ephemeral = ephemeral.len(),
            "file storage opened"
        );

        Ok(Self {
            root,
            state: Mutex::new(Loaded { durable, ephemeral }),
        })
    }

    /// Returns the directory this storage writes to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lock(&self) -> Result<MutexGuard<'_, Loaded>, StorageError> {
        self.state
            .lock()
            .map_err(|_| StorageError::Unavailable("file storage lock poisoned".into()))
    }

    fn flush(&self, scope: Scope, entries: &Entries) -> Result<(), StorageError> {
        let path = scope_path(&self.root, scope);
        if entries.is_empty() {
            return remove_file(&path);
        }

        let body = serde_json::to_vec_pretty(entries).map_err(StorageError::Encode)?;
        // Write to a sibling file first so a crash never leaves a torn file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(StorageError::Io)?;
        fs::rename(&tmp, &path).map_err(StorageError::Io)
    }
}

impl Storage for FileStorage {
    fn get(&self, scope: Scope, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.entries(scope).get(key).cloned())
    }

    fn set(&self, scope: Scope, key: &str, value: &str) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        let mut next = state.entries(scope).clone();
        next.insert(key.to_string(), value.to_string());
        self.flush(scope, &next)?;
        *state.entries(scope) = next;
        tracing::debug!(%scope, key, "stored value");
        Ok(())
    }

    fn remove(&self, scope: Scope, key: &str) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        if !state.entries(scope).contains_key(key) {
            return Ok(());
        }
        let mut next = state.entries(scope).clone();
        next.remove(key);
        self.flush(scope, &next)?;
        *state.entries(scope) = next;
        tracing::debug!(%scope, key, "removed value");
        Ok(())
    }

    fn clear(&self, scope: Scope) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        remove_file(&scope_path(&self.root, scope))?;
        state.entries(scope).clear();
        tracing::debug!(%scope, "cleared scope");
        Ok(())
    }
}

fn scope_path(root: &Path, scope: Scope) -> PathBuf {
    root.join(format!("{scope}.json"))
}

fn read_entries(path: &Path) -> Result<Entries, StorageError> {
    match fs::read_to_string(path) {
        Ok(body) => serde_json::from_str(&body).map_err(|source| StorageError::Decode {
            key: path.display().to_string(),
            source,
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Entries::new()),
        Err(e) => Err(StorageError::Io(e)),
    }
}

fn remove_file(path: &Path) -> Result<(), StorageError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::Io(e)),
    }
}
