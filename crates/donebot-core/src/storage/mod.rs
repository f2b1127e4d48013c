//! Persisted blobs and configuration.
//!
//! Two JSON blobs survive between runs: the run state and the task
//! registry. Each is written as a whole-file overwrite with no rename step
//! and no cross-process lock, so a crash mid-write can corrupt a blob and
//! overlapping runs are the scheduler's problem.

pub mod config;
pub mod credentials;

pub use config::Config;

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::StorageError;
use crate::state::RunState;
use crate::task::TaskRegistry;

/// Returns `~/.config/donebot[-dev]/` based on DONEBOT_ENV.
///
/// Set DONEBOT_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("DONEBOT_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("donebot-dev")
    } else {
        base_dir.join("donebot")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Named blob storage.
pub trait BlobStore {
    /// `Ok(None)` if the blob has never been written.
    fn load(&self, name: &str) -> Result<Option<String>, StorageError>;

    fn save(&self, name: &str, contents: &str) -> Result<(), StorageError>;
}

/// One file per blob. Relative names resolve against `root`.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl BlobStore for FileBlobStore {
    fn load(&self, name: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_of(name);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { path, source }),
        }
    }

    fn save(&self, name: &str, contents: &str) -> Result<(), StorageError> {
        let path = self.path_of(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Write {
                path: path.clone(),
                source,
            })?;
        }
        std::fs::write(&path, contents).map_err(|source| StorageError::Write { path, source })
    }
}

/// In-process store for tests.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RefCell<HashMap<String, String>>,
    writes: RefCell<Vec<String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: &str, contents: &str) {
        self.blobs
            .borrow_mut()
            .insert(name.to_string(), contents.to_string());
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.blobs.borrow().get(name).cloned()
    }

    /// Names written so far, in order.
    pub fn writes(&self) -> Vec<String> {
        self.writes.borrow().clone()
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self, name: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(name))
    }

    fn save(&self, name: &str, contents: &str) -> Result<(), StorageError> {
        self.insert(name, contents);
        self.writes.borrow_mut().push(name.to_string());
        Ok(())
    }
}

/// Typed access to the two blobs.
pub struct StateStore<'s, S: BlobStore + ?Sized> {
    store: &'s S,
    state_name: String,
    tasks_name: String,
}

impl<'s, S: BlobStore + ?Sized> StateStore<'s, S> {
    pub fn new(store: &'s S, state_name: &str, tasks_name: &str) -> Self {
        Self {
            store,
            state_name: state_name.to_string(),
            tasks_name: tasks_name.to_string(),
        }
    }

    /// Missing blob yields `{last_update_id: 0, done: {}}`.
    pub fn load_state(&self) -> Result<RunState, StorageError> {
        match self.store.load(&self.state_name)? {
            Some(raw) => decode(&self.state_name, &raw),
            None => Ok(RunState::default()),
        }
    }

    pub fn save_state(&self, state: &RunState) -> Result<(), StorageError> {
        self.store.save(&self.state_name, &encode(&self.state_name, state)?)?;
        tracing::info!(blob = %self.state_name, last_update_id = state.last_update_id, "state saved");
        Ok(())
    }

    /// Missing blob yields `fallback()`. A loaded registry is repaired
    /// in memory; the repair is written back with the next save.
    pub fn load_registry(&self, fallback: impl FnOnce() -> TaskRegistry) -> Result<TaskRegistry, StorageError> {
        match self.store.load(&self.tasks_name)? {
            Some(raw) => {
                let mut registry: TaskRegistry = decode(&self.tasks_name, &raw)?;
                if registry.repair() {
                    tracing::warn!(blob = %self.tasks_name, "task registry repaired on load");
                }
                Ok(registry)
            }
            None => Ok(fallback()),
        }
    }

    pub fn save_registry(&self, registry: &TaskRegistry) -> Result<(), StorageError> {
        self.store.save(&self.tasks_name, &encode(&self.tasks_name, registry)?)?;
        tracing::info!(blob = %self.tasks_name, tasks = registry.tasks().len(), "task registry saved");
        Ok(())
    }
}

fn decode<T: serde::de::DeserializeOwned>(name: &str, raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(|source| StorageError::Corrupt {
        name: name.to_string(),
        source,
    })
}

fn encode<T: serde::Serialize>(name: &str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string_pretty(value).map_err(|source| StorageError::Corrupt {
        name: name.to_string(),
        source,
    })
}
