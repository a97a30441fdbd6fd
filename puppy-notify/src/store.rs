//! Persisted key-value state shared across ticks.
//!
//! The engine only needs string and integer reads plus an all-or-nothing
//! multi-key write. Platform hosts provide their own [`PersistedStore`];
//! this module ships an in-memory store and a JSON file store.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// A single persisted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreValue {
    Int(i64),
    Str(String),
}

impl StoreValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            Self::Int(_) => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            Self::Str(_) => None,
        }
    }
}

impl From<i64> for StoreValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<String> for StoreValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&str> for StoreValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

/// Trait for abstracting persisted state.
/// Platform-specific implementations should provide this
pub trait PersistedStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read a string value. A value of another type reads as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get_string(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Read an integer value. A value of another type reads as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn get_int(&self, key: &str) -> Result<Option<i64>, Self::Error>;

    /// Write every entry, or none of them.
    ///
    /// # Errors
    ///
    /// Returns an error if the write could not be committed; in that case no
    /// entry is visible to later reads.
    fn put_all(&mut self, entries: &[(String, StoreValue)]) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// In-process store. Clones share the same map, so a test can keep a handle
/// while the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, StoreValue>>>,
    offline: Arc<AtomicBool>,
    read_only: Arc<AtomicBool>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the backing storage going away (`true`) or coming back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Keep reads working but fail every `put_all` (`true`), or undo that.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    /// Copy of every stored entry.
    #[must_use]
    pub fn entries(&self) -> BTreeMap<String, StoreValue> {
        self.lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Write a single value, bypassing the offline switch. Test setup only.
    pub fn seed_value(&self, key: &str, value: impl Into<StoreValue>) {
        self.lock().insert(key.to_string(), value.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoreValue>> {
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl PersistedStore for MemoryStore {
    type Error = StoreError;

    fn get_string(&self, key: &str) -> Result<Option<String>, Self::Error> {
        self.check_online()?;
        Ok(self
            .lock()
            .get(key)
            .and_then(StoreValue::as_str)
            .map(str::to_string))
    }

    fn get_int(&self, key: &str) -> Result<Option<i64>, Self::Error> {
        self.check_online()?;
        Ok(self.lock().get(key).and_then(StoreValue::as_int))
    }

    fn put_all(&mut self, entries: &[(String, StoreValue)]) -> Result<(), Self::Error> {
        self.check_online()?;
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is read-only".to_string()));
        }
        let mut values = self.lock();
        for (key, value) in entries {
            values.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}

/// Store persisted as a single JSON object at `<dir>/<namespace>.json`.
///
/// Writes land in a sibling temp file that is renamed over the previous one,
/// so readers never see a half-written file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, StoreValue>,
}

impl JsonFileStore {
    /// Open (or lazily create) the store for `namespace` under `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn open(dir: impl AsRef<Path>, namespace: &str) -> Result<Self, StoreError> {
        Self::open_path(dir.as_ref().join(format!("{namespace}.json")))
    }

    /// Open the store at an explicit file path.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn open_path(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, values })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn commit(&self, values: &BTreeMap<String, StoreValue>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(values)?;
        {
            let mut file = File::create(&tmp)?;
            file.write_all(&body)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PersistedStore for JsonFileStore {
    type Error = StoreError;

    fn get_string(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self
            .values
            .get(key)
            .and_then(StoreValue::as_str)
            .map(str::to_string))
    }

    fn get_int(&self, key: &str) -> Result<Option<i64>, Self::Error> {
        Ok(self.values.get(key).and_then(StoreValue::as_int))
    }

    fn put_all(&mut self, entries: &[(String, StoreValue)]) -> Result<(), Self::Error> {
        let mut next = self.values.clone();
        for (key, value) in entries {
            next.insert(key.clone(), value.clone());
        }
        self.commit(&next)?;
        self.values = next;
        Ok(())
    }
}
