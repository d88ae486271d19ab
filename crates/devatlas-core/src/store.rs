//! Key-value persistence for progress state.
//!
//! State is stored under three logical keys, each holding a string value:
//!
//! | key                 | value                                      |
//! |---------------------|--------------------------------------------|
//! | `active_track`      | the selected track id                      |
//! | `completed_lessons` | JSON array of lesson ids                   |
//! | `activity_history`  | JSON object `{"YYYY-MM-DD": count}`        |
//!
//! # Recovery
//!
//! A missing or unparsable value decodes to its empty default and is logged
//! with `warn!`. Only I/O failures of the underlying store are errors.
//!
//! # Atomicity
//!
//! [`save_state`] writes all keys through a single [`KeyValueStore::put_all`]
//! call. [`FileStore`] implements that as one temp-file + rename under an
//! exclusive advisory lock, so readers never observe a completion set from
//! one toggle paired with the history from another.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::AtlasError;
use crate::filter::Selection;
use crate::lock::{DEFAULT_LOCK_TIMEOUT, StateLock};
use crate::progress::{ActivityHistory, CompletionSet, ProgressState};

pub const KEY_ACTIVE_TRACK: &str = "active_track";
pub const KEY_COMPLETED_LESSONS: &str = "completed_lessons";
pub const KEY_ACTIVITY_HISTORY: &str = "activity_history";

/// File name used by [`FileStore::in_dir`].
pub const STATE_FILE_NAME: &str = "state.json";

/// Minimal string key-value store, modeled on browser local storage.
pub trait KeyValueStore {
    /// Read one value.
    ///
    /// # Errors
    ///
    /// Returns an error only when the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, AtlasError>;

    /// Read several values from one consistent snapshot, in `keys` order.
    ///
    /// # Errors
    ///
    /// Same as [`KeyValueStore::get`].
    fn get_all(&self, keys: &[&str]) -> Result<Vec<Option<String>>, AtlasError> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Write every entry in one all-or-nothing commit.
    ///
    /// # Errors
    ///
    /// Returns an error when the commit fails; no entry is written then.
    fn put_all(&mut self, entries: &[(&str, String)]) -> Result<(), AtlasError>;
}

/// In-process store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing encoding. Useful for recovery tests.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.entries.insert(key.to_string(), value.into());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AtlasError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put_all(&mut self, entries: &[(&str, String)]) -> Result<(), AtlasError> {
        for (key, value) in entries {
            self.entries.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }
}

/// JSON-object-on-disk store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);
        Self {
            path,
            lock_path,
        }
    }

    /// Store at `<dir>/state.json`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(STATE_FILE_NAME))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole map. A missing file is empty; a corrupt file is logged
    /// and treated as empty. Non-string values are returned as their JSON
    /// text so each key still decodes on its own.
    fn read_map(&self) -> Result<BTreeMap<String, String>, AtlasError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(AtlasError::StateRead(e)),
        };

        match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&content) {
            Ok(map) => Ok(map
                .into_iter()
                .map(|(key, value)| {
                    let raw = match value {
                        serde_json::Value::String(raw) => raw,
                        other => other.to_string(),
                    };
                    (key, raw)
                })
                .collect()),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "state file is corrupt; starting from empty state"
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> io::Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let mut tmp_name = self.path.file_name().map(ToOwned::to_owned).unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        let body = serde_json::to_vec_pretty(map).map_err(io::Error::other)?;
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(&body)?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AtlasError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let _guard = StateLock::shared(&self.lock_path, DEFAULT_LOCK_TIMEOUT)?;
        Ok(self.read_map()?.remove(key))
    }

    fn get_all(&self, keys: &[&str]) -> Result<Vec<Option<String>>, AtlasError> {
        // Nothing to read yet: skip the lock so reads never create files.
        if !self.path.exists() {
            return Ok(vec![None; keys.len()]);
        }
        let _guard = StateLock::shared(&self.lock_path, DEFAULT_LOCK_TIMEOUT)?;
        let mut map = self.read_map()?;
        Ok(keys.iter().map(|key| map.remove(*key)).collect())
    }

    fn put_all(&mut self, entries: &[(&str, String)]) -> Result<(), AtlasError> {
        let _guard = StateLock::exclusive(&self.lock_path, DEFAULT_LOCK_TIMEOUT)?;
        let mut map = self.read_map()?;
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        self.write_map(&map).map_err(AtlasError::StateWrite)?;
        tracing::debug!(path = %self.path.display(), keys = entries.len(), "state committed");
        Ok(())
    }
}

/// Everything read back from the store at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    pub progress: ProgressState,
    pub active_track: Option<String>,
}

/// Decode the persisted state, substituting empty defaults for bad values.
///
/// # Errors
///
/// Returns an error only when the store itself cannot be read.
pub fn load_state<S: KeyValueStore + ?Sized>(store: &S) -> Result<PersistedState, AtlasError> {
    let mut values = store
        .get_all(&[KEY_COMPLETED_LESSONS, KEY_ACTIVITY_HISTORY, KEY_ACTIVE_TRACK])?
        .into_iter();

    let completed: CompletionSet = decode_json(KEY_COMPLETED_LESSONS, values.next().flatten());
    let history: ActivityHistory = decode_json(KEY_ACTIVITY_HISTORY, values.next().flatten());
    let active_track = values
        .next()
        .flatten()
        .map(|raw| raw.trim().to_string())
        .filter(|id| !id.is_empty());

    Ok(PersistedState {
        progress: ProgressState::new(completed, history),
        active_track,
    })
}

fn decode_json<T>(key: &str, raw: Option<String>) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    let Some(raw) = raw else {
        return T::default();
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(key, error = %e, "unparsable persisted value; using empty default");
        T::default()
    })
}

/// Persist progress and selection in one commit.
///
/// `active_track` is only written when the selection has a track.
///
/// # Errors
///
/// Returns an error if encoding fails or the store rejects the commit.
pub fn save_state<S: KeyValueStore + ?Sized>(
    store: &mut S,
    progress: &ProgressState,
    selection: &Selection,
) -> Result<(), AtlasError> {
    let mut entries = vec![
        (KEY_COMPLETED_LESSONS, encode_json(progress.completed())?),
        (KEY_ACTIVITY_HISTORY, encode_json(progress.history())?),
    ];
    // A cleared selection leaves the stored track alone.
    if let Some(track_id) = &selection.track_id {
        entries.push((KEY_ACTIVE_TRACK, track_id.clone()));
    }
    store.put_all(&entries)
}

fn encode_json<T: serde::Serialize>(value: &T) -> Result<String, AtlasError> {
    serde_json::to_string(value).map_err(|e| AtlasError::StateWrite(io::Error::other(e)))
}
