// Flat key-value settings store used to remember filter selections

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

// Keys a filter selection is persisted under
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SettingsKey {
    MinPrice,
    MaxPrice,
    MinMileage,
    MaxMileage,
    FuelType,
    Colour,
    RegistrationFrom,
    RegistrationTo,
}

impl SettingsKey {
    pub const ALL: [SettingsKey; 8] = [
        SettingsKey::MinPrice,
        SettingsKey::MaxPrice,
        SettingsKey::MinMileage,
        SettingsKey::MaxMileage,
        SettingsKey::FuelType,
        SettingsKey::Colour,
        SettingsKey::RegistrationFrom,
        SettingsKey::RegistrationTo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingsKey::MinPrice => "minPrice",
            SettingsKey::MaxPrice => "maxPrice",
            SettingsKey::MinMileage => "minMileage",
            SettingsKey::MaxMileage => "maxMileage",
            SettingsKey::FuelType => "fuelType",
            SettingsKey::Colour => "colour",
            SettingsKey::RegistrationFrom => "registrationFrom",
            SettingsKey::RegistrationTo => "registrationTo",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoredValue {
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl StoredValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            StoredValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            StoredValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            StoredValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// Read/write contract for persisted filter selections.
///
/// Absence of a key means "use the default".
pub trait SettingsRepository: Send + Sync {
    fn read(&self, key: SettingsKey) -> Option<StoredValue>;
    fn write(&mut self, key: SettingsKey, value: StoredValue) -> Result<(), StoreError>;
    fn remove(&mut self, key: SettingsKey) -> Result<(), StoreError>;

    /// Write every entry or none of them. On failure the keys written so far
    /// are restored to their previous values.
    fn write_many(&mut self, entries: Vec<(SettingsKey, StoredValue)>) -> Result<(), StoreError> {
        let previous: Vec<(SettingsKey, Option<StoredValue>)> =
            entries.iter().map(|(key, _)| (*key, self.read(*key))).collect();
        for (done, (key, value)) in entries.into_iter().enumerate() {
            if let Err(e) = self.write(key, value) {
                restore(self, &previous[..done]);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Remove every key or none of them.
    fn remove_many(&mut self, keys: &[SettingsKey]) -> Result<(), StoreError> {
        let previous: Vec<(SettingsKey, Option<StoredValue>)> =
            keys.iter().map(|key| (*key, self.read(*key))).collect();
        for (done, key) in keys.iter().enumerate() {
            if let Err(e) = self.remove(*key) {
                restore(self, &previous[..done]);
                return Err(e);
            }
        }
        Ok(())
    }
}

// Best-effort undo of a partially applied batch
fn restore<R: SettingsRepository + ?Sized>(
    store: &mut R,
    previous: &[(SettingsKey, Option<StoredValue>)],
) {
    for (key, old) in previous {
        let undone = match old {
            Some(value) => store.write(*key, value.clone()),
            None => store.remove(*key),
        };
        if let Err(e) = undone {
            tracing::error!(key = key.as_str(), error = %e, "Failed to roll back settings key");
        }
    }
}

// Volatile store, used in tests and when no settings file is configured
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SettingsRepository for MemoryStore {
    fn read(&self, key: SettingsKey) -> Option<StoredValue> {
        self.entries.get(key.as_str()).cloned()
    }

    fn write(&mut self, key: SettingsKey, value: StoredValue) -> Result<(), StoreError> {
        self.entries.insert(key.as_str().to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: SettingsKey) -> Result<(), StoreError> {
        self.entries.remove(key.as_str());
        Ok(())
    }
}

// JSON-file backed store; every change rewrites the whole file, and a failed
// rewrite leaves the in-memory entries as they were
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, StoredValue>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file starts empty; an unreadable or
    /// corrupt one is logged and also starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, StoredValue>>(&content) {
                Ok(entries) => {
                    tracing::debug!(path = %path.display(), keys = entries.len(), "Loaded filter settings");
                    entries
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Settings file is corrupt, starting with defaults");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No settings file yet, starting with defaults");
                BTreeMap::new()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read settings file, starting with defaults");
                BTreeMap::new()
            }
        };
        JsonFileStore { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StoreError> {
        let encoded = serde_json::to_string_pretty(&self.entries)?;
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        // Write next to the target, then rename over it
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, encoded).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl SettingsRepository for JsonFileStore {
    fn read(&self, key: SettingsKey) -> Option<StoredValue> {
        self.entries.get(key.as_str()).cloned()
    }

    fn write(&mut self, key: SettingsKey, value: StoredValue) -> Result<(), StoreError> {
        self.write_many(vec![(key, value)])
    }

    fn remove(&mut self, key: SettingsKey) -> Result<(), StoreError> {
        self.remove_many(&[key])
    }

    // Batches are applied in memory and persisted with a single file write
    fn write_many(&mut self, entries: Vec<(SettingsKey, StoredValue)>) -> Result<(), StoreError> {
        let backup = self.entries.clone();
        for (key, value) in entries {
            self.entries.insert(key.as_str().to_string(), value);
        }
        if let Err(e) = self.persist() {
            self.entries = backup;
            return Err(e);
        }
        Ok(())
    }

    fn remove_many(&mut self, keys: &[SettingsKey]) -> Result<(), StoreError> {
        let backup = self.entries.clone();
        let mut changed = false;
        for key in keys {
            changed |= self.entries.remove(key.as_str()).is_some();
        }
        if !changed {
            return Ok(());
        }
        if let Err(e) = self.persist() {
            self.entries = backup;
            return Err(e);
        }
        Ok(())
    }
}
