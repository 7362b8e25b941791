//! Grouped key/value preferences persisted as a TOML document.
//!
//! Each group becomes a TOML table. Every `set_*` rewrites the whole file
//! through a temporary sibling and a rename, so a crash mid-write leaves the
//! previous version in place.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::PrefsError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

type Groups = BTreeMap<String, BTreeMap<String, PrefValue>>;

#[derive(Debug, Default)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    groups: Groups,
}

impl PreferenceStore {
    /// Load from `path`. A missing file is a first run and yields an empty
    /// store that will be created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PrefsError> {
        let path = path.into();
        let groups = match fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|source| PrefsError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no preference file yet");
                Groups::new()
            }
            Err(source) => return Err(PrefsError::Io { path, source }),
        };
        Ok(Self {
            path: Some(path),
            groups,
        })
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn path(&self) -> Option<&std::path::Path> {
        self.path.as_deref()
    }

    fn get(&self, group: &str, key: &str) -> Option<&PrefValue> {
        self.groups.get(group)?.get(key)
    }

    pub fn get_bool(&self, group: &str, key: &str, default: bool) -> bool {
        match self.get(group, key) {
            Some(PrefValue::Bool(b)) => *b,
            _ => default,
        }
    }

    pub fn get_int(&self, group: &str, key: &str, default: i64) -> i64 {
        match self.get(group, key) {
            Some(PrefValue::Int(i)) => *i,
            _ => default,
        }
    }

    pub fn get_string(&self, group: &str, key: &str, default: &str) -> String {
        match self.get(group, key) {
            Some(PrefValue::Text(s)) => s.clone(),
            _ => default.to_string(),
        }
    }

    pub fn set_bool(&mut self, group: &str, key: &str, value: bool) -> Result<(), PrefsError> {
        self.set(group, key, PrefValue::Bool(value))
    }

    pub fn set_int(&mut self, group: &str, key: &str, value: i64) -> Result<(), PrefsError> {
        self.set(group, key, PrefValue::Int(value))
    }

    pub fn set_string(&mut self, group: &str, key: &str, value: &str) -> Result<(), PrefsError> {
        self.set(group, key, PrefValue::Text(value.to_string()))
    }

    /// Returns whether the key existed.
    pub fn remove(&mut self, group: &str, key: &str) -> Result<bool, PrefsError> {
        self.remove_many(group, &[key])
    }

    /// Drop several keys of one group with a single write. Returns whether
    /// any of them existed.
    pub fn remove_many(&mut self, group: &str, keys: &[&str]) -> Result<bool, PrefsError> {
        let Some(table) = self.groups.get_mut(group) else {
            return Ok(false);
        };
        let mut existed = false;
        for key in keys {
            existed |= table.remove(*key).is_some();
        }
        if table.is_empty() {
            self.groups.remove(group);
        }
        if existed {
            self.flush()?;
        }
        Ok(existed)
    }

    /// Set several keys of one group with a single write.
    pub fn set_many<'k>(
        &mut self,
        group: &str,
        values: impl IntoIterator<Item = (&'k str, PrefValue)>,
    ) -> Result<(), PrefsError> {
        let table = self.groups.entry(group.to_string()).or_default();
        for (key, value) in values {
            table.insert(key.to_string(), value);
        }
        self.flush()
    }

    fn set(&mut self, group: &str, key: &str, value: PrefValue) -> Result<(), PrefsError> {
        self.set_many(group, [(key, value)])
    }

    fn flush(&self) -> Result<(), PrefsError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let io_err = |source| PrefsError::Io {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = toml::to_string_pretty(&self.groups)?;
        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, content).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        Ok(())
    }
}
