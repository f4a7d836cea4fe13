// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Uplift.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Versions the user chose to skip

use crate::error::{Result, UpdateError};
use crate::traits::IgnoreStore;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

static GLOBAL: OnceLock<Arc<IgnoreList>> = OnceLock::new();

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IgnoredVersion {
    pub version_code: u32,
    pub ignored_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct IgnoreFile {
    #[serde(default)]
    versions: Vec<IgnoredVersion>,
}

/// Ignore list kept in memory and optionally mirrored to a JSON file
#[derive(Debug, Default)]
pub struct IgnoreList {
    entries: RwLock<BTreeMap<u32, DateTime<Utc>>>,
    path: Option<PathBuf>,
}

impl IgnoreList {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Process-wide list used when no other store is configured
    pub fn global() -> Arc<IgnoreList> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::in_memory())))
    }

    /// Load entries from `path`; a missing file starts an empty list
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let file: IgnoreFile = serde_json::from_str(&content).map_err(|e| {
                UpdateError::Configuration(format!(
                    "Failed to parse ignore file {}: {e}",
                    path.display()
                ))
            })?;
            file.versions
                .into_iter()
                .map(|v| (v.version_code, v.ignored_at))
                .collect()
        } else {
            BTreeMap::new()
        };

        debug!(
            "Loaded {} ignored versions from {}",
            entries.len(),
            path.display()
        );

        Ok(Self {
            entries: RwLock::new(entries),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn versions(&self) -> Vec<IgnoredVersion> {
        self.entries
            .read()
            .iter()
            .map(|(code, at)| IgnoredVersion {
                version_code: *code,
                ignored_at: *at,
            })
            .collect()
    }

    /// Remove every entry. On a failed save the list is left as it was.
    pub fn clear(&self) -> Result<()> {
        let mut entries = self.entries.write();
        self.persist(&BTreeMap::new())?;
        entries.clear();
        Ok(())
    }

    fn persist(&self, entries: &BTreeMap<u32, DateTime<Utc>>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = IgnoreFile {
            versions: entries
                .iter()
                .map(|(code, at)| IgnoredVersion {
                    version_code: *code,
                    ignored_at: *at,
                })
                .collect(),
        };
        let content = serde_json::to_string_pretty(&file)?;

        // Atomic write
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, path)?;

        Ok(())
    }
}

impl IgnoreStore for IgnoreList {
    fn is_ignored(&self, version_code: u32) -> bool {
        self.entries.read().contains_key(&version_code)
    }

    fn add(&self, version_code: u32) -> Result<()> {
        let mut entries = self.entries.write();
        if entries.contains_key(&version_code) {
            return Ok(());
        }

        let mut updated = entries.clone();
        updated.insert(version_code, Utc::now());
        self.persist(&updated)?;
        *entries = updated;
        info!("Version {version_code} added to the ignore list");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_add_and_lookup() {
        let list = IgnoreList::in_memory();
        assert!(!list.is_ignored(10));

        list.add(10).unwrap();
        list.add(10).unwrap();

        assert!(list.is_ignored(10));
        assert!(!list.is_ignored(11));
        assert_eq!(list.versions().len(), 1);
    }

    #[test]
    fn test_persistent_list_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("ignored.json");

        let list = IgnoreList::open(&path).unwrap();
        list.add(7).unwrap();
        list.add(9).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());

        let reopened = IgnoreList::open(&path).unwrap();
        assert!(reopened.is_ignored(7));
        assert!(reopened.is_ignored(9));
        assert_eq!(reopened.path(), Some(path.as_path()));
    }

    #[test]
    fn test_clear_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ignored.json");

        let list = IgnoreList::open(&path).unwrap();
        list.add(3).unwrap();
        list.clear().unwrap();

        let reopened = IgnoreList::open(&path).unwrap();
        assert!(reopened.versions().is_empty());
    }

    #[test]
    fn test_failed_add_is_not_kept() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "regular file").unwrap();

        let list = IgnoreList::open(blocker.join("ignored.json")).unwrap();
        assert!(list.add(10).is_err());
        assert!(!list.is_ignored(10));
        assert!(list.versions().is_empty());
    }

    #[test]
    fn test_failed_clear_keeps_entries() {
        let dir = TempDir::new().unwrap();
        let state = dir.path().join("state");
        let list = IgnoreList::open(state.join("ignored.json")).unwrap();
        list.add(3).unwrap();

        std::fs::remove_dir_all(&state).unwrap();
        std::fs::write(&state, "regular file").unwrap();

        assert!(list.clear().is_err());
        assert!(list.is_ignored(3));
        assert_eq!(list.versions().len(), 1);
    }

    #[test]
    fn test_corrupt_file_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ignored.json");
        std::fs::write(&path, "not json").unwrap();

        let err = IgnoreList::open(&path).unwrap_err();
        assert!(matches!(err, UpdateError::Configuration(_)));
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&IgnoreList::global(), &IgnoreList::global()));
    }
}
