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

//! JSON settings file for the built-in adapters

use crate::config::ConfigStore;
use crate::error::{Result, UpdateError};
use crate::files::CacheFileCreator;
use crate::http::{HttpCheckWorker, HttpDownloadWorker, USER_AGENT};
use crate::ignore::IgnoreList;
use crate::model::{CheckRequest, HttpMethod, NetworkCondition};
use crate::strategy::FixedNetwork;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

fn default_30() -> u64 {
    30
}

fn default_user_agent() -> String {
    USER_AGENT.to_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpliftSettings {
    /// Update check endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub method: HttpMethod,

    /// Query parameters (GET) or form fields (POST) sent with the check
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,

    /// Fixed network condition reported to the strategy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkCondition>,

    /// Where downloads are cached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,

    /// Persistent ignore list; in-memory when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_file: Option<PathBuf>,

    /// Check request timeout (seconds)
    #[serde(default = "default_30")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for UpliftSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            method: HttpMethod::default(),
            params: BTreeMap::new(),
            network: None,
            download_dir: None,
            ignore_file: None,
            request_timeout_secs: 30,
            user_agent: default_user_agent(),
        }
    }
}

impl UpliftSettings {
    pub fn check_request(&self) -> Option<CheckRequest> {
        let endpoint = self.endpoint.as_deref()?;
        Some(
            CheckRequest::builder(endpoint)
                .method(self.method)
                .params(self.params.clone())
                .build(),
        )
    }

    /// Ignore list named by the settings, or the process-wide one
    pub fn ignore_list(&self) -> Result<Arc<IgnoreList>> {
        match &self.ignore_file {
            Some(path) => Ok(Arc::new(IgnoreList::open(path)?)),
            None => Ok(IgnoreList::global()),
        }
    }

    /// Install the adapters these settings describe into `store`
    pub fn apply(&self, store: &ConfigStore) -> Result<()> {
        if let Some(request) = self.check_request() {
            store.set_check_request(request);
        }

        store.set_check_worker(Arc::new(HttpCheckWorker::with_options(
            &self.user_agent,
            Duration::from_secs(self.request_timeout_secs),
        )));
        store.set_download_worker(Arc::new(HttpDownloadWorker::with_user_agent(
            &self.user_agent,
        )));

        if let Some(network) = self.network {
            store.set_network_monitor(Arc::new(FixedNetwork(network)));
        }
        if let Some(dir) = &self.download_dir {
            store.set_file_creator(Arc::new(CacheFileCreator::new(dir)));
        }
        if self.ignore_file.is_some() {
            store.set_ignore_store(self.ignore_list()?);
        }

        debug!("Applied settings: endpoint={:?}", self.endpoint);
        Ok(())
    }
}

/// Load settings from `path`, writing defaults there if it does not exist
pub fn load_settings(path: &Path) -> Result<UpliftSettings> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            UpdateError::Configuration(format!(
                "Failed to parse settings {}: {e}",
                path.display()
            ))
        })
    } else {
        info!("No settings at {}, writing defaults", path.display());
        let settings = UpliftSettings::default();
        save_settings(path, &settings)?;
        Ok(settings)
    }
}

pub fn save_settings(path: &Path, settings: &UpliftSettings) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    let content = serde_json::to_string_pretty(settings)?;

    // Atomic write
    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OptionKind;
    use crate::traits::{IgnoreStore, NetworkMonitor};
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = UpliftSettings::default();
        assert!(settings.endpoint.is_none());
        assert_eq!(settings.method, HttpMethod::Get);
        assert_eq!(settings.request_timeout_secs, 30);
        assert!(settings.user_agent.starts_with("uplift/"));
        assert!(settings.check_request().is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: UpliftSettings = serde_json::from_str(
            r#"{
                "endpoint": "https://updates.example.com/check",
                "method": "POST",
                "network": "metered"
            }"#,
        )
        .unwrap();

        assert_eq!(settings.method, HttpMethod::Post);
        assert_eq!(settings.network, Some(NetworkCondition::Metered));
        assert_eq!(settings.request_timeout_secs, 30);

        let request = settings.check_request().unwrap();
        assert_eq!(request.url(), "https://updates.example.com/check");
        assert_eq!(request.method(), HttpMethod::Post);
    }

    #[test]
    fn test_load_missing_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf").join("uplift.json");

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings, UpliftSettings::default());
        assert!(path.exists());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("uplift.json");
        let settings = UpliftSettings {
            endpoint: Some("https://updates.example.com/check".to_owned()),
            params: BTreeMap::from([("channel".to_owned(), "beta".to_owned())]),
            request_timeout_secs: 5,
            ..UpliftSettings::default()
        };

        save_settings(&path, &settings).unwrap();
        assert!(!path.with_extension("tmp").exists());
        assert_eq!(load_settings(&path).unwrap(), settings);
    }

    #[test]
    fn test_corrupt_file_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("uplift.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            load_settings(&path),
            Err(UpdateError::Configuration(_))
        ));
    }

    #[test]
    fn test_apply_populates_store() {
        let dir = TempDir::new().unwrap();
        let settings = UpliftSettings {
            endpoint: Some("https://updates.example.com/check".to_owned()),
            network: Some(NetworkCondition::Offline),
            download_dir: Some(dir.path().join("cache")),
            ignore_file: Some(dir.path().join("ignored.json")),
            ..UpliftSettings::default()
        };

        let store = ConfigStore::create();
        settings.apply(&store).unwrap();

        assert_eq!(
            store.check_request().unwrap().url(),
            "https://updates.example.com/check"
        );
        assert!(store.is_populated(OptionKind::CheckWorker));
        assert!(store.is_populated(OptionKind::FileCreator));
        assert_eq!(
            store.network_monitor().condition(),
            NetworkCondition::Offline
        );

        store.ignore_store().add(12).unwrap();
        assert!(IgnoreList::open(dir.path().join("ignored.json"))
            .unwrap()
            .is_ignored(12));
    }
}
