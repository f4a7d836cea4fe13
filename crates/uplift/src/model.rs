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

//! Data model shared by the orchestrator and its adapters

use crate::error::{Result, UpdateError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// HTTP method used for the check request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

/// Where and how to ask for update metadata.
///
/// Immutable once built. Use [`CheckRequest::get`] for a plain URL or
/// [`CheckRequest::builder`] when a method or parameters are needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRequest {
    url: String,
    #[serde(default)]
    method: HttpMethod,
    #[serde(default)]
    params: BTreeMap<String, String>,
}

impl CheckRequest {
    /// Plain GET request without parameters
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            params: BTreeMap::new(),
        }
    }

    pub fn builder(url: impl Into<String>) -> CheckRequestBuilder {
        CheckRequestBuilder {
            request: Self::get(url),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// A request is only usable when it names an endpoint
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(UpdateError::Configuration("missing endpoint".to_owned()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CheckRequestBuilder {
    request: CheckRequest,
}

impl CheckRequestBuilder {
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.request.method = method;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.params.insert(key.into(), value.into());
        self
    }

    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.request
            .params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn build(self) -> CheckRequest {
        self.request
    }
}

/// Parsed metadata describing an available update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDescriptor {
    /// Monotonic build number; also the identifier stored in the ignore list
    pub version_code: u32,

    /// Human readable version (e.g. "1.4.2")
    pub version_name: String,

    /// Where the update artifact can be fetched
    #[serde(alias = "url")]
    pub download_url: String,

    /// Mandatory updates bypass the ignore list and any prompting
    #[serde(default, alias = "force", alias = "mandatory")]
    pub is_mandatory: bool,

    #[serde(default, alias = "notes")]
    pub release_notes: String,

    /// Opaque integrity marker; the default file checker treats it as a hex SHA256
    #[serde(default, alias = "sha256")]
    pub checksum: Option<String>,
}

/// Network condition observed when the strategy is consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkCondition {
    Unmetered,
    Metered,
    Offline,
}

impl NetworkCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unmetered => "unmetered",
            Self::Metered => "metered",
            Self::Offline => "offline",
        }
    }
}

impl fmt::Display for NetworkCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NetworkCondition {
    type Err = UpdateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "unmetered" | "wifi" => Ok(Self::Unmetered),
            "metered" | "mobile" | "cellular" => Ok(Self::Metered),
            "offline" | "none" => Ok(Self::Offline),
            _ => Err(UpdateError::Configuration(format!(
                "Unknown network condition: '{s}'. Supported: unmetered, metered, offline"
            ))),
        }
    }
}

/// Identity of the running application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    pub version_code: u32,
    pub version_name: String,
    pub executable: PathBuf,
}

impl AppInfo {
    pub fn new(
        name: impl Into<String>,
        version_code: u32,
        version_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version_code,
            version_name: version_name.into(),
            executable: current_executable(),
        }
    }

    /// Best-effort identity of the current process.
    ///
    /// Version code 0 means every published update is considered newer;
    /// applications are expected to set their real version.
    pub fn current() -> Self {
        let executable = current_executable();
        let name = executable
            .file_stem()
            .map_or_else(|| "app".to_owned(), |s| s.to_string_lossy().into_owned());
        Self {
            name,
            version_code: 0,
            version_name: "0.0.0".to_owned(),
            executable,
        }
    }

    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }
}

fn current_executable() -> PathBuf {
    std::env::current_exe().unwrap_or_else(|_| PathBuf::from("app"))
}

/// Context handed to the install strategy
#[derive(Debug, Clone)]
pub struct InstallContext {
    pub app: AppInfo,
}
