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

//! Adapter traits consumed by the update task.
//!
//! Each trait is one pluggable capability. Built-in implementations live in
//! the `http`, `files`, `install`, `parser`, `version`, `strategy`, `ignore`
//! and `callbacks` modules; applications replace any of them through
//! [`crate::ConfigStore`] or [`crate::TaskConfig`].

use crate::decision::{Decision, ProgressReporter};
use crate::error::{Result, UpdateError};
use crate::model::{AppInfo, CheckRequest, InstallContext, NetworkCondition, UpdateDescriptor};
use crate::strategy::Plan;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fetches the raw check response from the update endpoint
#[async_trait]
pub trait CheckWorker: Send + Sync {
    async fn fetch(&self, request: &CheckRequest) -> Result<String>;
}

/// Turns the raw check response into a descriptor
pub trait UpdateParser: Send + Sync {
    fn parse(&self, raw: &str) -> Result<UpdateDescriptor>;
}

/// Decides whether a descriptor is newer than the running application
pub trait UpdateChecker: Send + Sync {
    fn is_newer(&self, app: &AppInfo, update: &UpdateDescriptor) -> Result<bool>;
}

/// Fetches the update artifact into `target`, reporting progress as it goes
#[async_trait]
pub trait DownloadWorker: Send + Sync {
    async fn download(&self, url: &str, target: &Path, progress: ProgressReporter) -> Result<()>;
}

/// Chooses the local file an update is downloaded to
pub trait FileCreator: Send + Sync {
    fn create(&self, update: &UpdateDescriptor) -> Result<PathBuf>;
}

/// Verifies a downloaded artifact before it can reach the installer
pub trait FileChecker: Send + Sync {
    fn check(&self, update: &UpdateDescriptor, file: &Path) -> Result<()>;
}

/// Hands a verified artifact to the platform install mechanism
pub trait InstallStrategy: Send + Sync {
    fn install(
        &self,
        context: &InstallContext,
        file: &Path,
        update: &UpdateDescriptor,
    ) -> Result<()>;
}

/// Presents an available update and resolves the decision handle
pub trait UpdateCreator: Send + Sync {
    fn create(&self, update: &UpdateDescriptor, decision: Decision);
}

/// Presents a verified download before install and resolves the decision handle
pub trait InstallCreator: Send + Sync {
    fn create(&self, update: &UpdateDescriptor, file: &Path, decision: Decision);
}

/// Supplies an extra observer for download progress (typically a progress UI)
pub trait DownloadCreator: Send + Sync {
    fn create(&self, update: &UpdateDescriptor) -> Option<Arc<dyn DownloadCallback>>;
}

/// Reports the current network condition
pub trait NetworkMonitor: Send + Sync {
    fn condition(&self) -> NetworkCondition;
}

/// Set of version codes the user dismissed
pub trait IgnoreStore: Send + Sync {
    fn is_ignored(&self, version_code: u32) -> bool;

    fn add(&self, version_code: u32) -> Result<()>;
}

/// Policy deciding whether and how a non-mandatory update proceeds
pub trait UpdateStrategy: Send + Sync {
    fn decide(&self, update: &UpdateDescriptor, network: NetworkCondition) -> Plan;

    /// Strategy name for logging
    fn name(&self) -> &str;
}

/// Observer of the check phase. Every method defaults to a no-op.
pub trait CheckCallback: Send + Sync {
    fn on_check_start(&self) {}

    /// `None` means the endpoint offered nothing newer
    fn on_check_result(&self, _update: Option<&UpdateDescriptor>) {}

    fn on_check_ignore(&self, _update: &UpdateDescriptor) {}

    fn on_user_cancel(&self) {}

    fn on_check_error(&self, _error: &UpdateError) {}
}

/// Observer of the download phase. Every method defaults to a no-op.
pub trait DownloadCallback: Send + Sync {
    fn on_download_start(&self) {}

    fn on_download_progress(&self, _done: u64, _total: Option<u64>) {}

    fn on_download_complete(&self, _file: &Path) {}

    fn on_download_error(&self, _error: &UpdateError) {}
}
