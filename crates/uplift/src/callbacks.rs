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

//! Built-in observers and prompt adapters

use crate::decision::Decision;
use crate::error::UpdateError;
use crate::model::UpdateDescriptor;
use crate::traits::{
    CheckCallback, DownloadCallback, DownloadCreator, InstallCreator, UpdateCreator,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Reports every event through `tracing`; the default check and download callback
#[derive(Debug, Clone, Copy, Default)]
pub struct LogCallback;

impl CheckCallback for LogCallback {
    fn on_check_start(&self) {
        info!("Checking for updates");
    }

    fn on_check_result(&self, update: Option<&UpdateDescriptor>) {
        match update {
            Some(update) => info!(
                "Update available: {} (code {}, mandatory={})",
                update.version_name, update.version_code, update.is_mandatory
            ),
            None => info!("No update available"),
        }
    }

    fn on_check_ignore(&self, update: &UpdateDescriptor) {
        info!("Update {} ignored", update.version_name);
    }

    fn on_user_cancel(&self) {
        info!("Update cancelled by user");
    }

    fn on_check_error(&self, error: &UpdateError) {
        error!("Update check failed: {error}");
    }
}

impl DownloadCallback for LogCallback {
    fn on_download_start(&self) {
        info!("Download started");
    }

    fn on_download_progress(&self, done: u64, total: Option<u64>) {
        match total {
            Some(total) => debug!("Downloaded {done}/{total} bytes"),
            None => debug!("Downloaded {done} bytes"),
        }
    }

    fn on_download_complete(&self, file: &Path) {
        info!("Download complete: {}", file.display());
    }

    fn on_download_error(&self, error: &UpdateError) {
        error!("Download failed: {error}");
    }
}

/// Prompt adapter that declines every prompt; the default when no UI is attached
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclineCreator;

impl UpdateCreator for DeclineCreator {
    fn create(&self, update: &UpdateDescriptor, decision: Decision) {
        warn!(
            "Update {} needs confirmation but no prompt is configured, declining",
            update.version_name
        );
        decision.cancel();
    }
}

impl InstallCreator for DeclineCreator {
    fn create(&self, update: &UpdateDescriptor, file: &Path, decision: Decision) {
        warn!(
            "Install of {} from {} needs confirmation but no prompt is configured, declining",
            update.version_name,
            file.display()
        );
        decision.cancel();
    }
}

/// Prompt adapter that accepts every prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl UpdateCreator for AutoConfirm {
    fn create(&self, update: &UpdateDescriptor, decision: Decision) {
        debug!("Auto-confirming download of {}", update.version_name);
        decision.proceed();
    }
}

impl InstallCreator for AutoConfirm {
    fn create(&self, update: &UpdateDescriptor, _file: &Path, decision: Decision) {
        debug!("Auto-confirming install of {}", update.version_name);
        decision.proceed();
    }
}

/// No progress UI
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgressUi;

impl DownloadCreator for NoProgressUi {
    fn create(&self, _update: &UpdateDescriptor) -> Option<Arc<dyn DownloadCallback>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::UserChoice;

    fn descriptor() -> UpdateDescriptor {
        UpdateDescriptor {
            version_code: 1,
            version_name: "0.0.1".to_owned(),
            download_url: "https://example.com/app".to_owned(),
            is_mandatory: false,
            release_notes: String::new(),
            checksum: None,
        }
    }

    #[tokio::test]
    async fn test_decline_creator_cancels_both_prompts() {
        let (decision, rx) = Decision::channel();
        UpdateCreator::create(&DeclineCreator, &descriptor(), decision);
        assert_eq!(rx.await.unwrap(), UserChoice::Cancel);

        let (decision, rx) = Decision::channel();
        let file = Path::new("/tmp/x");
        InstallCreator::create(&DeclineCreator, &descriptor(), file, decision);
        assert_eq!(rx.await.unwrap(), UserChoice::Cancel);
    }

    #[tokio::test]
    async fn test_auto_confirm_proceeds() {
        let (decision, rx) = Decision::channel();
        UpdateCreator::create(&AutoConfirm, &descriptor(), decision);
        assert_eq!(rx.await.unwrap(), UserChoice::Proceed);
    }

    #[test]
    fn test_no_progress_ui() {
        assert!(NoProgressUi.create(&descriptor()).is_none());
    }
}
