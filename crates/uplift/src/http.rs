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

//! reqwest-based check and download workers

use crate::decision::ProgressReporter;
use crate::error::{Result, UpdateError};
use crate::model::{CheckRequest, HttpMethod};
use crate::traits::{CheckWorker, DownloadWorker};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

pub const USER_AGENT: &str = concat!("uplift/", env!("CARGO_PKG_VERSION"));

fn build_client(user_agent: &str, timeout: Option<Duration>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder().user_agent(user_agent);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().unwrap_or_else(|e| {
        warn!("Failed to build configured HTTP client, using defaults: {e}");
        reqwest::Client::new()
    })
}

/// Issues the check request and returns the response body
#[derive(Debug, Clone)]
pub struct HttpCheckWorker {
    client: reqwest::Client,
}

impl HttpCheckWorker {
    pub fn new() -> Self {
        Self::with_client(build_client(USER_AGENT, None))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn with_options(user_agent: &str, timeout: Duration) -> Self {
        Self::with_client(build_client(user_agent, Some(timeout)))
    }
}

impl Default for HttpCheckWorker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CheckWorker for HttpCheckWorker {
    async fn fetch(&self, request: &CheckRequest) -> Result<String> {
        let builder = match request.method() {
            HttpMethod::Get => self.client.get(request.url()).query(request.params()),
            HttpMethod::Post => self.client.post(request.url()).form(request.params()),
        };

        debug!("Checking for updates at {}", request.url());

        let response = builder
            .send()
            .await
            .map_err(|e| UpdateError::Transport(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_owned());
            return Err(UpdateError::Transport(format!(
                "Check endpoint returned {status}: {body}"
            )));
        }

        response
            .text()
            .await
            .map_err(|e| UpdateError::Transport(format!("Failed to read response: {e}")))
    }
}

/// Streams the artifact to `<target>.part` and renames it into place
#[derive(Debug, Clone)]
pub struct HttpDownloadWorker {
    client: reqwest::Client,
}

impl HttpDownloadWorker {
    pub fn new() -> Self {
        Self::with_client(build_client(USER_AGENT, None))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn with_user_agent(user_agent: &str) -> Self {
        Self::with_client(build_client(user_agent, None))
    }
}

impl Default for HttpDownloadWorker {
    fn default() -> Self {
        Self::new()
    }
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

#[async_trait]
impl DownloadWorker for HttpDownloadWorker {
    async fn download(&self, url: &str, target: &Path, progress: ProgressReporter) -> Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpdateError::Transport(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(UpdateError::Transport(format!(
                "Download failed with status: {}",
                response.status()
            )));
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let total = response.content_length();
        let temp_path = partial_path(target);
        let mut file = tokio::fs::File::create(&temp_path).await?;
        let mut stream = response.bytes_stream();
        let mut done = 0_u64;

        progress.report(done, total);

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(file);
                    let _ = tokio::fs::remove_file(&temp_path).await;
                    return Err(UpdateError::Transport(format!(
                        "Failed to download bytes: {e}"
                    )));
                }
            };
            file.write_all(&chunk).await?;
            done += chunk.len() as u64;
            progress.report(done, total);
        }

        file.flush().await?;
        drop(file);
        tokio::fs::rename(&temp_path, target).await?;

        debug!("Downloaded {done} bytes to {}", target.display());
        Ok(())
    }
}
