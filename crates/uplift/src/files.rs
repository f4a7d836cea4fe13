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

//! Download targets and SHA256 verification

use crate::error::{Result, UpdateError};
use crate::model::UpdateDescriptor;
use crate::traits::{FileChecker, FileCreator};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;

const FALLBACK_FILE_NAME: &str = "update.bin";

/// Places downloads in a cache directory, one file per version
#[derive(Debug, Clone)]
pub struct CacheFileCreator {
    dir: PathBuf,
}

impl CacheFileCreator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Default for CacheFileCreator {
    fn default() -> Self {
        Self::new(std::env::temp_dir().join("uplift"))
    }
}

impl FileCreator for CacheFileCreator {
    fn create(&self, update: &UpdateDescriptor) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let name = file_name_from_url(&update.download_url);
        Ok(self.dir.join(format!("v{}-{name}", update.version_code)))
    }
}

/// Last path segment of a URL, without query or fragment
fn file_name_from_url(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let name = path.rsplit('/').next().unwrap_or_default();
    if name.is_empty() || name.contains(':') {
        FALLBACK_FILE_NAME
    } else {
        name
    }
}

/// Streaming SHA256 of a file, lowercase hex
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Compares the file's SHA256 with the descriptor checksum.
///
/// Without a checksum only presence and a non-zero size are checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256FileChecker;

impl FileChecker for Sha256FileChecker {
    fn check(&self, update: &UpdateDescriptor, file: &Path) -> Result<()> {
        let metadata = std::fs::metadata(file).map_err(|e| {
            UpdateError::Verification(format!("cannot read {}: {e}", file.display()))
        })?;

        if !metadata.is_file() || metadata.len() == 0 {
            return Err(UpdateError::Verification(format!(
                "{} is empty or not a file",
                file.display()
            )));
        }

        let Some(expected) = update.checksum.as_deref() else {
            debug!(
                "No checksum for version {}, accepting {}",
                update.version_code,
                file.display()
            );
            return Ok(());
        };

        let expected = expected.trim().to_lowercase();
        let actual = sha256_file(file)?;
        if actual != expected {
            return Err(UpdateError::ChecksumMismatch { expected, actual });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn descriptor(checksum: Option<String>) -> UpdateDescriptor {
        UpdateDescriptor {
            version_code: 7,
            version_name: "1.0.7".to_owned(),
            download_url: "https://example.com/releases/app-1.0.7.tar.gz?token=abc".to_owned(),
            is_mandatory: false,
            release_notes: String::new(),
            checksum,
        }
    }

    fn hex_sha256(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url("https://example.com/a/app.bin?x=1#frag"),
            "app.bin"
        );
        assert_eq!(
            file_name_from_url("https://example.com/"),
            FALLBACK_FILE_NAME
        );
        assert_eq!(file_name_from_url("https:"), FALLBACK_FILE_NAME);
    }

    #[test]
    fn test_cache_file_creator() {
        let dir = TempDir::new().unwrap();
        let creator = CacheFileCreator::new(dir.path().join("cache"));

        let path = creator.create(&descriptor(None)).unwrap();
        assert_eq!(path, dir.path().join("cache").join("v7-app-1.0.7.tar.gz"));
        assert!(creator.dir().is_dir());
    }

    #[test]
    fn test_checksum_match() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artifact");
        std::fs::write(&path, b"payload").unwrap();

        let update = descriptor(Some(hex_sha256(b"payload").to_uppercase()));
        assert!(Sha256FileChecker.check(&update, &path).is_ok());
        assert_eq!(sha256_file(&path).unwrap(), hex_sha256(b"payload"));
    }

    #[test]
    fn test_checksum_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artifact");
        std::fs::write(&path, b"tampered").unwrap();

        let update = descriptor(Some(hex_sha256(b"payload")));
        let err = Sha256FileChecker.check(&update, &path).unwrap_err();
        assert!(matches!(err, UpdateError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_missing_or_empty_file_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            Sha256FileChecker.check(&descriptor(None), &missing),
            Err(UpdateError::Verification(_))
        ));

        let empty = dir.path().join("empty");
        std::fs::write(&empty, b"").unwrap();
        assert!(matches!(
            Sha256FileChecker.check(&descriptor(None), &empty),
            Err(UpdateError::Verification(_))
        ));
    }

    #[test]
    fn test_no_checksum_accepts_present_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("artifact");
        std::fs::write(&path, b"anything").unwrap();
        assert!(Sha256FileChecker.check(&descriptor(None), &path).is_ok());
    }
}
