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

//! Error types for the update orchestrator

use crate::task::TaskState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("post-download verification failed: {0}")]
    Verification(String),

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("install failed: {0}")]
    Install(String),

    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition { from: TaskState, to: TaskState },

    #[error("background task failed: {0}")]
    Task(String),

    #[error("version parse error: {0}")]
    VersionParse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used when reporting failures to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transport,
    Parse,
    Verification,
    Install,
    Internal,
}

impl UpdateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Parse(_) | Self::Json(_) | Self::VersionParse(_) => ErrorKind::Parse,
            Self::Verification(_) | Self::ChecksumMismatch { .. } => ErrorKind::Verification,
            Self::Install(_) => ErrorKind::Install,
            Self::InvalidTransition { .. } | Self::Task(_) | Self::Io(_) => ErrorKind::Internal,
        }
    }

    /// Rewrap any failure raised while checking a downloaded file
    pub(crate) fn into_verification(self) -> Self {
        match self {
            Self::Verification(_) => self,
            other => Self::Verification(other.to_string()),
        }
    }

    pub(crate) fn into_install(self) -> Self {
        match self {
            Self::Install(_) => self,
            other => Self::Install(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, UpdateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            UpdateError::Configuration("missing endpoint".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            UpdateError::ChecksumMismatch {
                expected: "aa".to_owned(),
                actual: "bb".to_owned(),
            }
            .kind(),
            ErrorKind::Verification
        );
        assert_eq!(
            UpdateError::VersionParse("x".to_owned()).kind(),
            ErrorKind::Parse
        );
    }

    #[test]
    fn test_into_verification_keeps_single_prefix() {
        let err = UpdateError::Verification("bad size".into()).into_verification();
        assert_eq!(
            err.to_string(),
            "post-download verification failed: bad size"
        );

        let err = UpdateError::ChecksumMismatch {
            expected: "aa".to_owned(),
            actual: "bb".to_owned(),
        }
        .into_verification();
        assert_eq!(
            err.to_string(),
            "post-download verification failed: checksum mismatch: expected aa, got bb"
        );
    }

    #[test]
    fn test_into_install_wraps_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = UpdateError::from(io).into_install();
        assert!(matches!(err, UpdateError::Install(_)));
        assert_eq!(err.kind(), ErrorKind::Install);
    }
}
