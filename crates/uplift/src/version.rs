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

//! Version parsing and "is this newer" checkers

use crate::error::{Result, UpdateError};
use crate::model::{AppInfo, UpdateDescriptor};
use crate::traits::UpdateChecker;

/// Parse semver-like version strings (e.g., "1.4.2", "v1.4.2")
pub fn parse_version(s: &str) -> Result<(u32, u32, u32)> {
    let s = s.trim().trim_start_matches(['v', 'V']);
    let parts: Vec<&str> = s.split('.').collect();

    let [major, minor, patch] = parts.as_slice() else {
        return Err(UpdateError::VersionParse(format!(
            "{s:?} is not a MAJOR.MINOR.PATCH version"
        )));
    };

    let parse = |part: &str, label: &str| {
        part.parse::<u32>()
            .map_err(|_| UpdateError::VersionParse(format!("Invalid {label} version: {part}")))
    };

    Ok((
        parse(*major, "major")?,
        parse(*minor, "minor")?,
        parse(*patch, "patch")?,
    ))
}

/// Returns true if `remote` is newer than `local`
pub fn is_newer(local: &str, remote: &str) -> Result<bool> {
    Ok(parse_version(remote)? > parse_version(local)?)
}

/// Compares build numbers; the default checker
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionCodeChecker;

impl UpdateChecker for VersionCodeChecker {
    fn is_newer(&self, app: &AppInfo, update: &UpdateDescriptor) -> Result<bool> {
        Ok(update.version_code > app.version_code)
    }
}

/// Compares dotted version names instead of build numbers
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionNameChecker;

impl UpdateChecker for VersionNameChecker {
    fn is_newer(&self, app: &AppInfo, update: &UpdateDescriptor) -> Result<bool> {
        is_newer(&app.version_name, &update.version_name)
    }
}
