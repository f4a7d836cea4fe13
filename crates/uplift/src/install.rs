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

//! Default install strategy: swap the running executable for the download

use crate::error::{Result, UpdateError};
use crate::model::{InstallContext, UpdateDescriptor};
use crate::traits::InstallStrategy;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::info;

/// Copies the verified artifact next to the application executable, marks it
/// executable and renames it over the running one. The new version takes effect
/// on the next start.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplaceExecutable;

fn staging_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(".new");
    PathBuf::from(name)
}

impl InstallStrategy for ReplaceExecutable {
    fn install(
        &self,
        context: &InstallContext,
        file: &Path,
        update: &UpdateDescriptor,
    ) -> Result<()> {
        let target = &context.app.executable;
        let staged = staging_path(target);

        std::fs::copy(file, &staged).map_err(|e| {
            UpdateError::Install(format!("Failed to stage {}: {e}", staged.display()))
        })?;

        // Make executable
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&staged)?.permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&staged, perms)?;
        }

        if let Err(e) = std::fs::rename(&staged, target) {
            let _ = std::fs::remove_file(&staged);
            return Err(UpdateError::Install(format!(
                "Failed to replace {}: {e}",
                target.display()
            )));
        }

        info!(
            "Installed {} {} over {}",
            context.app.name,
            update.version_name,
            target.display()
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AppInfo;
    use tempfile::TempDir;

    fn descriptor() -> UpdateDescriptor {
        UpdateDescriptor {
            version_code: 2,
            version_name: "0.0.2".to_owned(),
            download_url: "https://example.com/app".to_owned(),
            is_mandatory: false,
            release_notes: String::new(),
            checksum: None,
        }
    }

    #[test]
    fn test_replace_executable() {
        let dir = TempDir::new().unwrap();
        let exe = dir.path().join("app");
        let download = dir.path().join("download");
        std::fs::write(&exe, b"old").unwrap();
        std::fs::write(&download, b"new").unwrap();

        let context = InstallContext {
            app: AppInfo::new("app", 1, "0.0.1").with_executable(&exe),
        };
        ReplaceExecutable
            .install(&context, &download, &descriptor())
            .unwrap();

        assert_eq!(std::fs::read(&exe).unwrap(), b"new");
        assert!(!staging_path(&exe).exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&exe).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[test]
    fn test_missing_download_is_install_error() {
        let dir = TempDir::new().unwrap();
        let context = InstallContext {
            app: AppInfo::new("app", 1, "0.0.1")
                .with_executable(dir.path().join("app")),
        };

        let err = ReplaceExecutable
            .install(&context, &dir.path().join("nope"), &descriptor())
            .unwrap_err();
        assert!(matches!(err, UpdateError::Install(_)));
    }

    #[test]
    fn test_staging_path_appends_suffix() {
        assert_eq!(
            staging_path(Path::new("/opt/app/bin.v1")),
            PathBuf::from("/opt/app/bin.v1.new")
        );
    }
}
