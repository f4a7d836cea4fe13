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

//! JSON update descriptor parser

use crate::error::{Result, UpdateError};
use crate::model::UpdateDescriptor;
use crate::traits::UpdateParser;

/// Parses a check response that is a JSON [`UpdateDescriptor`] document
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonUpdateParser;

impl UpdateParser for JsonUpdateParser {
    fn parse(&self, raw: &str) -> Result<UpdateDescriptor> {
        let update: UpdateDescriptor = serde_json::from_str(raw)
            .map_err(|e| UpdateError::Parse(format!("Failed to parse update response: {e}")))?;

        if update.download_url.trim().is_empty() {
            return Err(UpdateError::Parse(
                "update response has an empty download url".to_owned(),
            ));
        }

        Ok(update)
    }
}
