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

//! Uplift - Client-side self-update orchestrator
//!
//! A task checks a remote endpoint for a newer version, lets a strategy decide
//! whether to proceed, downloads and verifies the artifact, and hands it to an
//! install strategy. Every step is a pluggable adapter resolved through
//! [`TaskConfig`] and [`ConfigStore`].

pub mod callbacks;
pub mod config;
pub mod decision;
pub mod error;
pub mod files;
pub mod http;
pub mod ignore;
pub mod install;
pub mod model;
pub mod parser;
pub mod settings;
pub mod strategy;
pub mod task;
pub mod traits;
pub mod version;

pub use callbacks::{AutoConfirm, DeclineCreator, LogCallback, NoProgressUi};
pub use config::{ConfigStore, OptionKind, TaskConfig};
pub use decision::{Decision, Progress, ProgressReporter, UserChoice};
pub use error::{ErrorKind, Result, UpdateError};
pub use ignore::IgnoreList;
pub use model::{
    AppInfo, CheckRequest, HttpMethod, InstallContext, NetworkCondition, UpdateDescriptor,
};
pub use parser::JsonUpdateParser;
pub use settings::{UpliftSettings, load_settings, save_settings};
pub use strategy::{Action, DenyReason, Plan, StrategyEngine};
pub use task::{TaskOutcome, TaskState, UpdateHandle};
pub use version::{VersionCodeChecker, VersionNameChecker, is_newer, parse_version};
