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

//! Configuration resolution.
//!
//! Every option resolves in the same order: the value set on the
//! [`TaskConfig`], then the value set on its backing [`ConfigStore`], then
//! the store's built-in default, which is created on first use and cached for
//! the lifetime of the store. The check request and the update parser have no
//! built-in default.

use crate::callbacks::{DeclineCreator, LogCallback, NoProgressUi};
use crate::error::{Result, UpdateError};
use crate::files::{CacheFileCreator, Sha256FileChecker};
use crate::http::{HttpCheckWorker, HttpDownloadWorker};
use crate::ignore::IgnoreList;
use crate::install::ReplaceExecutable;
use crate::model::{AppInfo, CheckRequest};
use crate::strategy::{FixedNetwork, WifiFirstStrategy};
use crate::task::{self, UpdateHandle};
use crate::traits::{
    CheckCallback, CheckWorker, DownloadCallback, DownloadCreator, DownloadWorker, FileChecker,
    FileCreator, IgnoreStore, InstallCreator, InstallStrategy, NetworkMonitor, UpdateChecker,
    UpdateCreator, UpdateParser, UpdateStrategy,
};
use crate::version::VersionCodeChecker;
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio::runtime::Handle;
use tracing::{trace, warn};

static GLOBAL: OnceLock<Arc<ConfigStore>> = OnceLock::new();

/// Every configurable option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    CheckRequest,
    UpdateParser,
    CheckWorker,
    DownloadWorker,
    CheckCallback,
    DownloadCallback,
    UpdateStrategy,
    UpdateCreator,
    InstallCreator,
    DownloadCreator,
    FileCreator,
    UpdateChecker,
    FileChecker,
    InstallStrategy,
    NetworkMonitor,
    IgnoreStore,
    AppInfo,
}

impl OptionKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CheckRequest => "check_request",
            Self::UpdateParser => "update_parser",
            Self::CheckWorker => "check_worker",
            Self::DownloadWorker => "download_worker",
            Self::CheckCallback => "check_callback",
            Self::DownloadCallback => "download_callback",
            Self::UpdateStrategy => "update_strategy",
            Self::UpdateCreator => "update_creator",
            Self::InstallCreator => "install_creator",
            Self::DownloadCreator => "download_creator",
            Self::FileCreator => "file_creator",
            Self::UpdateChecker => "update_checker",
            Self::FileChecker => "file_checker",
            Self::InstallStrategy => "install_strategy",
            Self::NetworkMonitor => "network_monitor",
            Self::IgnoreStore => "ignore_store",
            Self::AppInfo => "app_info",
        }
    }

    /// False for the application-specific options that must be set explicitly
    pub fn has_default(&self) -> bool {
        !matches!(self, Self::CheckRequest | Self::UpdateParser)
    }

    fn missing_error(self) -> UpdateError {
        let message = match self {
            Self::CheckRequest => "missing endpoint".to_owned(),
            Self::UpdateParser => "missing parser".to_owned(),
            other => format!("missing {}", other.name()),
        };
        UpdateError::Configuration(message)
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared, lazily populated value of one option in a store
struct Slot<T: ?Sized> {
    value: RwLock<Option<Arc<T>>>,
}

impl<T: ?Sized> Default for Slot<T> {
    fn default() -> Self {
        Self {
            value: RwLock::new(None),
        }
    }
}

impl<T: ?Sized> Slot<T> {
    /// Replace the value. Tasks already running keep the one they resolved.
    fn set(&self, kind: OptionKind, value: Arc<T>) {
        if self.value.write().replace(value).is_some() {
            warn!("Replacing {kind}, set or defaulted earlier");
        }
    }

    fn get(&self) -> Option<Arc<T>> {
        self.value.read().clone()
    }

    fn is_set(&self) -> bool {
        self.value.read().is_some()
    }

    fn get_or_init(&self, init: impl FnOnce() -> Arc<T>) -> Arc<T> {
        if let Some(value) = self.value.read().as_ref() {
            return Arc::clone(value);
        }
        let mut guard = self.value.write();
        Arc::clone(guard.get_or_insert_with(init))
    }
}

/// Store value of an option with a built-in default, creating the default once
fn resolve<T: ?Sized>(
    kind: OptionKind,
    shared: &Slot<T>,
    default: impl FnOnce() -> Arc<T>,
) -> Arc<T> {
    shared.get_or_init(|| {
        trace!("Creating default {kind}");
        default()
    })
}

/// Resolution for options without a default
fn require<T: ?Sized>(
    kind: OptionKind,
    local: Option<&Arc<T>>,
    shared: &Slot<T>,
) -> Result<Arc<T>> {
    local
        .cloned()
        .or_else(|| shared.get())
        .ok_or_else(|| kind.missing_error())
}

/// Named set of update options shared by every task created from it.
///
/// [`ConfigStore::global`] is the process-wide store; [`ConfigStore::create`]
/// returns an isolated one, e.g. for a second update flow with its own
/// endpoint in the same process.
///
/// The setters are meant for setup before the first task starts. Setting an
/// option that already has a value, including a default created by an
/// earlier lookup, replaces it and logs a warning.
#[derive(Default)]
pub struct ConfigStore {
    check_request: Slot<CheckRequest>,
    update_parser: Slot<dyn UpdateParser>,
    check_worker: Slot<dyn CheckWorker>,
    download_worker: Slot<dyn DownloadWorker>,
    check_callback: Slot<dyn CheckCallback>,
    download_callback: Slot<dyn DownloadCallback>,
    update_strategy: Slot<dyn UpdateStrategy>,
    update_creator: Slot<dyn UpdateCreator>,
    install_creator: Slot<dyn InstallCreator>,
    download_creator: Slot<dyn DownloadCreator>,
    file_creator: Slot<dyn FileCreator>,
    update_checker: Slot<dyn UpdateChecker>,
    file_checker: Slot<dyn FileChecker>,
    install_strategy: Slot<dyn InstallStrategy>,
    network_monitor: Slot<dyn NetworkMonitor>,
    ignore_store: Slot<dyn IgnoreStore>,
    app_info: Slot<AppInfo>,
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("check_request", &self.check_request.get())
            .field("update_parser_set", &self.update_parser.is_set())
            .field("app_info", &self.app_info.get())
            .finish_non_exhaustive()
    }
}

impl ConfigStore {
    /// The process-wide store, created on first use
    pub fn global() -> Arc<ConfigStore> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::default())))
    }

    /// A new store isolated from the global one
    pub fn create() -> Arc<ConfigStore> {
        Arc::new(Self::default())
    }

    /// Shorthand for a GET check request without parameters
    pub fn set_url(&self, url: impl Into<String>) -> &Self {
        self.set_check_request(CheckRequest::get(url))
    }

    pub fn set_check_request(&self, request: CheckRequest) -> &Self {
        self.check_request.set(OptionKind::CheckRequest, Arc::new(request));
        self
    }

    pub fn set_update_parser(&self, parser: Arc<dyn UpdateParser>) -> &Self {
        self.update_parser.set(OptionKind::UpdateParser, parser);
        self
    }

    pub fn set_check_worker(&self, worker: Arc<dyn CheckWorker>) -> &Self {
        self.check_worker.set(OptionKind::CheckWorker, worker);
        self
    }

    pub fn set_download_worker(&self, worker: Arc<dyn DownloadWorker>) -> &Self {
        self.download_worker.set(OptionKind::DownloadWorker, worker);
        self
    }

    pub fn set_check_callback(&self, callback: Arc<dyn CheckCallback>) -> &Self {
        self.check_callback.set(OptionKind::CheckCallback, callback);
        self
    }

    pub fn set_download_callback(&self, callback: Arc<dyn DownloadCallback>) -> &Self {
        self.download_callback.set(OptionKind::DownloadCallback, callback);
        self
    }

    pub fn set_update_strategy(&self, strategy: Arc<dyn UpdateStrategy>) -> &Self {
        self.update_strategy.set(OptionKind::UpdateStrategy, strategy);
        self
    }

    pub fn set_update_creator(&self, creator: Arc<dyn UpdateCreator>) -> &Self {
        self.update_creator.set(OptionKind::UpdateCreator, creator);
        self
    }

    pub fn set_install_creator(&self, creator: Arc<dyn InstallCreator>) -> &Self {
        self.install_creator.set(OptionKind::InstallCreator, creator);
        self
    }

    pub fn set_download_creator(&self, creator: Arc<dyn DownloadCreator>) -> &Self {
        self.download_creator.set(OptionKind::DownloadCreator, creator);
        self
    }

    pub fn set_file_creator(&self, creator: Arc<dyn FileCreator>) -> &Self {
        self.file_creator.set(OptionKind::FileCreator, creator);
        self
    }

    pub fn set_update_checker(&self, checker: Arc<dyn UpdateChecker>) -> &Self {
        self.update_checker.set(OptionKind::UpdateChecker, checker);
        self
    }

    pub fn set_file_checker(&self, checker: Arc<dyn FileChecker>) -> &Self {
        self.file_checker.set(OptionKind::FileChecker, checker);
        self
    }

    pub fn set_install_strategy(&self, strategy: Arc<dyn InstallStrategy>) -> &Self {
        self.install_strategy.set(OptionKind::InstallStrategy, strategy);
        self
    }

    pub fn set_network_monitor(&self, monitor: Arc<dyn NetworkMonitor>) -> &Self {
        self.network_monitor.set(OptionKind::NetworkMonitor, monitor);
        self
    }

    pub fn set_ignore_store(&self, store: Arc<dyn IgnoreStore>) -> &Self {
        self.ignore_store.set(OptionKind::IgnoreStore, store);
        self
    }

    pub fn set_app_info(&self, app: AppInfo) -> &Self {
        self.app_info.set(OptionKind::AppInfo, Arc::new(app));
        self
    }

    /// Whether the option has a value, set explicitly or defaulted by an earlier lookup
    pub fn is_populated(&self, kind: OptionKind) -> bool {
        match kind {
            OptionKind::CheckRequest => self.check_request.is_set(),
            OptionKind::UpdateParser => self.update_parser.is_set(),
            OptionKind::CheckWorker => self.check_worker.is_set(),
            OptionKind::DownloadWorker => self.download_worker.is_set(),
            OptionKind::CheckCallback => self.check_callback.is_set(),
            OptionKind::DownloadCallback => self.download_callback.is_set(),
            OptionKind::UpdateStrategy => self.update_strategy.is_set(),
            OptionKind::UpdateCreator => self.update_creator.is_set(),
            OptionKind::InstallCreator => self.install_creator.is_set(),
            OptionKind::DownloadCreator => self.download_creator.is_set(),
            OptionKind::FileCreator => self.file_creator.is_set(),
            OptionKind::UpdateChecker => self.update_checker.is_set(),
            OptionKind::FileChecker => self.file_checker.is_set(),
            OptionKind::InstallStrategy => self.install_strategy.is_set(),
            OptionKind::NetworkMonitor => self.network_monitor.is_set(),
            OptionKind::IgnoreStore => self.ignore_store.is_set(),
            OptionKind::AppInfo => self.app_info.is_set(),
        }
    }

    pub fn check_request(&self) -> Result<Arc<CheckRequest>> {
        let request = require(OptionKind::CheckRequest, None, &self.check_request)?;
        request.validate()?;
        Ok(request)
    }

    pub fn update_parser(&self) -> Result<Arc<dyn UpdateParser>> {
        require(OptionKind::UpdateParser, None, &self.update_parser)
    }

    pub fn check_worker(&self) -> Arc<dyn CheckWorker> {
        resolve(OptionKind::CheckWorker, &self.check_worker, || {
            Arc::new(HttpCheckWorker::new())
        })
    }

    pub fn download_worker(&self) -> Arc<dyn DownloadWorker> {
        resolve(OptionKind::DownloadWorker, &self.download_worker, || {
            Arc::new(HttpDownloadWorker::new())
        })
    }

    pub fn check_callback(&self) -> Arc<dyn CheckCallback> {
        resolve(OptionKind::CheckCallback, &self.check_callback, || {
            Arc::new(LogCallback)
        })
    }

    pub fn download_callback(&self) -> Arc<dyn DownloadCallback> {
        resolve(OptionKind::DownloadCallback, &self.download_callback, || {
            Arc::new(LogCallback)
        })
    }

    pub fn update_strategy(&self) -> Arc<dyn UpdateStrategy> {
        resolve(OptionKind::UpdateStrategy, &self.update_strategy, || {
            Arc::new(WifiFirstStrategy)
        })
    }

    pub fn update_creator(&self) -> Arc<dyn UpdateCreator> {
        resolve(OptionKind::UpdateCreator, &self.update_creator, || {
            Arc::new(DeclineCreator)
        })
    }

    pub fn install_creator(&self) -> Arc<dyn InstallCreator> {
        resolve(OptionKind::InstallCreator, &self.install_creator, || {
            Arc::new(DeclineCreator)
        })
    }

    pub fn download_creator(&self) -> Arc<dyn DownloadCreator> {
        resolve(OptionKind::DownloadCreator, &self.download_creator, || {
            Arc::new(NoProgressUi)
        })
    }

    pub fn file_creator(&self) -> Arc<dyn FileCreator> {
        resolve(OptionKind::FileCreator, &self.file_creator, || {
            Arc::new(CacheFileCreator::default())
        })
    }

    pub fn update_checker(&self) -> Arc<dyn UpdateChecker> {
        resolve(OptionKind::UpdateChecker, &self.update_checker, || {
            Arc::new(VersionCodeChecker)
        })
    }

    pub fn file_checker(&self) -> Arc<dyn FileChecker> {
        resolve(OptionKind::FileChecker, &self.file_checker, || {
            Arc::new(Sha256FileChecker)
        })
    }

    pub fn install_strategy(&self) -> Arc<dyn InstallStrategy> {
        resolve(OptionKind::InstallStrategy, &self.install_strategy, || {
            Arc::new(ReplaceExecutable)
        })
    }

    pub fn network_monitor(&self) -> Arc<dyn NetworkMonitor> {
        resolve(OptionKind::NetworkMonitor, &self.network_monitor, || {
            Arc::new(FixedNetwork::default())
        })
    }

    pub fn ignore_store(&self) -> Arc<dyn IgnoreStore> {
        resolve(OptionKind::IgnoreStore, &self.ignore_store, || {
            IgnoreList::global()
        })
    }

    pub fn app_info(&self) -> Arc<AppInfo> {
        resolve(OptionKind::AppInfo, &self.app_info, || {
            Arc::new(AppInfo::current())
        })
    }
}

/// Per-task overlay on a [`ConfigStore`].
///
/// Unset options fall through to the store. Start the task with
/// [`TaskConfig::check`].
#[derive(Clone)]
pub struct TaskConfig {
    store: Arc<ConfigStore>,
    runtime: Option<Handle>,
    check_request: Option<Arc<CheckRequest>>,
    update_parser: Option<Arc<dyn UpdateParser>>,
    check_worker: Option<Arc<dyn CheckWorker>>,
    download_worker: Option<Arc<dyn DownloadWorker>>,
    check_callback: Option<Arc<dyn CheckCallback>>,
    download_callback: Option<Arc<dyn DownloadCallback>>,
    update_strategy: Option<Arc<dyn UpdateStrategy>>,
    update_creator: Option<Arc<dyn UpdateCreator>>,
    install_creator: Option<Arc<dyn InstallCreator>>,
    download_creator: Option<Arc<dyn DownloadCreator>>,
    file_creator: Option<Arc<dyn FileCreator>>,
    update_checker: Option<Arc<dyn UpdateChecker>>,
    file_checker: Option<Arc<dyn FileChecker>>,
    install_strategy: Option<Arc<dyn InstallStrategy>>,
    network_monitor: Option<Arc<dyn NetworkMonitor>>,
    ignore_store: Option<Arc<dyn IgnoreStore>>,
    app_info: Option<Arc<AppInfo>>,
}

impl fmt::Debug for TaskConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskConfig")
            .field("store", &self.store)
            .field("check_request", &self.check_request)
            .field("app_info", &self.app_info)
            .finish_non_exhaustive()
    }
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskConfig {
    /// Task backed by the global store
    pub fn new() -> Self {
        Self::with_store(ConfigStore::global())
    }

    pub fn with_store(store: Arc<ConfigStore>) -> Self {
        Self {
            store,
            runtime: None,
            check_request: None,
            update_parser: None,
            check_worker: None,
            download_worker: None,
            check_callback: None,
            download_callback: None,
            update_strategy: None,
            update_creator: None,
            install_creator: None,
            download_creator: None,
            file_creator: None,
            update_checker: None,
            file_checker: None,
            install_strategy: None,
            network_monitor: None,
            ignore_store: None,
            app_info: None,
        }
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Runtime the task is spawned on; defaults to the caller's current runtime
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Shorthand for a GET check request; replaces any request set earlier
    pub fn with_url(self, url: impl Into<String>) -> Self {
        self.with_check_request(CheckRequest::get(url))
    }

    pub fn with_check_request(mut self, request: CheckRequest) -> Self {
        self.check_request = Some(Arc::new(request));
        self
    }

    pub fn with_update_parser(mut self, parser: Arc<dyn UpdateParser>) -> Self {
        self.update_parser = Some(parser);
        self
    }

    pub fn with_check_worker(mut self, worker: Arc<dyn CheckWorker>) -> Self {
        self.check_worker = Some(worker);
        self
    }

    pub fn with_download_worker(mut self, worker: Arc<dyn DownloadWorker>) -> Self {
        self.download_worker = Some(worker);
        self
    }

    pub fn with_check_callback(mut self, callback: Arc<dyn CheckCallback>) -> Self {
        self.check_callback = Some(callback);
        self
    }

    pub fn with_download_callback(mut self, callback: Arc<dyn DownloadCallback>) -> Self {
        self.download_callback = Some(callback);
        self
    }

    pub fn with_update_strategy(mut self, strategy: Arc<dyn UpdateStrategy>) -> Self {
        self.update_strategy = Some(strategy);
        self
    }

    pub fn with_update_creator(mut self, creator: Arc<dyn UpdateCreator>) -> Self {
        self.update_creator = Some(creator);
        self
    }

    pub fn with_install_creator(mut self, creator: Arc<dyn InstallCreator>) -> Self {
        self.install_creator = Some(creator);
        self
    }

    pub fn with_download_creator(mut self, creator: Arc<dyn DownloadCreator>) -> Self {
        self.download_creator = Some(creator);
        self
    }

    pub fn with_file_creator(mut self, creator: Arc<dyn FileCreator>) -> Self {
        self.file_creator = Some(creator);
        self
    }

    pub fn with_update_checker(mut self, checker: Arc<dyn UpdateChecker>) -> Self {
        self.update_checker = Some(checker);
        self
    }

    pub fn with_file_checker(mut self, checker: Arc<dyn FileChecker>) -> Self {
        self.file_checker = Some(checker);
        self
    }

    pub fn with_install_strategy(mut self, strategy: Arc<dyn InstallStrategy>) -> Self {
        self.install_strategy = Some(strategy);
        self
    }

    pub fn with_network_monitor(mut self, monitor: Arc<dyn NetworkMonitor>) -> Self {
        self.network_monitor = Some(monitor);
        self
    }

    pub fn with_ignore_store(mut self, store: Arc<dyn IgnoreStore>) -> Self {
        self.ignore_store = Some(store);
        self
    }

    pub fn with_app_info(mut self, app: AppInfo) -> Self {
        self.app_info = Some(Arc::new(app));
        self
    }

    /// Whether the option is overridden on this task
    pub fn is_overridden(&self, kind: OptionKind) -> bool {
        match kind {
            OptionKind::CheckRequest => self.check_request.is_some(),
            OptionKind::UpdateParser => self.update_parser.is_some(),
            OptionKind::CheckWorker => self.check_worker.is_some(),
            OptionKind::DownloadWorker => self.download_worker.is_some(),
            OptionKind::CheckCallback => self.check_callback.is_some(),
            OptionKind::DownloadCallback => self.download_callback.is_some(),
            OptionKind::UpdateStrategy => self.update_strategy.is_some(),
            OptionKind::UpdateCreator => self.update_creator.is_some(),
            OptionKind::InstallCreator => self.install_creator.is_some(),
            OptionKind::DownloadCreator => self.download_creator.is_some(),
            OptionKind::FileCreator => self.file_creator.is_some(),
            OptionKind::UpdateChecker => self.update_checker.is_some(),
            OptionKind::FileChecker => self.file_checker.is_some(),
            OptionKind::InstallStrategy => self.install_strategy.is_some(),
            OptionKind::NetworkMonitor => self.network_monitor.is_some(),
            OptionKind::IgnoreStore => self.ignore_store.is_some(),
            OptionKind::AppInfo => self.app_info.is_some(),
        }
    }

    pub fn check_request(&self) -> Result<Arc<CheckRequest>> {
        let request = require(
            OptionKind::CheckRequest,
            self.check_request.as_ref(),
            &self.store.check_request,
        )?;
        request.validate()?;
        Ok(request)
    }

    pub fn update_parser(&self) -> Result<Arc<dyn UpdateParser>> {
        require(
            OptionKind::UpdateParser,
            self.update_parser.as_ref(),
            &self.store.update_parser,
        )
    }

    pub fn check_worker(&self) -> Arc<dyn CheckWorker> {
        self.check_worker
            .clone()
            .unwrap_or_else(|| self.store.check_worker())
    }

    pub fn download_worker(&self) -> Arc<dyn DownloadWorker> {
        self.download_worker
            .clone()
            .unwrap_or_else(|| self.store.download_worker())
    }

    pub fn check_callback(&self) -> Arc<dyn CheckCallback> {
        self.check_callback
            .clone()
            .unwrap_or_else(|| self.store.check_callback())
    }

    pub fn download_callback(&self) -> Arc<dyn DownloadCallback> {
        self.download_callback
            .clone()
            .unwrap_or_else(|| self.store.download_callback())
    }

    pub fn update_strategy(&self) -> Arc<dyn UpdateStrategy> {
        self.update_strategy
            .clone()
            .unwrap_or_else(|| self.store.update_strategy())
    }

    pub fn update_creator(&self) -> Arc<dyn UpdateCreator> {
        self.update_creator
            .clone()
            .unwrap_or_else(|| self.store.update_creator())
    }

    pub fn install_creator(&self) -> Arc<dyn InstallCreator> {
        self.install_creator
            .clone()
            .unwrap_or_else(|| self.store.install_creator())
    }

    pub fn download_creator(&self) -> Arc<dyn DownloadCreator> {
        self.download_creator
            .clone()
            .unwrap_or_else(|| self.store.download_creator())
    }

    pub fn file_creator(&self) -> Arc<dyn FileCreator> {
        self.file_creator
            .clone()
            .unwrap_or_else(|| self.store.file_creator())
    }

    pub fn update_checker(&self) -> Arc<dyn UpdateChecker> {
        self.update_checker
            .clone()
            .unwrap_or_else(|| self.store.update_checker())
    }

    pub fn file_checker(&self) -> Arc<dyn FileChecker> {
        self.file_checker
            .clone()
            .unwrap_or_else(|| self.store.file_checker())
    }

    pub fn install_strategy(&self) -> Arc<dyn InstallStrategy> {
        self.install_strategy
            .clone()
            .unwrap_or_else(|| self.store.install_strategy())
    }

    pub fn network_monitor(&self) -> Arc<dyn NetworkMonitor> {
        self.network_monitor
            .clone()
            .unwrap_or_else(|| self.store.network_monitor())
    }

    pub fn ignore_store(&self) -> Arc<dyn IgnoreStore> {
        self.ignore_store
            .clone()
            .unwrap_or_else(|| self.store.ignore_store())
    }

    pub fn app_info(&self) -> Arc<AppInfo> {
        self.app_info
            .clone()
            .unwrap_or_else(|| self.store.app_info())
    }

    pub(crate) fn runtime(&self) -> Option<Handle> {
        self.runtime.clone().or_else(|| Handle::try_current().ok())
    }

    /// Start the update task. Never blocks; the returned handle observes and
    /// cancels it.
    ///
    /// Missing configuration fails here, before any worker runs, and is also
    /// reported through the check callback.
    pub fn check(self) -> Result<UpdateHandle> {
        task::spawn(self)
    }
}
