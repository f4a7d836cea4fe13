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

//! The update task: one check cycle from request to install.
//!
//! A task runs as a single tokio task, so its state transitions are
//! serialized. Network work runs on spawned tasks and file work on the
//! blocking pool; observers are always called from the driver. Cancellation
//! is observed at the decision prompts and whenever background work
//! completes. Once a terminal state is reached the driver returns and every
//! adapter reference it held is dropped.

use crate::config::TaskConfig;
use crate::decision::{Decision, Progress, ProgressReporter, UserChoice};
use crate::error::{Result, UpdateError};
use crate::model::{AppInfo, CheckRequest, InstallContext, UpdateDescriptor};
use crate::strategy::{Action, DenyReason, StrategyEngine};
use crate::traits::{
    CheckCallback, CheckWorker, DownloadCallback, DownloadCreator, DownloadWorker, FileChecker,
    FileCreator, IgnoreStore, InstallCreator, InstallStrategy, NetworkMonitor, UpdateChecker,
    UpdateCreator, UpdateParser,
};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Idle,
    Checking,
    NoUpdate,
    UpdateAvailable,
    Ignored,
    AwaitingDecision,
    Downloading,
    Downloaded,
    Verifying,
    /// Verified download waiting for the pre-install prompt
    AwaitingInstall,
    Installing,
    Done,
    Error,
    Cancelled,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Checking => "checking",
            Self::NoUpdate => "no_update",
            Self::UpdateAvailable => "update_available",
            Self::Ignored => "ignored",
            Self::AwaitingDecision => "awaiting_decision",
            Self::Downloading => "downloading",
            Self::Downloaded => "downloaded",
            Self::Verifying => "verifying",
            Self::AwaitingInstall => "awaiting_install",
            Self::Installing => "installing",
            Self::Done => "done",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Done | Self::Ignored | Self::Error | Self::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: TaskState) -> bool {
        use TaskState::{
            AwaitingDecision, AwaitingInstall, Cancelled, Checking, Done, Downloaded, Downloading,
            Error, Idle, Ignored, Installing, NoUpdate, UpdateAvailable, Verifying,
        };

        match self {
            Idle => matches!(next, Checking | Error),
            Checking => matches!(next, NoUpdate | UpdateAvailable | Error | Cancelled),
            NoUpdate => matches!(next, Done),
            UpdateAvailable => matches!(
                next,
                Ignored | AwaitingDecision | Downloading | Error | Cancelled
            ),
            AwaitingDecision => matches!(next, Downloading | Ignored | Cancelled | Error),
            Downloading => matches!(next, Downloaded | Error | Cancelled),
            Downloaded => matches!(next, Verifying | Error | Cancelled),
            Verifying => matches!(next, AwaitingInstall | Installing | Error | Cancelled),
            AwaitingInstall => matches!(next, Installing | Ignored | Cancelled | Error),
            Installing => matches!(next, Done | Error),
            Done | Ignored | Error | Cancelled => false,
        }
    }

    pub fn transition(self, next: TaskState) -> Result<TaskState> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(UpdateError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Whether a failure in this state is reported to the download observers
    fn is_download_phase(self) -> bool {
        matches!(self, Self::Downloading | Self::Downloaded | Self::Verifying)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a task ended
#[derive(Debug)]
pub enum TaskOutcome {
    NoUpdate,
    Ignored(UpdateDescriptor),
    Cancelled,
    Installed(UpdateDescriptor),
    Failed(UpdateError),
}

/// Handle to a running update task
#[derive(Debug)]
pub struct UpdateHandle {
    state: watch::Receiver<TaskState>,
    cancel: watch::Sender<bool>,
    join: JoinHandle<TaskOutcome>,
}

impl UpdateHandle {
    pub fn state(&self) -> TaskState {
        *self.state.borrow()
    }

    /// Receiver of every state the task enters
    pub fn subscribe(&self) -> watch::Receiver<TaskState> {
        self.state.clone()
    }

    /// Request cooperative cancellation.
    ///
    /// Takes effect at the next prompt or when the current background step
    /// completes. Has no effect once the task is installing or finished.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    pub async fn wait(self) -> TaskOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) => TaskOutcome::Failed(UpdateError::Task(e.to_string())),
        }
    }
}

/// Adapters resolved for one cycle
pub(crate) struct Adapters {
    request: Arc<CheckRequest>,
    parser: Arc<dyn UpdateParser>,
    check_worker: Arc<dyn CheckWorker>,
    download_worker: Arc<dyn DownloadWorker>,
    check_callback: Arc<dyn CheckCallback>,
    download_callback: Arc<dyn DownloadCallback>,
    update_creator: Arc<dyn UpdateCreator>,
    install_creator: Arc<dyn InstallCreator>,
    download_creator: Arc<dyn DownloadCreator>,
    file_creator: Arc<dyn FileCreator>,
    update_checker: Arc<dyn UpdateChecker>,
    file_checker: Arc<dyn FileChecker>,
    install_strategy: Arc<dyn InstallStrategy>,
    network_monitor: Arc<dyn NetworkMonitor>,
    ignore_store: Arc<dyn IgnoreStore>,
    app: Arc<AppInfo>,
    engine: StrategyEngine,
}

impl Adapters {
    fn resolve(config: &TaskConfig) -> Result<Self> {
        let request = config.check_request()?;
        let parser = config.update_parser()?;
        let ignore_store = config.ignore_store();
        let engine = StrategyEngine::new(config.update_strategy(), Arc::clone(&ignore_store));

        Ok(Self {
            request,
            parser,
            check_worker: config.check_worker(),
            download_worker: config.download_worker(),
            check_callback: config.check_callback(),
            download_callback: config.download_callback(),
            update_creator: config.update_creator(),
            install_creator: config.install_creator(),
            download_creator: config.download_creator(),
            file_creator: config.file_creator(),
            update_checker: config.update_checker(),
            file_checker: config.file_checker(),
            install_strategy: config.install_strategy(),
            network_monitor: config.network_monitor(),
            ignore_store,
            app: config.app_info(),
            engine,
        })
    }
}

/// Start a task for `config`. Configuration errors are reported through the
/// check callback and returned before anything is spawned.
pub(crate) fn spawn(config: TaskConfig) -> Result<UpdateHandle> {
    let prepared = Adapters::resolve(&config).and_then(|adapters| {
        let runtime = config.runtime().ok_or_else(|| {
            UpdateError::Configuration("no tokio runtime to run the update task on".to_owned())
        })?;
        Ok((adapters, runtime))
    });

    let (adapters, runtime) = match prepared {
        Ok(prepared) => prepared,
        Err(e) => {
            warn!("Update task not started: {e}");
            config.check_callback().on_check_error(&e);
            return Err(e);
        }
    };

    let (state_tx, state_rx) = watch::channel(TaskState::Idle);
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let driver = Driver {
        adapters,
        state: state_tx,
        cancel: cancel_rx,
        progress_ui: None,
    };
    let join = runtime.spawn(driver.run());

    Ok(UpdateHandle {
        state: state_rx,
        cancel: cancel_tx,
        join,
    })
}

/// Why the driver stopped before reaching its own terminal state
enum Halt {
    Cancelled,
    Failed(UpdateError),
}

impl Halt {
    fn verification(self) -> Self {
        match self {
            Self::Failed(e) => Self::Failed(e.into_verification()),
            other => other,
        }
    }

    fn install(self) -> Self {
        match self {
            Self::Failed(e) => Self::Failed(e.into_install()),
            other => other,
        }
    }
}

impl From<UpdateError> for Halt {
    fn from(error: UpdateError) -> Self {
        Self::Failed(error)
    }
}

/// Resolves once cancellation is requested. A dropped handle never cancels.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn joined<T>(result: std::result::Result<Result<T>, tokio::task::JoinError>) -> Result<T> {
    result.map_err(|e| UpdateError::Task(e.to_string()))?
}

struct Driver {
    adapters: Adapters,
    state: watch::Sender<TaskState>,
    cancel: watch::Receiver<bool>,
    progress_ui: Option<Arc<dyn DownloadCallback>>,
}

impl Driver {
    async fn run(mut self) -> TaskOutcome {
        match self.drive().await {
            Ok(outcome) => outcome,
            Err(Halt::Cancelled) => self.user_cancel(),
            Err(Halt::Failed(error)) => self.fail(error),
        }
    }

    async fn drive(&mut self) -> std::result::Result<TaskOutcome, Halt> {
        let adapters = &self.adapters;

        self.advance(TaskState::Checking)?;
        adapters.check_callback.on_check_start();

        let worker = Arc::clone(&adapters.check_worker);
        let request = Arc::clone(&adapters.request);
        let raw = self
            .join_or_cancel(tokio::spawn(async move { worker.fetch(&request).await }))
            .await?;

        let update = adapters.parser.parse(&raw)?;
        debug!(
            "Endpoint offers {} (code {}), running code {}",
            update.version_name, update.version_code, adapters.app.version_code
        );

        if !adapters.update_checker.is_newer(&adapters.app, &update)? {
            self.advance(TaskState::NoUpdate)?;
            adapters.check_callback.on_check_result(None);
            self.advance(TaskState::Done)?;
            return Ok(TaskOutcome::NoUpdate);
        }

        self.advance(TaskState::UpdateAvailable)?;
        let network = adapters.network_monitor.condition();
        let plan = adapters.engine.decide(&update, network);

        match plan.action {
            Action::Deny(DenyReason::Ignored) => return self.ignored(update),
            Action::Deny(DenyReason::Offline) => {
                return Err(UpdateError::Transport(format!(
                    "network is offline, cannot download version {}",
                    update.version_name
                ))
                .into());
            }
            Action::Proceed => adapters.check_callback.on_check_result(Some(&update)),
            Action::Defer => {
                adapters.check_callback.on_check_result(Some(&update));
                self.advance(TaskState::AwaitingDecision)?;
                let (decision, rx) = Decision::channel();
                adapters.update_creator.create(&update, decision);
                match self.await_choice(rx).await? {
                    UserChoice::Proceed => {}
                    UserChoice::Ignore => return self.ignore_version(update),
                    UserChoice::Cancel => return Err(Halt::Cancelled),
                }
            }
        }

        self.checkpoint()?;
        let target = adapters.file_creator.create(&update)?;
        let cached = self.is_cached(&update, &target).await;

        if plan.show_progress {
            self.progress_ui = adapters.download_creator.create(&update);
        }

        self.advance(TaskState::Downloading)?;
        if cached {
            info!("Using previously downloaded {}", target.display());
        } else {
            self.download(&update, &target).await?;
        }

        self.checkpoint()?;
        self.advance(TaskState::Downloaded)?;
        self.notify_download(|cb| cb.on_download_complete(&target));

        self.checkpoint()?;
        self.advance(TaskState::Verifying)?;
        let checker = Arc::clone(&adapters.file_checker);
        let (descriptor, file) = (update.clone(), target.clone());
        self.join_or_cancel(tokio::task::spawn_blocking(move || {
            checker.check(&descriptor, &file)
        }))
        .await
        .map_err(Halt::verification)?;
        debug!("Verified {}", target.display());

        if !plan.auto_install {
            self.advance(TaskState::AwaitingInstall)?;
            let (decision, rx) = Decision::channel();
            adapters.install_creator.create(&update, &target, decision);
            match self.await_choice(rx).await? {
                UserChoice::Proceed => {}
                UserChoice::Ignore => return self.ignore_version(update),
                UserChoice::Cancel => return Err(Halt::Cancelled),
            }
        }

        self.checkpoint()?;
        self.advance(TaskState::Installing)?;
        let strategy = Arc::clone(&adapters.install_strategy);
        let context = InstallContext {
            app: AppInfo::clone(&adapters.app),
        };
        let descriptor = update.clone();
        let installed = tokio::task::spawn_blocking(move || {
            strategy.install(&context, &target, &descriptor)
        })
        .await;
        joined(installed).map_err(|e| Halt::Failed(e).install())?;

        self.advance(TaskState::Done)?;
        info!("Update {} installed", update.version_name);
        Ok(TaskOutcome::Installed(update))
    }

    async fn download(
        &self,
        update: &UpdateDescriptor,
        target: &Path,
    ) -> std::result::Result<(), Halt> {
        self.notify_download(|cb| cb.on_download_start());

        let (reporter, mut progress) = ProgressReporter::channel();
        let worker = Arc::clone(&self.adapters.download_worker);
        let url = update.download_url.clone();
        let file = target.to_path_buf();
        let mut handle =
            tokio::spawn(async move { worker.download(&url, &file, reporter).await });

        let mut cancel = self.cancel.clone();
        let mut last = None;
        let result = loop {
            tokio::select! {
                biased;
                () = cancelled(&mut cancel) => {
                    handle.abort();
                    return Err(Halt::Cancelled);
                }
                Some(sample) = progress.recv() => self.relay(sample, &mut last),
                result = &mut handle => break result,
            }
        };

        while let Ok(sample) = progress.try_recv() {
            self.relay(sample, &mut last);
        }

        joined(result)?;
        Ok(())
    }

    /// Forward a progress sample, dropping regressions
    fn relay(&self, sample: Progress, last: &mut Option<u64>) {
        if last.is_some_and(|done| sample.done < done) {
            trace!("Dropping out-of-order progress sample {}", sample.done);
            return;
        }
        *last = Some(sample.done);
        self.notify_download(|cb| cb.on_download_progress(sample.done, sample.total));
    }

    async fn is_cached(&self, update: &UpdateDescriptor, target: &Path) -> bool {
        if !target.is_file() {
            return false;
        }
        let checker = Arc::clone(&self.adapters.file_checker);
        let (descriptor, file) = (update.clone(), target.to_path_buf());
        let checked = tokio::task::spawn_blocking(move || checker.check(&descriptor, &file)).await;
        match joined(checked) {
            Ok(()) => true,
            Err(e) => {
                debug!("Existing {} not reusable: {e}", target.display());
                false
            }
        }
    }

    async fn await_choice(
        &self,
        rx: oneshot::Receiver<UserChoice>,
    ) -> std::result::Result<UserChoice, Halt> {
        let mut cancel = self.cancel.clone();
        tokio::select! {
            biased;
            () = cancelled(&mut cancel) => Err(Halt::Cancelled),
            choice = rx => Ok(choice.unwrap_or_else(|_| {
                debug!("Prompt closed without a choice, treating as cancel");
                UserChoice::Cancel
            })),
        }
    }

    async fn join_or_cancel<T>(
        &self,
        mut handle: JoinHandle<Result<T>>,
    ) -> std::result::Result<T, Halt> {
        let mut cancel = self.cancel.clone();
        tokio::select! {
            biased;
            () = cancelled(&mut cancel) => {
                handle.abort();
                Err(Halt::Cancelled)
            }
            result = &mut handle => Ok(joined(result)?),
        }
    }

    fn checkpoint(&self) -> std::result::Result<(), Halt> {
        if *self.cancel.borrow() {
            return Err(Halt::Cancelled);
        }
        Ok(())
    }

    fn ignore_version(&self, update: UpdateDescriptor) -> std::result::Result<TaskOutcome, Halt> {
        self.adapters.ignore_store.add(update.version_code)?;
        self.ignored(update)
    }

    fn ignored(&self, update: UpdateDescriptor) -> std::result::Result<TaskOutcome, Halt> {
        self.advance(TaskState::Ignored)?;
        self.adapters.check_callback.on_check_ignore(&update);
        Ok(TaskOutcome::Ignored(update))
    }

    fn advance(&self, next: TaskState) -> Result<()> {
        let current = *self.state.borrow();
        let next = current.transition(next)?;
        debug!("Update task {current} -> {next}");
        self.state.send_replace(next);
        Ok(())
    }

    fn notify_download(&self, notify: impl Fn(&dyn DownloadCallback)) {
        notify(self.adapters.download_callback.as_ref());
        if let Some(ui) = &self.progress_ui {
            notify(ui.as_ref());
        }
    }

    fn user_cancel(&self) -> TaskOutcome {
        let from = self.state.send_replace(TaskState::Cancelled);
        info!("Update task cancelled while {from}");
        self.adapters.check_callback.on_user_cancel();
        TaskOutcome::Cancelled
    }

    fn fail(&self, error: UpdateError) -> TaskOutcome {
        let from = self.state.send_replace(TaskState::Error);
        warn!("Update task failed while {from}: {error}");
        if from.is_download_phase() {
            self.notify_download(|cb| cb.on_download_error(&error));
        } else {
            self.adapters.check_callback.on_check_error(&error);
        }
        TaskOutcome::Failed(error)
    }
}
