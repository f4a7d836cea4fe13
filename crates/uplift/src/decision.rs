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

//! One-shot decision handles given to prompt adapters

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// What the user chose when presented with an update or a downloaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserChoice {
    Proceed,
    Cancel,
    Ignore,
}

/// Continuation handed to a prompt adapter.
///
/// Resolving consumes the handle, so a prompt can answer at most once.
/// Dropping it unanswered is treated as [`UserChoice::Cancel`] by the task.
#[derive(Debug)]
pub struct Decision {
    tx: oneshot::Sender<UserChoice>,
}

impl Decision {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<UserChoice>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub fn proceed(self) {
        self.resolve(UserChoice::Proceed);
    }

    pub fn cancel(self) {
        self.resolve(UserChoice::Cancel);
    }

    pub fn ignore(self) {
        self.resolve(UserChoice::Ignore);
    }

    pub fn resolve(self, choice: UserChoice) {
        if self.tx.send(choice).is_err() {
            debug!("Decision {choice:?} arrived after the task finished, ignoring");
        }
    }
}

/// Download progress sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: u64,
    pub total: Option<u64>,
}

/// Sender side of the progress stream handed to download workers
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: mpsc::UnboundedSender<Progress>,
}

impl ProgressReporter {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<Progress>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn report(&self, done: u64, total: Option<u64>) {
        // Receiver is gone once the task has finished
        let _ = self.tx.send(Progress { done, total });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_decision_delivers_choice() {
        let (decision, rx) = Decision::channel();
        decision.ignore();
        assert_eq!(rx.await.unwrap(), UserChoice::Ignore);
    }

    #[tokio::test]
    async fn test_dropped_decision_closes_channel() {
        let (decision, rx) = Decision::channel();
        drop(decision);
        assert!(rx.await.is_err());
    }

    #[test]
    fn test_late_decision_is_noop() {
        let (decision, rx) = Decision::channel();
        drop(rx);
        decision.proceed();
    }

    #[tokio::test]
    async fn test_progress_reporter() {
        let (reporter, mut rx) = ProgressReporter::channel();
        reporter.report(10, Some(100));
        drop(reporter);
        assert_eq!(
            rx.recv().await,
            Some(Progress {
                done: 10,
                total: Some(100)
            })
        );
        assert_eq!(rx.recv().await, None);
    }
}
