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

//! Update policy: whether an update proceeds now, waits for the user, or is
//! denied, and whether the verified artifact installs without asking.

use crate::model::{NetworkCondition, UpdateDescriptor};
use crate::traits::{IgnoreStore, NetworkMonitor, UpdateStrategy};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The user dismissed this version earlier
    Ignored,
    /// No network to download over
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Proceed,
    /// Ask the user before downloading
    Defer,
    Deny(DenyReason),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proceed => write!(f, "proceed"),
            Self::Defer => write!(f, "defer"),
            Self::Deny(DenyReason::Ignored) => write!(f, "deny (ignored)"),
            Self::Deny(DenyReason::Offline) => write!(f, "deny (offline)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub action: Action,

    /// Install right after verification instead of prompting first
    pub auto_install: bool,

    /// Attach the progress UI observer while downloading
    pub show_progress: bool,
}

impl Plan {
    pub fn deny(reason: DenyReason) -> Self {
        Self {
            action: Action::Deny(reason),
            auto_install: false,
            show_progress: false,
        }
    }
}

/// Default policy: download quietly on unmetered networks and confirm before
/// install; on metered networks ask first, then install without asking again.
#[derive(Debug, Clone, Copy, Default)]
pub struct WifiFirstStrategy;

impl UpdateStrategy for WifiFirstStrategy {
    fn decide(&self, _update: &UpdateDescriptor, network: NetworkCondition) -> Plan {
        match network {
            NetworkCondition::Unmetered => Plan {
                action: Action::Proceed,
                auto_install: false,
                show_progress: false,
            },
            NetworkCondition::Metered => Plan {
                action: Action::Defer,
                auto_install: true,
                show_progress: true,
            },
            NetworkCondition::Offline => Plan::deny(DenyReason::Offline),
        }
    }

    fn name(&self) -> &str {
        "wifi-first"
    }
}

/// Used for every mandatory update regardless of the configured policy
#[derive(Debug, Clone, Copy, Default)]
pub struct ForcedUpdateStrategy;

impl UpdateStrategy for ForcedUpdateStrategy {
    fn decide(&self, _update: &UpdateDescriptor, _network: NetworkCondition) -> Plan {
        Plan {
            action: Action::Proceed,
            auto_install: true,
            show_progress: true,
        }
    }

    fn name(&self) -> &str {
        "forced"
    }
}

/// Always asks before downloading and before installing
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAskStrategy;

impl UpdateStrategy for AlwaysAskStrategy {
    fn decide(&self, _update: &UpdateDescriptor, network: NetworkCondition) -> Plan {
        if network == NetworkCondition::Offline {
            return Plan::deny(DenyReason::Offline);
        }
        Plan {
            action: Action::Defer,
            auto_install: false,
            show_progress: true,
        }
    }

    fn name(&self) -> &str {
        "always-ask"
    }
}

/// Network monitor that always reports the same condition
#[derive(Debug, Clone, Copy)]
pub struct FixedNetwork(pub NetworkCondition);

impl Default for FixedNetwork {
    fn default() -> Self {
        Self(NetworkCondition::Unmetered)
    }
}

impl NetworkMonitor for FixedNetwork {
    fn condition(&self) -> NetworkCondition {
        self.0
    }
}

/// Combines the configured policy with the mandatory override and the
/// ignore-list gate.
///
/// Mandatory updates never consult the ignore list.
#[derive(Clone)]
pub struct StrategyEngine {
    policy: Arc<dyn UpdateStrategy>,
    ignored: Arc<dyn IgnoreStore>,
}

impl fmt::Debug for StrategyEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyEngine")
            .field("policy", &self.policy.name())
            .finish_non_exhaustive()
    }
}

impl StrategyEngine {
    pub fn new(policy: Arc<dyn UpdateStrategy>, ignored: Arc<dyn IgnoreStore>) -> Self {
        Self { policy, ignored }
    }

    pub fn decide(&self, update: &UpdateDescriptor, network: NetworkCondition) -> Plan {
        if update.is_mandatory {
            debug!(
                "Version {} is mandatory, forcing update",
                update.version_code
            );
            return ForcedUpdateStrategy.decide(update, network);
        }

        if self.ignored.is_ignored(update.version_code) {
            debug!("Version {} is in the ignore list", update.version_code);
            return Plan::deny(DenyReason::Ignored);
        }

        let plan = self.policy.decide(update, network);
        debug!(
            "Strategy '{}' decided {} on {network} network (auto_install={})",
            self.policy.name(),
            plan.action,
            plan.auto_install
        );
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ignore::IgnoreList;

    fn update(version_code: u32, is_mandatory: bool) -> UpdateDescriptor {
        UpdateDescriptor {
            version_code,
            version_name: format!("1.0.{version_code}"),
            download_url: "https://example.com/app.bin".to_owned(),
            is_mandatory,
            release_notes: String::new(),
            checksum: None,
        }
    }

    fn engine(ignored: &[u32]) -> StrategyEngine {
        let list = IgnoreList::in_memory();
        for code in ignored {
            list.add(*code).unwrap();
        }
        StrategyEngine::new(Arc::new(WifiFirstStrategy), Arc::new(list))
    }

    #[test]
    fn test_wifi_first_policy() {
        let engine = engine(&[]);
        let u = update(10, false);

        let plan = engine.decide(&u, NetworkCondition::Unmetered);
        assert_eq!(plan.action, Action::Proceed);
        assert!(!plan.auto_install);

        let plan = engine.decide(&u, NetworkCondition::Metered);
        assert_eq!(plan.action, Action::Defer);
        assert!(plan.auto_install);

        let plan = engine.decide(&u, NetworkCondition::Offline);
        assert_eq!(plan.action, Action::Deny(DenyReason::Offline));
    }

    #[test]
    fn test_mandatory_always_proceeds_with_auto_install() {
        let engine = engine(&[10]);
        let u = update(10, true);

        for network in [
            NetworkCondition::Unmetered,
            NetworkCondition::Metered,
            NetworkCondition::Offline,
        ] {
            let plan = engine.decide(&u, network);
            assert_eq!(plan.action, Action::Proceed, "network {network}");
            assert!(plan.auto_install, "network {network}");
        }
    }

    #[test]
    fn test_ignored_version_denied_before_network_check() {
        let engine = engine(&[10]);

        for network in [NetworkCondition::Unmetered, NetworkCondition::Offline] {
            let plan = engine.decide(&update(10, false), network);
            assert_eq!(plan.action, Action::Deny(DenyReason::Ignored));
        }

        let plan = engine.decide(&update(11, false), NetworkCondition::Unmetered);
        assert_eq!(plan.action, Action::Proceed);
    }

    #[test]
    fn test_always_ask_strategy() {
        let engine = StrategyEngine::new(
            Arc::new(AlwaysAskStrategy),
            Arc::new(IgnoreList::in_memory()),
        );
        let plan = engine.decide(&update(3, false), NetworkCondition::Unmetered);
        assert_eq!(plan.action, Action::Defer);
        assert!(!plan.auto_install);
    }

    #[test]
    fn test_fixed_network_default_is_unmetered() {
        let network = FixedNetwork::default();
        assert_eq!(network.condition(), NetworkCondition::Unmetered);
    }
}
