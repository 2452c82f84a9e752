// src/types.rs

use std::str::FromStr;

use serde::Deserialize;

/// Behaviour when file changes arrive while a watch-mode run is in progress.
///
/// - `Queue`: remember the dispatched tasks and run them once the current run
///   finishes (default behaviour).
/// - `Cancel`: drop any previously queued batch and only keep the latest one.
///   The run that is already executing is never interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    #[default]
    Queue,
    Cancel,
}

impl FromStr for TriggerWhileRunningBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(TriggerWhileRunningBehaviour::Queue),
            "cancel" => Ok(TriggerWhileRunningBehaviour::Cancel),
            other => Err(format!(
                "invalid triggered_while_running_behaviour: {other} (expected \"queue\" or \"cancel\")"
            )),
        }
    }
}

/// What connected browsers should do after a watch-triggered run succeeds.
///
/// Ordered by strength: merging two kinds keeps the stronger one, so a batch
/// that touched both styles and markup ends up as a full `Reload`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshKind {
    None,
    /// Re-fetch stylesheets in place without reloading the page.
    Inject,
    #[default]
    Reload,
}

impl RefreshKind {
    pub fn merge(self, other: RefreshKind) -> RefreshKind {
        self.max(other)
    }
}
