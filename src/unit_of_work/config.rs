use serde::{Deserialize, Serialize};

/// How a delete-registration updates the lane's `committed` flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommittedPolicy {
    /// `committed = !(was_modified || was_added)`.
    ///
    /// Deleting an aggregate that is already registered as deleted forces
    /// `committed` to true even if other registrations are still pending.
    #[default]
    Observed,
    /// `committed` is true exactly when all three pending sets are empty.
    Derived,
}

/// Unit of work settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitOfWorkConfig {
    pub committed_policy: CommittedPolicy,
    /// Empty the three pending sets after a successful commit.
    pub clear_registrations_on_commit: bool,
}

impl UnitOfWorkConfig {
    pub fn with_committed_policy(mut self, policy: CommittedPolicy) -> Self {
        self.committed_policy = policy;
        self
    }

    pub fn with_clear_registrations_on_commit(mut self, clear: bool) -> Self {
        self.clear_registrations_on_commit = clear;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
