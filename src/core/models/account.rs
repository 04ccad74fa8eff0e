use serde::Serialize;
use thiserror::Error;

use crate::core::models::plan::PlanTag;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("service reported a negative credit balance: {0}")]
    NegativeCredits(i64),
    #[error("service reported a non-positive recovery rate: {0}")]
    InvalidRecoveryRate(i64),
    #[error("no recovery rate reported and plan '{0}' has no fallback rate")]
    MissingRecoveryRate(PlanTag),
}

/// Account state as fetched at the start of one invocation.
///
/// Fields are private so the invariants checked in [`AccountSnapshot::new`]
/// (`credits >= 0`, `recovery_rate > 0`, `remaining_resets >= 0`) hold for
/// every snapshot the policy sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSnapshot {
    user_id: String,
    plan: PlanTag,
    credits: u64,
    recovery_rate: u32,
    remaining_resets: u32,
}

impl AccountSnapshot {
    /// Build a snapshot from raw service values.
    ///
    /// A negative reset count is clamped to zero: the service has no resets to
    /// give either way.
    pub fn new(
        user_id: impl Into<String>,
        plan: PlanTag,
        credits: i64,
        recovery_rate: i64,
        remaining_resets: i64,
    ) -> Result<Self, SnapshotError> {
        let credits = u64::try_from(credits).map_err(|_| SnapshotError::NegativeCredits(credits))?;
        let recovery_rate = u32::try_from(recovery_rate)
            .ok()
            .filter(|rate| *rate > 0)
            .ok_or(SnapshotError::InvalidRecoveryRate(recovery_rate))?;
        let remaining_resets = u32::try_from(remaining_resets.max(0)).unwrap_or(u32::MAX);

        Ok(Self {
            user_id: user_id.into(),
            plan,
            credits,
            recovery_rate,
            remaining_resets,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn plan(&self) -> &PlanTag {
        &self.plan
    }

    pub fn credits(&self) -> u64 {
        self.credits
    }

    /// Credits recovered per hour
    pub fn recovery_rate(&self) -> u32 {
        self.recovery_rate
    }

    pub fn remaining_resets(&self) -> u32 {
        self.remaining_resets
    }

    pub fn has_resets(&self) -> bool {
        self.remaining_resets > 0
    }
}
