use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::models::account::AccountSnapshot;
use crate::core::models::plan::PlanTable;

/// Tunables for the refresh decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshPolicy {
    #[serde(default = "default_night_hour")]
    pub night_window_start_hour: u32,
    #[serde(default = "default_night_minute")]
    pub night_window_start_minute: u32,
    /// Hours of passive recovery to project forward (roughly until morning)
    #[serde(default = "default_lookahead_hours")]
    pub lookahead_hours: u32,
}

fn default_night_hour() -> u32 {
    23
}
fn default_night_minute() -> u32 {
    30
}
fn default_lookahead_hours() -> u32 {
    8
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            night_window_start_hour: default_night_hour(),
            night_window_start_minute: default_night_minute(),
            lookahead_hours: default_lookahead_hours(),
        }
    }
}

impl RefreshPolicy {
    /// Matches when the hour equals `night_window_start_hour` and the minute is
    /// at or past `night_window_start_minute`. The window never spills into the
    /// following hour.
    pub fn in_night_window(&self, now: &NaiveDateTime) -> bool {
        now.hour() == self.night_window_start_hour
            && now.minute() >= self.night_window_start_minute
    }

    /// Credits expected after `lookahead_hours` of passive recovery.
    pub fn projected_credits(&self, snapshot: &AccountSnapshot) -> u64 {
        let recovered = u64::from(self.lookahead_hours) * u64::from(snapshot.recovery_rate());
        snapshot.credits().saturating_add(recovered)
    }
}

/// Proof that the account had resets left when the decision was made.
///
/// Only this module can construct one, and the reset action requires it, so a
/// reset with an exhausted budget can't be requested.
#[derive(Debug, PartialEq, Eq)]
pub struct ResetGrant {
    remaining_resets: u32,
}

impl ResetGrant {
    pub fn remaining_resets(&self) -> u32 {
        self.remaining_resets
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("no manual resets left for user {user_id}")]
pub struct PolicyViolation {
    pub user_id: String,
}

/// Grant a reset regardless of credits or time of day. Still refuses when no
/// resets remain.
pub fn force_grant(snapshot: &AccountSnapshot) -> Result<ResetGrant, PolicyViolation> {
    if !snapshot.has_resets() {
        return Err(PolicyViolation {
            user_id: snapshot.user_id().to_string(),
        });
    }
    Ok(ResetGrant {
        remaining_resets: snapshot.remaining_resets(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Reason {
    NoResetsLeft,
    LowCredits { credits: u64, recovery_rate: u32 },
    NightHeadroom { projected: u64, ceiling: u64 },
    RecoveryReachesCeiling { projected: u64, ceiling: u64 },
    OutsideNightWindow,
    Forced,
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoResetsLeft => write!(f, "no resets left, wait for credits to recover"),
            Self::LowCredits {
                credits,
                recovery_rate,
            } => write!(
                f,
                "credits {} below hourly recovery {}",
                credits, recovery_rate
            ),
            Self::NightHeadroom { projected, ceiling } => write!(
                f,
                "projected {} by morning stays under ceiling {}",
                projected, ceiling
            ),
            Self::RecoveryReachesCeiling { projected, ceiling } => write!(
                f,
                "projected {} by morning reaches ceiling {}",
                projected, ceiling
            ),
            Self::OutsideNightWindow => write!(f, "credits adequate, outside night window"),
            Self::Forced => write!(f, "forced"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Decision {
    NoOp(Reason),
    Reset(ResetGrant, Reason),
}

impl Decision {
    pub fn is_reset(&self) -> bool {
        matches!(self, Self::Reset(..))
    }

    pub fn reason(&self) -> Reason {
        match self {
            Self::NoOp(reason) | Self::Reset(_, reason) => *reason,
        }
    }
}

/// Decide whether to spend a manual reset now. First matching rule wins:
///
/// 1. no resets left: no-op
/// 2. credits below one hour of recovery: reset
/// 3. inside the night window: reset if the plan ceiling is above the credits
///    projected after `lookahead_hours`, otherwise no-op
/// 4. otherwise no-op
///
/// Plans missing from `plans` have a ceiling of 0 and never reset in rule 3.
pub fn decide(
    snapshot: &AccountSnapshot,
    now: &NaiveDateTime,
    plans: &PlanTable,
    policy: &RefreshPolicy,
) -> Decision {
    if !snapshot.has_resets() {
        return Decision::NoOp(Reason::NoResetsLeft);
    }

    let grant = ResetGrant {
        remaining_resets: snapshot.remaining_resets(),
    };

    if snapshot.credits() < u64::from(snapshot.recovery_rate()) {
        return Decision::Reset(
            grant,
            Reason::LowCredits {
                credits: snapshot.credits(),
                recovery_rate: snapshot.recovery_rate(),
            },
        );
    }

    if policy.in_night_window(now) {
        let projected = policy.projected_credits(snapshot);
        let ceiling = plans.ceiling_for(snapshot.plan());
        if ceiling > projected {
            return Decision::Reset(grant, Reason::NightHeadroom { projected, ceiling });
        }
        return Decision::NoOp(Reason::RecoveryReachesCeiling { projected, ceiling });
    }

    Decision::NoOp(Reason::OutsideNightWindow)
}
