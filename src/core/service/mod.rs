pub mod http;
pub mod wire;

use thiserror::Error;

use crate::core::models::account::{AccountSnapshot, SnapshotError};
use crate::core::models::plan::PlanTable;
use crate::core::policy::ResetGrant;
use wire::{CreditInfo, RecoveryInfo, ResetInfo};

/// Remote calls the client makes, one per endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreditInfo,
    RecoveryInfo,
    ResetInfo,
    Reset,
}

impl Operation {
    pub fn path(&self) -> &'static str {
        match self {
            Self::CreditInfo => "/api/user/credits",
            Self::RecoveryInfo => "/api/user/credit-recovery",
            Self::ResetInfo | Self::Reset => "/api/user/credit-reset",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreditInfo => write!(f, "fetch credit info"),
            Self::RecoveryInfo => write!(f, "fetch recovery info"),
            Self::ResetInfo => write!(f, "fetch reset info"),
            Self::Reset => write!(f, "credit reset"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{operation} failed: HTTP {status}: {body}")]
    Status {
        operation: Operation,
        status: u16,
        body: String,
    },
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },
    #[error("{operation}: failed to parse response: {message}")]
    Decode {
        operation: Operation,
        message: String,
    },
    #[error("endpoint must use HTTPS, got: {0}")]
    InsecureEndpoint(String),
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Read side of the remote account.
#[allow(async_fn_in_trait)]
pub trait AccountSource {
    async fn credit_info(&self) -> Result<CreditInfo, ServiceError>;
    async fn recovery_info(&self) -> Result<RecoveryInfo, ServiceError>;
    async fn reset_info(&self) -> Result<ResetInfo, ServiceError>;
}

/// The one write the client performs. Consumes a [`ResetGrant`], so every
/// call is backed by a policy decision made on a snapshot with resets left.
#[allow(async_fn_in_trait)]
pub trait ResetAction {
    async fn reset(&self, grant: ResetGrant) -> Result<serde_json::Value, ServiceError>;
}

/// Validate that a base URL uses HTTPS before any cookie is sent to it.
pub fn validate_endpoint(url: &str) -> Result<(), ServiceError> {
    if !url.starts_with("https://") {
        return Err(ServiceError::InsecureEndpoint(url.to_string()));
    }
    Ok(())
}

/// Fetch a fresh snapshot: credit info, then recovery info, then reset info.
/// The first failure aborts the rest.
pub async fn load_snapshot<S: AccountSource>(
    source: &S,
    plans: &PlanTable,
) -> Result<AccountSnapshot, LoadError> {
    let credit = source.credit_info().await?;
    let recovery = source.recovery_info().await?;
    let reset = source.reset_info().await?;

    if !credit.plan.is_known() {
        tracing::warn!(plan = %credit.plan, "unrecognized plan, treating its ceiling as 0");
    }

    let recovery_rate = match recovery.recovery_rate {
        Some(rate) => rate,
        None => {
            let fallback = plans
                .fallback_rate_for(&credit.plan)
                .ok_or_else(|| SnapshotError::MissingRecoveryRate(credit.plan.clone()))?;
            tracing::warn!(
                plan = %credit.plan,
                fallback,
                "service reported no recovery rate, using plan fallback"
            );
            i64::from(fallback)
        }
    };

    let snapshot = AccountSnapshot::new(
        credit.user_id,
        credit.plan,
        credit.credits,
        recovery_rate,
        reset.remaining_resets,
    )?;
    tracing::debug!(?snapshot, "loaded account snapshot");
    Ok(snapshot)
}
