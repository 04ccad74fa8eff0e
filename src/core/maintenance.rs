use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::core::history::HistoryLog;
use crate::core::models::account::AccountSnapshot;
use crate::core::models::history::HistoryRecord;
use crate::core::models::plan::PlanTable;
use crate::core::policy::{decide, force_grant, Decision, Reason, RefreshPolicy};
use crate::core::service::{load_snapshot, AccountSource, ResetAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// Let the policy decide
    #[default]
    Policy,
    /// Reset whenever resets remain
    Force,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RefreshAction {
    Skipped,
    DryRun,
    Reset { response: serde_json::Value },
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshOutcome {
    pub snapshot: AccountSnapshot,
    pub reason: Reason,
    #[serde(flatten)]
    pub action: RefreshAction,
}

/// Fetch a snapshot and append it to the history log. Nothing is written
/// unless every read succeeded.
pub async fn check<S: AccountSource>(
    source: &S,
    plans: &PlanTable,
    log: &HistoryLog,
    now: NaiveDateTime,
) -> Result<AccountSnapshot> {
    let snapshot = load_snapshot(source, plans).await?;
    log.append(&HistoryRecord::new(now, snapshot.credits()))?;
    Ok(snapshot)
}

/// Fetch a snapshot, decide, and reset if the decision says so.
pub async fn refresh<S: AccountSource + ResetAction>(
    service: &S,
    plans: &PlanTable,
    policy: &RefreshPolicy,
    now: NaiveDateTime,
    mode: RefreshMode,
    dry_run: bool,
) -> Result<RefreshOutcome> {
    let snapshot = load_snapshot(service, plans).await?;

    let decision = match mode {
        RefreshMode::Policy => decide(&snapshot, &now, plans, policy),
        RefreshMode::Force => match force_grant(&snapshot) {
            Ok(grant) => Decision::Reset(grant, Reason::Forced),
            Err(violation) => {
                tracing::info!(%violation, "forced refresh skipped");
                Decision::NoOp(Reason::NoResetsLeft)
            }
        },
    };
    tracing::info!(
        reset = decision.is_reset(),
        reason = %decision.reason(),
        "refresh decision"
    );

    let reason = decision.reason();
    let action = match decision {
        Decision::NoOp(_) => RefreshAction::Skipped,
        Decision::Reset(_, _) if dry_run => RefreshAction::DryRun,
        Decision::Reset(grant, _) => RefreshAction::Reset {
            response: service.reset(grant).await?,
        },
    };

    Ok(RefreshOutcome {
        snapshot,
        reason,
        action,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::service::fake::FakeAccount;
    use crate::core::service::Operation;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    async fn run(account: &FakeAccount, now: NaiveDateTime, mode: RefreshMode) -> RefreshOutcome {
        refresh(
            account,
            &PlanTable::default(),
            &RefreshPolicy::default(),
            now,
            mode,
            false,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn check_appends_one_line_with_fetched_credits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credits_history.ndjson");
        std::fs::write(&path, "{\"timestamp\":\"earlier\",\"credits_left\":5}\n").unwrap();
        let log = HistoryLog::new(&path);
        let account = FakeAccount::new("pro", 6_543, 200, 1);

        let snapshot = check(&account, &PlanTable::default(), &log, at(9, 15))
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let last: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(last["credits_left"], 6_543);
        assert_eq!(last["timestamp"], "2025-06-01-09-15-00");
        assert_eq!(snapshot.credits(), 6_543);
        assert_eq!(account.resets.get(), 0);
    }

    #[tokio::test]
    async fn check_writes_nothing_when_a_read_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credits_history.ndjson");
        let log = HistoryLog::new(&path);
        let account = FakeAccount::new("pro", 100, 200, 1).failing_on(Operation::ResetInfo);

        assert!(check(&account, &PlanTable::default(), &log, at(9, 15))
            .await
            .is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn refresh_resets_on_low_credits() {
        let account = FakeAccount::new("pro", 100, 200, 3);
        let outcome = run(&account, at(14, 0), RefreshMode::Policy).await;
        assert!(matches!(outcome.action, RefreshAction::Reset { .. }));
        assert_eq!(account.resets.get(), 1);
    }

    #[tokio::test]
    async fn refresh_skips_when_no_resets_left() {
        let account = FakeAccount::new("pro", 0, 200, 0);
        let outcome = run(&account, at(23, 45), RefreshMode::Policy).await;
        assert_eq!(outcome.action, RefreshAction::Skipped);
        assert_eq!(outcome.reason, Reason::NoResetsLeft);
        assert!(!account.calls.borrow().contains(&Operation::Reset));
    }

    #[tokio::test]
    async fn refresh_night_headroom_resets() {
        let account = FakeAccount::new("max", 10_000, 500, 2);
        let outcome = run(&account, at(23, 45), RefreshMode::Policy).await;
        assert!(matches!(outcome.action, RefreshAction::Reset { .. }));
    }

    #[tokio::test]
    async fn refresh_near_ceiling_skips() {
        let account = FakeAccount::new("max", 19_000, 500, 1);
        let outcome = run(&account, at(23, 45), RefreshMode::Policy).await;
        assert_eq!(outcome.action, RefreshAction::Skipped);
        assert_eq!(account.resets.get(), 0);
    }

    #[tokio::test]
    async fn forced_refresh_ignores_thresholds() {
        let account = FakeAccount::new("max", 19_000, 500, 1);
        let outcome = run(&account, at(10, 0), RefreshMode::Force).await;
        assert_eq!(outcome.reason, Reason::Forced);
        assert_eq!(account.resets.get(), 1);
    }

    #[tokio::test]
    async fn forced_refresh_still_needs_resets() {
        let account = FakeAccount::new("max", 19_000, 500, 0);
        let outcome = run(&account, at(10, 0), RefreshMode::Force).await;
        assert_eq!(outcome.action, RefreshAction::Skipped);
        assert_eq!(account.resets.get(), 0);
    }

    #[tokio::test]
    async fn dry_run_never_calls_reset() {
        let account = FakeAccount::new("pro", 0, 200, 2);
        let outcome = refresh(
            &account,
            &PlanTable::default(),
            &RefreshPolicy::default(),
            at(12, 0),
            RefreshMode::Policy,
            true,
        )
        .await
        .unwrap();
        assert_eq!(outcome.action, RefreshAction::DryRun);
        assert_eq!(account.resets.get(), 0);
    }

    #[tokio::test]
    async fn failed_read_aborts_before_reset() {
        let account = FakeAccount::new("pro", 0, 200, 2).failing_on(Operation::CreditInfo);
        let result = refresh(
            &account,
            &PlanTable::default(),
            &RefreshPolicy::default(),
            at(12, 0),
            RefreshMode::Force,
            false,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(*account.calls.borrow(), vec![Operation::CreditInfo]);
    }

    #[tokio::test]
    async fn failed_reset_surfaces_error() {
        let account = FakeAccount::new("pro", 0, 200, 2).failing_on(Operation::Reset);
        let result = refresh(
            &account,
            &PlanTable::default(),
            &RefreshPolicy::default(),
            at(12, 0),
            RefreshMode::Policy,
            false,
        )
        .await;
        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("HTTP 500"));
    }
}
