use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;

use crate::cli::output::{OutputFormat, OutputOptions};
use crate::cli::renderer;
use crate::core::auth::read_session_cookie;
use crate::core::config::AppConfig;
use crate::core::history::HistoryLog;
use crate::core::maintenance::{self, RefreshMode};
use crate::core::models::account::AccountSnapshot;
use crate::core::policy::{decide, Reason};
use crate::core::service::http::{ClientConfig, HttpAccountService};
use crate::core::service::load_snapshot;

#[derive(Serialize)]
struct StatusPayload<'a> {
    #[serde(flatten)]
    snapshot: &'a AccountSnapshot,
    reset_available: bool,
    reset_due: bool,
    decision: Reason,
}

#[derive(Serialize)]
struct CheckPayload<'a> {
    #[serde(flatten)]
    snapshot: &'a AccountSnapshot,
    history_file: String,
}

fn connect(config: &AppConfig) -> Result<HttpAccountService> {
    let cookie = read_session_cookie(&config.cookies_path())?;
    let service = HttpAccountService::new(ClientConfig {
        base_url: config.service.base_url.clone(),
        user_agent: config.service.user_agent.clone(),
        cookie,
    })?;
    Ok(service)
}

/// Show the account and what the policy would do, without resetting or logging.
pub async fn status(config: &AppConfig, opts: &OutputOptions) -> Result<()> {
    let service = connect(config)?;
    let snapshot = load_snapshot(&service, &config.plans).await?;
    let now = Local::now().naive_local();
    let decision = decide(&snapshot, &now, &config.plans, &config.policy);

    match opts.format {
        OutputFormat::Text => {
            let verdict = if decision.is_reset() {
                "reset due"
            } else if snapshot.has_resets() {
                "reset available, not due"
            } else {
                "no resets left"
            };
            println!(
                "{}\n{}",
                renderer::render_snapshot(&snapshot, &config.plans, opts.use_color),
                renderer::render_decision(verdict, &decision.reason(), opts.use_color)
            );
        }
        OutputFormat::Json => {
            let payload = StatusPayload {
                snapshot: &snapshot,
                reset_available: snapshot.has_resets(),
                reset_due: decision.is_reset(),
                decision: decision.reason(),
            };
            println!("{}", opts.to_json(&payload)?);
        }
    }
    Ok(())
}

/// Show the account and append its balance to the history log.
pub async fn check(config: &AppConfig, opts: &OutputOptions) -> Result<()> {
    let service = connect(config)?;
    let log = HistoryLog::new(config.history_path());
    let now = Local::now().naive_local();
    let snapshot = maintenance::check(&service, &config.plans, &log, now)
        .await
        .context("Account check failed")?;

    match opts.format {
        OutputFormat::Text => {
            println!(
                "{}",
                renderer::render_snapshot(&snapshot, &config.plans, opts.use_color)
            );
            println!("  Logged to {}", log.path().display());
        }
        OutputFormat::Json => {
            let payload = CheckPayload {
                snapshot: &snapshot,
                history_file: log.path().display().to_string(),
            };
            println!("{}", opts.to_json(&payload)?);
        }
    }
    Ok(())
}

/// Apply the refresh policy (or force a reset) and report what happened.
pub async fn refresh(
    config: &AppConfig,
    force: bool,
    dry_run: bool,
    opts: &OutputOptions,
) -> Result<()> {
    let service = connect(config)?;
    let mode = if force {
        RefreshMode::Force
    } else {
        RefreshMode::Policy
    };
    let now = Local::now().naive_local();
    let outcome = maintenance::refresh(
        &service,
        &config.plans,
        &config.policy,
        now,
        mode,
        dry_run,
    )
    .await
    .context("Refresh failed")?;

    match opts.format {
        OutputFormat::Text => {
            println!(
                "{}",
                renderer::render_outcome(&outcome, &config.plans, opts.use_color)
            );
        }
        OutputFormat::Json => println!("{}", opts.to_json(&outcome)?),
    }
    Ok(())
}
