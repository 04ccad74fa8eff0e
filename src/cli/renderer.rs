use colored::{control, ColoredString, Colorize};

use crate::core::formatter::{fill_percent, format_count, format_fill_bar, format_rate, format_resets};
use crate::core::maintenance::{RefreshAction, RefreshOutcome};
use crate::core::models::account::AccountSnapshot;
use crate::core::models::plan::PlanTable;
use crate::core::policy::Reason;

const BAR_WIDTH: usize = 12;

/// Render an account block as a colored (or plain) string.
///
/// Layout:
/// ```text
///  user-1 (MAX)
///   Credits   10,000 / 20,000 [██████░░░░░░]
///   Recovery  500/h
///   Resets    2 remaining
/// ```
pub fn render_snapshot(snapshot: &AccountSnapshot, plans: &PlanTable, use_color: bool) -> String {
    control::set_override(use_color);

    let mut lines: Vec<String> = Vec::new();
    let header = format!(" {} ({})", snapshot.user_id(), snapshot.plan());
    lines.push(header.bold().to_string());

    let ceiling = plans.ceiling_for(snapshot.plan());
    let credits = format_count(snapshot.credits());
    let credits_line = match fill_percent(snapshot.credits(), ceiling) {
        Some(percent) => format!(
            "{} / {} {}",
            color_by_fill(percent, &credits),
            format_count(ceiling),
            format_fill_bar(percent, BAR_WIDTH).magenta()
        ),
        None => format!("{} {}", credits, "(unknown plan ceiling)".dimmed()),
    };
    lines.push(format!("  {}   {}", "Credits".cyan(), credits_line));
    lines.push(format!(
        "  {}  {}",
        "Recovery".cyan(),
        format_rate(snapshot.recovery_rate())
    ));

    let resets = format_resets(snapshot.remaining_resets());
    let resets = if snapshot.has_resets() {
        resets.green()
    } else {
        resets.red()
    };
    lines.push(format!("  {}    {}", "Resets".cyan(), resets));

    lines.join("\n")
}

/// One-line policy verdict, e.g. "  Decision  reset (credits 100 below hourly recovery 200)".
pub fn render_decision(verdict: &str, reason: &Reason, use_color: bool) -> String {
    control::set_override(use_color);
    format!(
        "  {}  {} ({})",
        "Decision".cyan(),
        verdict.bold(),
        reason.to_string().dimmed()
    )
}

pub fn render_outcome(outcome: &RefreshOutcome, plans: &PlanTable, use_color: bool) -> String {
    let verdict = match &outcome.action {
        RefreshAction::Skipped => "no reset",
        RefreshAction::DryRun => "would reset (dry run)",
        RefreshAction::Reset { .. } => "reset done",
    };
    let mut text = render_snapshot(&outcome.snapshot, plans, use_color);
    text.push('\n');
    text.push_str(&render_decision(verdict, &outcome.reason, use_color));
    text
}

/// Color the credits green/yellow/red based on how full the account is.
fn color_by_fill(percent: f64, text: &str) -> ColoredString {
    if percent >= 25.0 {
        text.green()
    } else if percent >= 10.0 {
        text.yellow()
    } else {
        text.red()
    }
}
