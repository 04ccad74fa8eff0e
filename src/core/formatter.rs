/// Returns "12,345" with thousands separators.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Percentage of `ceiling` held by `credits`, capped at 100.
/// Returns `None` when the ceiling is unknown (0).
pub fn fill_percent(credits: u64, ceiling: u64) -> Option<f64> {
    if ceiling == 0 {
        return None;
    }
    Some((credits as f64 / ceiling as f64 * 100.0).min(100.0))
}

/// Returns "[████████░░░░]" where █ = held portion, ░ = missing portion.
/// Width is the number of block characters inside the brackets.
pub fn format_fill_bar(filled_percent: f64, width: usize) -> String {
    let filled_percent = filled_percent.clamp(0.0, 100.0);
    let filled_blocks = ((filled_percent / 100.0) * width as f64).round() as usize;
    let empty_blocks = width.saturating_sub(filled_blocks);

    format!("[{}{}]", "█".repeat(filled_blocks), "░".repeat(empty_blocks))
}

/// Returns "500/h".
pub fn format_rate(per_hour: u32) -> String {
    format!("{}/h", format_count(u64::from(per_hour)))
}

/// Returns "2 remaining", "1 remaining" or "none left".
pub fn format_resets(remaining: u32) -> String {
    if remaining == 0 {
        "none left".to_string()
    } else {
        format!("{} remaining", remaining)
    }
}
