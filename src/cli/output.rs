use std::io::IsTerminal;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub pretty: bool,
    pub use_color: bool,
}

impl OutputOptions {
    /// Serialize `value` as JSON, pretty-printed when requested.
    pub fn to_json<T: serde::Serialize>(&self, value: &T) -> serde_json::Result<String> {
        if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }
}

/// Resolve the output format: `--json` wins, then `--format`, then the
/// configured default.
pub fn resolve_format(json_flag: bool, format_flag: Option<&str>, configured: &str) -> OutputFormat {
    if json_flag {
        return OutputFormat::Json;
    }
    match format_flag.unwrap_or(configured) {
        "json" => OutputFormat::Json,
        _ => OutputFormat::Text,
    }
}

/// `color_setting` is the config value (`auto|always|never`).
pub fn detect_color(color_flag: bool, color_setting: &str) -> bool {
    if !color_flag {
        return false;
    }
    match color_setting {
        "never" => false,
        "always" => true,
        _ => std::env::var("NO_COLOR").is_err() && std::io::stdout().is_terminal(),
    }
}
