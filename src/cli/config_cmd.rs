use anyhow::Result;
use serde::Serialize;

use crate::cli::output::{OutputFormat, OutputOptions};
use crate::core::config::AppConfig;

#[derive(Serialize)]
struct PathsPayload {
    config: String,
    cookies: String,
    history: String,
}

pub fn init(_opts: &OutputOptions) -> Result<()> {
    let path = AppConfig::config_path();
    if path.exists() {
        eprintln!("Config file already exists at {}", path.display());
        eprintln!("Remove it first if you want to regenerate.");
        return Ok(());
    }

    let config = AppConfig::default();
    let path = config.save()?;
    println!("Generated config at {}", path.display());
    println!(
        "  Put your session cookie in {}",
        config.cookies_path().display()
    );
    Ok(())
}

/// Validate the config file. Returns `false` when issues were found.
pub fn check(_opts: &OutputOptions) -> Result<bool> {
    let path = AppConfig::config_path();
    if !path.exists() {
        eprintln!("No config file found at {}", path.display());
        eprintln!("Run `ck config init` to create one.");
        return Ok(true);
    }

    let config = AppConfig::load()?;
    let issues = config.validate();
    if issues.is_empty() {
        println!("Config is valid: {}", path.display());
        let plans: Vec<String> = config.plans.iter().map(|(tag, _)| tag.to_string()).collect();
        println!("  Plans: {}", plans.join(", "));
        println!(
            "  Night window from {:02}:{:02}, lookahead {}h",
            config.policy.night_window_start_hour,
            config.policy.night_window_start_minute,
            config.policy.lookahead_hours
        );
        Ok(true)
    } else {
        eprintln!("Config issues found in {}:", path.display());
        for issue in &issues {
            eprintln!("  - {}", issue);
        }
        Ok(false)
    }
}

/// Print the resolved config, cookie, and history paths.
pub fn paths(config: &AppConfig, opts: &OutputOptions) -> Result<()> {
    let payload = PathsPayload {
        config: AppConfig::config_path().display().to_string(),
        cookies: config.cookies_path().display().to_string(),
        history: config.history_path().display().to_string(),
    };
    match opts.format {
        OutputFormat::Text => {
            println!("config   {}", payload.config);
            println!("cookies  {}", payload.cookies);
            println!("history  {}", payload.history);
        }
        OutputFormat::Json => println!("{}", opts.to_json(&payload)?),
    }
    Ok(())
}
