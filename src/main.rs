mod cli;
mod core;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::core::config::AppConfig;

#[derive(Parser)]
#[command(name = "ck", about = "Credit balance tracking and reset scheduling CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output format
    #[arg(short, long, global = true)]
    format: Option<String>,

    /// Shorthand for --format json
    #[arg(short = 'j', long = "json", global = true)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Cookie file to read the session from
    #[arg(long, global = true)]
    cookies: Option<PathBuf>,

    /// History log to append to
    #[arg(long, global = true)]
    history: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show account state and the pending decision without resetting
    Status,
    /// Show account state and append it to the history log
    Check,
    /// Reset credits if the refresh policy says so
    Refresh {
        /// Reset whenever resets remain, ignoring credits and time of day
        #[arg(long)]
        force: bool,

        /// Evaluate the policy without calling the reset endpoint
        #[arg(long)]
        dry_run: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Generate default config file
    Init,
    /// Validate config file
    Check,
    /// Show config, cookie, and history file locations
    Path,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = AppConfig::load()?;
    if let Some(path) = cli.cookies {
        config.service.cookies_file = Some(path);
    }
    if let Some(path) = cli.history {
        config.service.history_file = Some(path);
    }

    let output_opts = cli::output::OutputOptions {
        format: cli::output::resolve_format(
            cli.json,
            cli.format.as_deref(),
            &config.settings.default_format,
        ),
        pretty: cli.pretty,
        use_color: cli::output::detect_color(!cli.no_color, &config.settings.color),
    };

    match cli.command {
        None | Some(Commands::Status) => cli::account_cmd::status(&config, &output_opts).await?,
        Some(Commands::Check) => cli::account_cmd::check(&config, &output_opts).await?,
        Some(Commands::Refresh { force, dry_run }) => {
            cli::account_cmd::refresh(&config, force, dry_run, &output_opts).await?
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init => cli::config_cmd::init(&output_opts)?,
            ConfigAction::Check => {
                if !cli::config_cmd::check(&output_opts)? {
                    std::process::exit(1);
                }
            }
            ConfigAction::Path => cli::config_cmd::paths(&config, &output_opts)?,
        },
    }

    Ok(())
}
