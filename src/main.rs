//! hubshell - Offline-first application shell
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use hubshell::cli::{commands, Cli, Commands};
use hubshell::config::{Config, ConfigManager};
use hubshell::error::ShellResult;
use hubshell::ui;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ShellResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    // A broken config file must not lock the user out of `config init --force`
    let config = match config_manager.load().await {
        Ok(config) => config,
        Err(e) if matches!(cli.command, Commands::Config(_)) => {
            eprintln!("{} {}", style("Warning:").yellow(), e);
            Config::default()
        }
        Err(e) => return Err(e),
    };

    init_logging(cli.verbose, &config);
    ui::init_theme();

    match cli.command {
        Commands::Install(args) => commands::install(args, &config).await,
        Commands::Fetch(args) => commands::fetch(args, &config).await,
        Commands::Status => commands::status(&config).await,
        Commands::Watch(args) => commands::watch(args, &config).await,
        Commands::Clear(args) => commands::clear(args, &config).await,
        Commands::Descriptor(args) => commands::descriptor(args, &config).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
    }
}

/// 0 = warn, 1 = info, 2+ = debug; `general.verbose` raises the floor to info
fn init_logging(verbose: u8, config: &Config) {
    let level = match verbose {
        0 if config.general.verbose => 1,
        n => n,
    };
    let filter = match level {
        0 => EnvFilter::new("hubshell=warn"),
        1 => EnvFilter::new("hubshell=info"),
        _ => EnvFilter::new("hubshell=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
