//! Watch command - run the shell in the foreground

use super::disk_cache;
use super::status::probe_for;
use crate::cli::args::WatchArgs;
use crate::config::{Config, ConfigManager};
use crate::error::{ShellError, ShellResult};
use crate::network::{ConnectivityProbe, NetworkState};
use crate::shell::{Capabilities, Shell};
use crate::ui::{self, TerminalIndicator, TerminalNotifier, UiContext};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

/// Execute the watch command
pub async fn execute(args: WatchArgs, config: &Config) -> ShellResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);

    let mut config = config.clone();
    if let Some(secs) = args.interval {
        config.network.poll_interval_secs = secs;
    }
    ConfigManager::ensure_data_dirs(&config).await?;

    let capabilities = Capabilities {
        indicator: Some(Arc::new(TerminalIndicator::new(&ctx))),
        notifications: Some(Arc::new(TerminalNotifier::new(
            ctx.clone(),
            config.app.short_name.clone(),
        ))),
    };
    let shell = Shell::new(&config, disk_cache(&config), capabilities)?;
    let probe: Arc<dyn ConnectivityProbe> = Arc::new(probe_for(&config)?);
    let events = args.stdin_events.then(stdin_events);

    ui::intro(&ctx, "hubshell watch");
    let running = shell.start(events, probe).await;
    ui::remark(&ctx, "Press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| ShellError::io("waiting for Ctrl-C", e))?;
    println!();

    let registration = running.stop();
    if registration.is_finished() {
        match registration.wait().await {
            Ok(_) => ui::step_ok_detail(&ctx, "Cache registered", shell.version().as_str()),
            Err(e) => ui::step_error_detail(&ctx, "Cache registration failed", &e.to_string()),
        }
    } else {
        registration.cancel();
        ui::step_warn(&ctx, "Cache registration cancelled before it finished");
    }

    ui::outro_success(&ctx, "Stopped");
    Ok(())
}

/// Forward connectivity events typed on stdin
fn stdin_events() -> mpsc::Receiver<NetworkState> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            let Some(state) = parse_event(&line) else {
                warn!("Ignoring unknown connectivity event '{}'", line.trim());
                continue;
            };
            if tx.send(state).await.is_err() {
                break;
            }
        }
    });
    rx
}

fn parse_event(line: &str) -> Option<NetworkState> {
    match line.trim().to_ascii_lowercase().as_str() {
        "online" | "up" => Some(NetworkState::Online),
        "offline" | "down" => Some(NetworkState::Offline),
        _ => None,
    }
}
