//! Status command - report cache stores and connectivity

use crate::cache::{parse_origin, CacheStorage, DiskStorage};
use crate::config::{Config, ConfigManager};
use crate::error::ShellResult;
use crate::network::{ConnectivityProbe, TcpProbe};
use crate::shell::cache_target;
use crate::ui::{self, TaskSpinner, UiContext};
use std::time::Duration;

/// Execute the status command
pub async fn execute(config: &Config) -> ShellResult<()> {
    let ctx = UiContext::detect();
    let (version, manifest) = cache_target(config)?;
    let store_dir = ConfigManager::store_dir(config);
    let storage = DiskStorage::new(&store_dir);

    ui::intro(&ctx, "hubshell status");

    ui::section(&ctx, "Cache");
    ui::key_value(&ctx, "origin", &config.cache.origin);
    ui::key_value(&ctx, "store dir", &store_dir.display().to_string());
    ui::key_value(&ctx, "current version", version.as_str());

    let names = storage.names().await?;
    if names.is_empty() {
        ui::step_warn_hint(&ctx, "No cache stores", "Run: hubshell install");
    }
    for name in &names {
        let count = storage.keys(name).await?.len();
        let current = name == version.as_str();
        let label = if current {
            format!("{} entries (current)", count)
        } else {
            format!("{} entries (stale)", count)
        };
        ui::key_value_status(&ctx, name, &label, current);
    }

    let mut cached = 0;
    for key in manifest.keys() {
        if storage.lookup(version.as_str(), key).await?.is_some() {
            cached += 1;
        }
    }
    ui::key_value_status(
        &ctx,
        "manifest",
        &format!("{}/{} cached", cached, manifest.len()),
        cached == manifest.len(),
    );

    ui::section(&ctx, "Network");
    let probe = probe_for(config)?;
    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Probing {}", probe.addr()));
    let state = probe.sample().await;
    if state.is_online() {
        spinner.stop(&format!("{} is reachable", probe.addr()));
    } else {
        spinner.stop_error(&format!("{} is unreachable", probe.addr()));
    }
    ui::key_value_status(&ctx, "state", &state.to_string(), state.is_online());

    ui::section(&ctx, "Notifications");
    let enabled = config.notifications.enabled;
    ui::key_value_status(
        &ctx,
        "prompt at startup",
        if enabled { "yes" } else { "disabled" },
        enabled,
    );
    ui::remark(&ctx, "Permission is negotiated once per session and not stored");

    Ok(())
}

/// TCP probe for `network.probe_addr`, or the cache origin when unset
pub(crate) fn probe_for(config: &Config) -> ShellResult<TcpProbe> {
    let timeout = Duration::from_millis(config.network.probe_timeout_ms);
    match &config.network.probe_addr {
        Some(addr) => Ok(TcpProbe::new(addr.clone(), timeout)),
        None => TcpProbe::for_origin(&parse_origin(&config.cache.origin)?, timeout),
    }
}
