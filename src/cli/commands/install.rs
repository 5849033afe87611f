//! Install command - populate a cache version from its manifest

use super::disk_cache;
use crate::cache::{CacheVersion, ResourceKey};
use crate::cli::args::InstallArgs;
use crate::config::{Config, ConfigManager};
use crate::error::ShellResult;
use crate::shell::cache_target;
use crate::ui::{self, InstallProgress, UiContext};

/// Execute the install command
pub async fn execute(args: InstallArgs, config: &Config) -> ShellResult<()> {
    let ctx = UiContext::detect();
    let (configured, manifest) = cache_target(config)?;
    let version = match args.version {
        Some(v) => CacheVersion::new(v)?,
        None => configured,
    };

    ConfigManager::ensure_data_dirs(config).await?;
    let cache = disk_cache(config);

    ui::intro(&ctx, "hubshell install");

    let progress = InstallProgress::new(&ctx, version.as_str(), manifest.len());
    let result = cache
        .install_with_progress(&manifest, &version, &|key: &ResourceKey| {
            progress.on_stored(key)
        })
        .await;
    progress.finish();
    result?;

    ui::step_ok_detail(&ctx, "Installed", version.as_str());

    if args.no_activate {
        ui::remark(&ctx, "Not activated; existing stores were left in place");
        ui::outro_success(&ctx, &format!("{} is waiting", version));
        return Ok(());
    }

    let evicted = cache.activate(&version).await?;
    for name in &evicted {
        ui::step_info(&ctx, &format!("Evicted stale store {}", name));
    }

    ui::outro_success(&ctx, &format!("{} is serving", version));
    Ok(())
}
