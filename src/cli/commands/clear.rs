//! Clear command - delete cache stores

use crate::cache::{CacheStorage, CacheVersion, DiskStorage};
use crate::cli::args::ClearArgs;
use crate::config::{Config, ConfigManager};
use crate::error::ShellResult;
use crate::ui::{self, UiContext};

/// Execute the clear command
pub async fn execute(args: ClearArgs, config: &Config) -> ShellResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let storage = DiskStorage::new(ConfigManager::store_dir(config));

    let targets = match &args.version {
        Some(v) => vec![CacheVersion::new(v.as_str())?.to_string()],
        None => storage.names().await?,
    };

    if targets.is_empty() {
        ui::step_info(&ctx, "No cache stores to delete");
        return Ok(());
    }

    let prompt = format!("Delete {} cache store(s)?", targets.len());
    if !ui::confirm(&ctx, &prompt, false).await? {
        ui::step_warn_hint(&ctx, "Nothing deleted", "Pass --yes to skip confirmation");
        return Ok(());
    }

    let mut deleted = 0;
    for name in &targets {
        if storage.delete(name).await? {
            ui::step_ok(&ctx, &format!("Deleted {}", name));
            deleted += 1;
        } else {
            ui::step_warn(&ctx, &format!("No store named {}", name));
        }
    }

    ui::outro_success(&ctx, &format!("Deleted {} store(s)", deleted));
    Ok(())
}
