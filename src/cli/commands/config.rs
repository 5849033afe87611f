//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{ShellError, ShellResult};
use crate::ui::{self, UiContext};
use std::path::PathBuf;

const VALID_KEYS: &[&str] = &[
    "general.verbose",
    "general.log_format",
    "cache.version",
    "cache.origin",
    "cache.manifest",
    "cache.store_dir",
    "cache.max_body_bytes",
    "network.poll_interval_secs",
    "network.probe_addr",
    "network.probe_timeout_ms",
    "status.online_hide_delay_ms",
    "status.notify_on_transition",
    "notifications.enabled",
    "notifications.welcome",
    "notifications.default_icon",
    "notifications.default_tag",
    "app.name",
    "app.short_name",
    "app.description",
    "app.start_url",
    "app.display",
    "app.orientation",
    "app.background_color",
    "app.theme_color",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> ShellResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, config, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> ShellResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> ShellResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());
    Ok(())
}

async fn set_value(manager: &ConfigManager, config: &Config, key: &str, value: &str) -> ShellResult<()> {
    let ctx = UiContext::detect();
    let mut config = config.clone();

    if let Err(e) = apply(&mut config, key, value) {
        ui::step_error_detail(&ctx, "Cannot set config value", &e.to_string());
        eprintln!("Valid keys:");
        for key in VALID_KEYS {
            eprintln!("  {}", key);
        }
        return Err(e);
    }

    manager.save(&config).await?;
    ui::step_ok(&ctx, &format!("Set {} = {}", key, value));
    Ok(())
}

/// Apply a dot-separated `key = value` assignment
fn apply(config: &mut Config, key: &str, value: &str) -> ShellResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "verbose"] => config.general.verbose = parse_bool(value)?,
        ["general", "log_format"] => match value {
            "text" | "json" => config.general.log_format = value.to_string(),
            _ => return Err(ShellError::User("log_format must be 'text' or 'json'".into())),
        },

        ["cache", "version"] => config.cache.version = value.to_string(),
        ["cache", "origin"] => config.cache.origin = value.to_string(),
        ["cache", "manifest"] => {
            config.cache.manifest = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        ["cache", "store_dir"] => config.cache.store_dir = Some(PathBuf::from(value)),
        ["cache", "max_body_bytes"] => config.cache.max_body_bytes = parse_u64(value)?,

        ["network", "poll_interval_secs"] => config.network.poll_interval_secs = parse_u64(value)?,
        ["network", "probe_addr"] => config.network.probe_addr = Some(value.to_string()),
        ["network", "probe_timeout_ms"] => config.network.probe_timeout_ms = parse_u64(value)?,

        ["status", "online_hide_delay_ms"] => config.status.online_hide_delay_ms = parse_u64(value)?,
        ["status", "notify_on_transition"] => config.status.notify_on_transition = parse_bool(value)?,

        ["notifications", "enabled"] => config.notifications.enabled = parse_bool(value)?,
        ["notifications", "welcome"] => config.notifications.welcome = parse_bool(value)?,
        ["notifications", "default_icon"] => config.notifications.default_icon = value.to_string(),
        ["notifications", "default_tag"] => config.notifications.default_tag = value.to_string(),

        ["app", "name"] => config.app.name = value.to_string(),
        ["app", "short_name"] => config.app.short_name = value.to_string(),
        ["app", "description"] => config.app.description = value.to_string(),
        ["app", "start_url"] => config.app.start_url = value.to_string(),
        ["app", "display"] => config.app.display = value.to_string(),
        ["app", "orientation"] => config.app.orientation = value.to_string(),
        ["app", "background_color"] => config.app.background_color = value.to_string(),
        ["app", "theme_color"] => config.app.theme_color = value.to_string(),

        _ => return Err(ShellError::User(format!("Unknown config key: {}", key))),
    }

    Ok(())
}

fn parse_bool(value: &str) -> ShellResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(ShellError::User(format!("Invalid boolean value: {}", value))),
    }
}

fn parse_u64(value: &str) -> ShellResult<u64> {
    value
        .parse()
        .map_err(|_| ShellError::User(format!("Invalid number: {}", value)))
}
