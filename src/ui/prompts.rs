//! Interactive prompts with CI/non-interactive fallback

use super::context::UiContext;
use crate::error::{ShellError, ShellResult};
use crate::notify::PlatformPermission;

/// Prompt for confirmation, returns default if non-interactive or auto-yes
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> ShellResult<bool> {
    if ctx.auto_yes() {
        println!("  {} (auto-approved)", message);
        return Ok(true);
    }

    if !ctx.is_interactive() {
        return Ok(default);
    }

    let message = message.to_string();
    let result = tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message).initial_value(default).interact()
    })
    .await
    .map_err(|e| ShellError::User(format!("Prompt task failed: {}", e)))?;

    result.map_err(|e| ShellError::User(format!("Prompt failed: {}", e)))
}

/// Ask whether notifications may be shown.
///
/// Without a terminal the prompt counts as dismissed unless auto-yes is
/// set. Cancelling the prompt also counts as dismissed.
pub async fn permission(ctx: &UiContext, message: &str) -> PlatformPermission {
    if ctx.auto_yes() {
        return PlatformPermission::Granted;
    }

    if !ctx.is_interactive() {
        return PlatformPermission::Default;
    }

    let message = message.to_string();
    let answer = tokio::task::spawn_blocking(move || {
        cliclack::select(&message)
            .item(PlatformPermission::Granted, "Allow", "")
            .item(PlatformPermission::Denied, "Block", "")
            .item(PlatformPermission::Default, "Not now", "ask next session")
            .interact()
    })
    .await;

    match answer {
        Ok(Ok(choice)) => choice,
        _ => PlatformPermission::Default,
    }
}
