//! Terminal implementations of the shell's UI capabilities

use super::context::UiContext;
use super::prompts;
use crate::network::NetworkState;
use crate::notify::{Notification, NotificationPlatform, PlatformPermission};
use crate::status::StatusIndicator;
use async_trait::async_trait;
use console::{style, Term};
use std::sync::atomic::{AtomicBool, Ordering};

/// Connectivity badge on stderr
///
/// Interactive terminals get a single line that is rewritten in place and
/// cleared on hide. Otherwise every change is logged as a timestamped line.
pub struct TerminalIndicator {
    fancy: bool,
    visible: AtomicBool,
}

impl TerminalIndicator {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            fancy: ctx.use_fancy_output(),
            visible: AtomicBool::new(false),
        }
    }
}

impl StatusIndicator for TerminalIndicator {
    fn show(&self, state: NetworkState) {
        let badge = match state {
            NetworkState::Online => style("● online").green().bold(),
            NetworkState::Offline => style("○ offline").red().bold(),
        };

        if self.fancy {
            let term = Term::stderr();
            term.clear_line().ok();
            term.write_str(&badge.to_string()).ok();
        } else {
            eprintln!(
                "[{}] network {}",
                chrono::Local::now().format("%H:%M:%S"),
                state
            );
        }
        self.visible.store(true, Ordering::SeqCst);
    }

    fn hide(&self) {
        if self.visible.swap(false, Ordering::SeqCst) && self.fancy {
            Term::stderr().clear_line().ok();
        }
    }
}

/// Notifications rendered as terminal notes, with a bell unless silent
pub struct TerminalNotifier {
    ctx: UiContext,
    app_name: String,
}

impl TerminalNotifier {
    pub fn new(ctx: UiContext, app_name: impl Into<String>) -> Self {
        Self {
            ctx,
            app_name: app_name.into(),
        }
    }
}

#[async_trait]
impl NotificationPlatform for TerminalNotifier {
    fn is_supported(&self) -> bool {
        true
    }

    async fn request_permission(&self) -> PlatformPermission {
        let message = format!("Allow {} to show notifications?", self.app_name);
        prompts::permission(&self.ctx, &message).await
    }

    fn show(&self, notification: &Notification) {
        let title = format!("{} {}", notification.icon, notification.title);

        if self.ctx.use_fancy_output() {
            cliclack::note(style(&title).bold(), &notification.body).ok();
            if !notification.silent {
                Term::stdout().write_str("\x07").ok();
            }
        } else if notification.body.is_empty() {
            println!("{}", title);
        } else {
            println!("{}: {}", title, notification.body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_plain_output() {
        let indicator = TerminalIndicator::new(&UiContext::non_interactive());
        indicator.show(NetworkState::Offline);
        assert!(indicator.visible.load(Ordering::SeqCst));
        indicator.hide();
        assert!(!indicator.visible.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn notifier_without_terminal_reports_dismissed() {
        let notifier = TerminalNotifier::new(UiContext::non_interactive(), "ConnectHub");
        assert!(notifier.is_supported());
        assert_eq!(notifier.request_permission().await, PlatformPermission::Default);
    }
}
