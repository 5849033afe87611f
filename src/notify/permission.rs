//! Notification permission negotiation

use super::options::{NotificationDefaults, NotificationOptions};
use super::platform::{NotificationPlatform, PlatformPermission};
use super::PermissionState;
use crate::error::{ShellError, ShellResult};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Negotiates and remembers the session's notification authorization
///
/// The platform is prompted at most once per gate. Callers that arrive
/// while the prompt is pending wait on the same negotiation.
pub struct PermissionGate {
    platform: Option<Arc<dyn NotificationPlatform>>,
    decision: OnceCell<PermissionState>,
    defaults: NotificationDefaults,
}

impl PermissionGate {
    /// Create a gate; an unsupported platform is treated as absent
    pub fn new(platform: Option<Arc<dyn NotificationPlatform>>) -> Self {
        let platform = platform.filter(|p| {
            let supported = p.is_supported();
            if !supported {
                debug!("Notifications unsupported on this platform, disabling");
            }
            supported
        });

        Self {
            platform,
            decision: OnceCell::new(),
            defaults: NotificationDefaults::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: NotificationDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Whether a notification platform is present
    pub fn is_available(&self) -> bool {
        self.platform.is_some()
    }

    /// Fail with `PlatformUnavailable` when there is no usable platform
    pub fn ensure_available(&self) -> ShellResult<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(ShellError::PlatformUnavailable("notifications".to_string()))
        }
    }

    /// Resolve the permission, prompting the platform on first use
    pub async fn negotiate(&self) -> PermissionState {
        *self
            .decision
            .get_or_init(|| async {
                let Some(platform) = self.platform.as_ref() else {
                    return PermissionState::Denied;
                };

                let answer = platform.request_permission().await;
                let state = match answer {
                    PlatformPermission::Granted => PermissionState::Granted,
                    PlatformPermission::Denied | PlatformPermission::Default => {
                        PermissionState::Denied
                    }
                };
                info!("Notification permission {:?} -> {}", answer, state);
                state
            })
            .await
    }

    /// The resolved state, or `Unknown` before negotiation finishes
    pub fn state(&self) -> PermissionState {
        self.decision
            .get()
            .copied()
            .unwrap_or(PermissionState::Unknown)
    }

    /// Emit a notification if permission was granted; otherwise do nothing
    pub fn notify(&self, title: &str, options: &NotificationOptions) {
        if self.state() != PermissionState::Granted {
            debug!("Dropping notification '{}': permission {}", title, self.state());
            return;
        }

        if let Some(platform) = self.platform.as_ref() {
            platform.show(&self.defaults.resolve(title, options));
        }
    }
}
