//! Notification platform abstraction

use super::options::Notification;
use async_trait::async_trait;

/// Raw answer from a platform permission prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformPermission {
    Granted,
    Denied,
    /// The user dismissed the prompt without choosing
    Default,
}

/// Host facility that can ask for permission and display notifications
#[async_trait]
pub trait NotificationPlatform: Send + Sync {
    /// Whether notifications can be shown at all
    fn is_supported(&self) -> bool;

    /// Ask the user for notification permission
    async fn request_permission(&self) -> PlatformPermission;

    /// Display a resolved notification
    fn show(&self, notification: &Notification);
}
