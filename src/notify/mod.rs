//! User notifications
//!
//! `PermissionGate` asks the platform for notification permission at most
//! once per session and drops every notification unless the answer was a
//! grant. A platform without notification support behaves as a denial.

mod options;
mod permission;
mod platform;

pub use options::{Notification, NotificationDefaults, NotificationOptions};
pub use permission::PermissionGate;
pub use platform::{NotificationPlatform, PlatformPermission};

use std::fmt;

/// Session notification authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionState {
    /// Not negotiated yet
    Unknown,
    Granted,
    Denied,
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Granted => write!(f, "granted"),
            Self::Denied => write!(f, "denied"),
        }
    }
}
