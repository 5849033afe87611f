//! Notification options and defaults

use crate::config::schema::NotificationsConfig;
use crate::error::ShellResult;
use serde::{Deserialize, Serialize};

/// Caller-supplied notification options.
///
/// Only the recognized fields are kept; anything else in a JSON payload
/// is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NotificationOptions {
    /// Glyph or URL shown with the notification
    pub icon: Option<String>,
    pub body: Option<String>,
    /// Suppress the alert sound
    pub silent: Option<bool>,
    /// Dedup/grouping key
    pub tag: Option<String>,
    /// Keep the notification until the user acts on it
    pub require_interaction: Option<bool>,
}

impl NotificationOptions {
    /// Parse options from a JSON object
    pub fn from_json(json: &str) -> ShellResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = Some(silent);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// A fully resolved notification handed to the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub icon: String,
    pub body: String,
    pub silent: bool,
    pub tag: String,
    pub require_interaction: bool,
}

/// Values filled in for options the caller left out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDefaults {
    pub icon: String,
    pub tag: String,
}

impl NotificationDefaults {
    pub fn from_config(config: &NotificationsConfig) -> Self {
        Self {
            icon: config.default_icon.clone(),
            tag: config.default_tag.clone(),
        }
    }

    pub fn resolve(&self, title: &str, options: &NotificationOptions) -> Notification {
        Notification {
            title: title.to_string(),
            icon: options.icon.clone().unwrap_or_else(|| self.icon.clone()),
            body: options.body.clone().unwrap_or_default(),
            silent: options.silent.unwrap_or(false),
            tag: options.tag.clone().unwrap_or_else(|| self.tag.clone()),
            require_interaction: options.require_interaction.unwrap_or(false),
        }
    }
}

impl Default for NotificationDefaults {
    fn default() -> Self {
        Self::from_config(&NotificationsConfig::default())
    }
}
