//! Installable application descriptor
//!
//! A static metadata record describing the application shell: its name,
//! start resource, display mode, colors and icon set. Generated once from
//! configuration and written out as JSON.

use crate::config::schema::{AppConfig, IconConfig};
use crate::error::{ShellError, ShellResult};
use serde::Serialize;

const DISPLAY_MODES: &[&str] = &["fullscreen", "standalone", "minimal-ui", "browser"];

/// Application descriptor document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppDescriptor {
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub start_url: String,
    pub display: String,
    pub orientation: String,
    pub background_color: String,
    pub theme_color: String,
    pub icons: Vec<DescriptorIcon>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptorIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl From<&IconConfig> for DescriptorIcon {
    fn from(icon: &IconConfig) -> Self {
        Self {
            src: icon.src.clone(),
            sizes: icon.sizes.clone(),
            mime_type: icon.mime_type.clone(),
        }
    }
}

impl AppDescriptor {
    /// Build and validate a descriptor from the `[app]` config section
    pub fn from_config(app: &AppConfig) -> ShellResult<Self> {
        let descriptor = Self {
            name: app.name.clone(),
            short_name: app.short_name.clone(),
            description: app.description.clone(),
            start_url: app.start_url.clone(),
            display: app.display.clone(),
            orientation: app.orientation.clone(),
            background_color: app.background_color.clone(),
            theme_color: app.theme_color.clone(),
            icons: app.icons.iter().map(DescriptorIcon::from).collect(),
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    fn validate(&self) -> ShellResult<()> {
        if self.name.trim().is_empty() {
            return Err(invalid("app.name must not be empty"));
        }
        if self.start_url.is_empty() {
            return Err(invalid("app.start_url must not be empty"));
        }
        if !DISPLAY_MODES.contains(&self.display.as_str()) {
            return Err(invalid(format!(
                "app.display must be one of {}, got '{}'",
                DISPLAY_MODES.join(", "),
                self.display
            )));
        }
        for color in [&self.background_color, &self.theme_color] {
            if !is_hex_color(color) {
                return Err(invalid(format!("'{}' is not a #rrggbb color", color)));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> ShellResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

fn invalid(reason: impl Into<String>) -> ShellError {
    ShellError::ConfigInvalid {
        path: "[app]".into(),
        reason: reason.into(),
    }
}
