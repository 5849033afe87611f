//! Configuration schema for hubshell
//!
//! Configuration is stored at `~/.config/hubshell/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Offline cache settings
    pub cache: CacheConfig,

    /// Connectivity monitoring settings
    pub network: NetworkConfig,

    /// Status indicator settings
    pub status: StatusConfig,

    /// Notification settings
    pub notifications: NotificationsConfig,

    /// Installable application descriptor
    pub app: AppConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Offline cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Current cache generation; bump on every deploy
    pub version: String,

    /// Origin that relative resource identifiers resolve against
    pub origin: String,

    /// Resources pre-populated at install time, in order
    pub manifest: Vec<String>,

    /// Override for the store directory (defaults to the data dir)
    pub store_dir: Option<PathBuf>,

    /// Largest response body read from the network, in bytes
    pub max_body_bytes: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            version: "connecthub-v1".to_string(),
            origin: "http://localhost:8080".to_string(),
            manifest: vec![
                "/".to_string(),
                "/styles.css".to_string(),
                "/script.js".to_string(),
                "/translations.js".to_string(),
            ],
            store_dir: None,
            max_body_bytes: crate::fetch::DEFAULT_BODY_LIMIT,
        }
    }
}

/// Connectivity monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Seconds between connectivity polls
    pub poll_interval_secs: u64,

    /// host:port the TCP probe connects to (defaults to the cache origin)
    pub probe_addr: Option<String>,

    /// Probe connect timeout in milliseconds
    pub probe_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
            probe_addr: None,
            probe_timeout_ms: 2000,
        }
    }
}

/// Status indicator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Delay before the online indicator hides itself
    pub online_hide_delay_ms: u64,

    /// Emit a notification on every connectivity transition
    pub notify_on_transition: bool,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            online_hide_delay_ms: 3000,
            notify_on_transition: false,
        }
    }
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Ask for notification permission at startup
    pub enabled: bool,

    /// Send a welcome notification once permission is granted
    pub welcome: bool,

    /// Icon used when a notification does not name one
    pub default_icon: String,

    /// Grouping tag used when a notification does not name one
    pub default_tag: String,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            welcome: true,
            default_icon: "🌐".to_string(),
            default_tag: "connecthub-notification".to_string(),
        }
    }
}

/// Installable application descriptor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub short_name: String,
    pub description: String,
    pub start_url: String,
    pub display: String,
    pub orientation: String,
    pub background_color: String,
    pub theme_color: String,
    pub icons: Vec<IconConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "ConnectHub - منصة التواصل الاجتماعي المتقدمة".to_string(),
            short_name: "ConnectHub".to_string(),
            description: "منصة تواصل اجتماعي حديثة ومبتكرة".to_string(),
            start_url: "/".to_string(),
            display: "standalone".to_string(),
            orientation: "portrait-primary".to_string(),
            background_color: "#f0f2f5".to_string(),
            theme_color: "#667eea".to_string(),
            icons: vec![IconConfig::default()],
        }
    }
}

/// A single descriptor icon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IconConfig {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            src: "data:image/svg+xml,%3Csvg xmlns='http://www.w3.org/2000/svg' width='192' height='192' viewBox='0 0 24 24'%3E%3Cpath fill='%23667eea' d='M12 2C6.48 2 2 6.48 2 12s4.48 10 10 10 10-4.48 10-10S17.52 2 12 2zm-2 15l-5-5 1.41-1.41L10 14.17l7.59-7.59L19 8l-9 9z'/%3E%3C/svg%3E".to_string(),
            sizes: "192x192".to_string(),
            mime_type: "image/svg+xml".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[cache]"));
        assert!(toml.contains("[network]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.cache.version, "connecthub-v1");
        assert_eq!(config.network.poll_interval_secs, 30);
        assert_eq!(config.status.online_hide_delay_ms, 3000);
        assert_eq!(config.cache.max_body_bytes, 64 * 1024 * 1024);
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [cache]
            version = "connecthub-v2"
            manifest = ["/", "/app.css"]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cache.version, "connecthub-v2");
        assert_eq!(config.cache.manifest, vec!["/", "/app.css"]);
        assert_eq!(config.cache.origin, "http://localhost:8080"); // default preserved
    }
}
