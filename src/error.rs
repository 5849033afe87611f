//! Error types for hubshell
//!
//! All modules use `ShellResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for hubshell operations
pub type ShellResult<T> = Result<T, ShellError>;

/// All errors that can occur in hubshell
#[derive(Error, Debug)]
pub enum ShellError {
    // Cache lifecycle errors
    #[error("Installation of cache version {version} failed on {resource}: {reason}")]
    Install {
        version: String,
        resource: String,
        reason: String,
    },

    #[error("Cache version {0} is already being installed")]
    InstallInProgress(String),

    #[error("Cache version {0} is not installed")]
    VersionNotInstalled(String),

    #[error("Invalid cache version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("Invalid resource identifier '{resource}': {reason}")]
    InvalidResource { resource: String, reason: String },

    #[error("Cache store error in {store}: {reason}")]
    Store { store: String, reason: String },

    // Network errors
    #[error("Network fetch failed for {url}: {reason}")]
    NetworkFetch { url: String, reason: String },

    // Platform capability errors
    #[error("Platform capability unavailable: {0}")]
    PlatformUnavailable(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl ShellError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an installation error for a single manifest resource
    pub fn install(
        version: impl Into<String>,
        resource: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Install {
            version: version.into(),
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    /// Create a network fetch error
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NetworkFetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a cache store error
    pub fn store(store: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Store {
            store: store.into(),
            reason: reason.into(),
        }
    }

    /// Check if error is retryable
    ///
    /// Installs are never retried automatically; a fresh install attempt
    /// triggered from outside may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Install { .. } | Self::InstallInProgress(_) | Self::NetworkFetch { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Install { .. } => Some("Check that the origin serves every manifest resource, then run: hubshell install"),
            Self::VersionNotInstalled(_) => Some("Run: hubshell install"),
            Self::NetworkFetch { .. } => Some("The resource is not cached and the network is unreachable"),
            Self::ConfigInvalid { .. } => Some("Run: hubshell config init --force"),
            _ => None,
        }
    }
}
