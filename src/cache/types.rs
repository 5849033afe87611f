//! Core cache data model: versions, resource keys, manifests and responses

use crate::error::{ShellError, ShellResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Generation identifier for a set of resources cached together.
///
/// The version doubles as the name of the store that holds its entries,
/// so it must be usable as a single path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheVersion(String);

impl CacheVersion {
    /// Validate and wrap a version identifier
    pub fn new(version: impl Into<String>) -> ShellResult<Self> {
        let version = version.into();
        let invalid = |reason: &str| ShellError::InvalidVersion {
            version: version.clone(),
            reason: reason.to_string(),
        };

        if version.trim().is_empty() {
            return Err(invalid("must not be empty"));
        }
        if version.contains(['/', '\\']) || version == "." || version == ".." {
            return Err(invalid("must not contain path separators"));
        }
        if version.starts_with('.') {
            return Err(invalid("must not start with '.'"));
        }

        Ok(Self(version))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse the configured origin that relative identifiers resolve against
pub fn parse_origin(origin: &str) -> ShellResult<Url> {
    let url = Url::parse(origin).map_err(|e| ShellError::InvalidResource {
        resource: origin.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ShellError::InvalidResource {
            resource: origin.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// Canonical resource identifier used as the cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKey(String);

impl ResourceKey {
    /// Resolve `raw` against `origin` and drop any fragment.
    ///
    /// `/app.css`, `app.css` and `http://origin/app.css#top` all resolve to
    /// the same key.
    pub fn resolve(origin: &Url, raw: &str) -> ShellResult<Self> {
        resolve_url(origin, raw).map(|url| Self(url.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn resolve_url(origin: &Url, raw: &str) -> ShellResult<Url> {
    let mut url = origin.join(raw.trim()).map_err(|e| ShellError::InvalidResource {
        resource: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ShellError::InvalidResource {
            resource: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    url.set_fragment(None);
    Ok(url)
}

/// Ordered, de-duplicated set of resources pre-populated at install time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestSet {
    keys: Vec<ResourceKey>,
}

impl ManifestSet {
    /// Resolve every raw identifier against `origin`, keeping the first
    /// occurrence of each canonical key.
    ///
    /// Every entry must share the origin's scheme, host and port.
    pub fn resolve<S: AsRef<str>>(origin: &Url, resources: &[S]) -> ShellResult<Self> {
        let mut keys: Vec<ResourceKey> = Vec::with_capacity(resources.len());
        for raw in resources {
            let url = resolve_url(origin, raw.as_ref())?;
            if url.origin() != origin.origin() {
                return Err(ShellError::InvalidResource {
                    resource: raw.as_ref().to_string(),
                    reason: format!("not under origin {}", origin.origin().ascii_serialization()),
                });
            }
            let key = ResourceKey(url.into());
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        Ok(Self { keys })
    }

    pub fn keys(&self) -> &[ResourceKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// An outbound resource request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub key: ResourceKey,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: impl Into<String>, key: ResourceKey) -> Self {
        Self {
            method: method.into().to_ascii_uppercase(),
            key,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// A GET request for `key`
    pub fn get(key: ResourceKey) -> Self {
        Self::new("GET", key)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Only GET requests are eligible for cache lookup
    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

/// A captured response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value matching `name`, case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A response stored under a cache version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub response: Response,
    pub version: CacheVersion,
    pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(response: Response, version: CacheVersion) -> Self {
        Self {
            response,
            version,
            stored_at: Utc::now(),
        }
    }
}
