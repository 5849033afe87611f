//! Point-in-time connectivity probes

use super::NetworkState;
use crate::error::{ShellError, ShellResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;
use url::Url;

/// Best-effort connectivity flag sampled by the polling loop
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn sample(&self) -> NetworkState;
}

/// Probe that reports online when a TCP connection to `addr` succeeds
/// within the timeout
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    /// Probe the host and port an origin URL points at
    pub fn for_origin(origin: &Url, timeout: Duration) -> ShellResult<Self> {
        let host = origin.host_str().ok_or_else(|| ShellError::InvalidResource {
            resource: origin.to_string(),
            reason: "origin has no host".to_string(),
        })?;
        let port = origin
            .port_or_known_default()
            .ok_or_else(|| ShellError::InvalidResource {
                resource: origin.to_string(),
                reason: "origin has no port".to_string(),
            })?;
        Ok(Self::new(format!("{}:{}", host, port), timeout))
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

#[async_trait]
impl ConnectivityProbe for TcpProbe {
    async fn sample(&self) -> NetworkState {
        let connected = matches!(
            tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await,
            Ok(Ok(_))
        );
        debug!("Probe {}: {}", self.addr, if connected { "reachable" } else { "unreachable" });
        NetworkState::from(connected)
    }
}

/// Probe backed by a shared flag the host keeps current
#[derive(Debug, Clone)]
pub struct FlagProbe {
    online: Arc<AtomicBool>,
}

impl FlagProbe {
    pub fn new(initial: NetworkState) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(initial.is_online())),
        }
    }

    pub fn set(&self, state: NetworkState) {
        self.online.store(state.is_online(), Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectivityProbe for FlagProbe {
    async fn sample(&self) -> NetworkState {
        NetworkState::from(self.online.load(Ordering::SeqCst))
    }
}
