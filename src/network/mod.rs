//! Network availability tracking
//!
//! `NetworkMonitor` owns the process-wide `NetworkState`. Two signal
//! sources feed it: platform connectivity events, applied immediately, and
//! a periodic `ConnectivityProbe` poll that catches missed events.
//!
//! When the two disagree, the event wins: a poll sample is discarded if
//! any event was applied, or is waiting to be applied, while the probe was
//! being sampled.

mod monitor;
mod probe;

pub use monitor::{NetworkMonitor, SignalSource};
pub use probe::{ConnectivityProbe, FlagProbe, TcpProbe};

use std::fmt;

/// Connectivity state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkState {
    Online,
    Offline,
}

impl NetworkState {
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl From<bool> for NetworkState {
    fn from(online: bool) -> Self {
        if online {
            Self::Online
        } else {
            Self::Offline
        }
    }
}

impl fmt::Display for NetworkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Offline => write!(f, "offline"),
        }
    }
}
