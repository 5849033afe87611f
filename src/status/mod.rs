//! Connectivity status presentation

mod presenter;

pub use presenter::StatusPresenter;

use crate::network::NetworkState;

/// A UI affordance that can display the current connectivity state
pub trait StatusIndicator: Send + Sync {
    fn show(&self, state: NetworkState);
    fn hide(&self);
}
