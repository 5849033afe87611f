//! Connectivity indicator policy

use super::StatusIndicator;
use crate::network::NetworkState;
use crate::notify::{NotificationOptions, PermissionGate};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Turns network transitions into a transient indicator.
///
/// Offline keeps the indicator up until the next transition. Online shows it
/// and hides it after `hide_delay`; a newer transition replaces any pending
/// hide. Timers are spawned on the current tokio runtime.
pub struct StatusPresenter {
    indicator: Option<Arc<dyn StatusIndicator>>,
    hide_delay: Duration,
    hide_timer: Mutex<Option<JoinHandle<()>>>,
    notifier: Option<Arc<PermissionGate>>,
}

impl StatusPresenter {
    pub fn new(indicator: Option<Arc<dyn StatusIndicator>>, hide_delay: Duration) -> Self {
        Self {
            indicator,
            hide_delay,
            hide_timer: Mutex::new(None),
            notifier: None,
        }
    }

    /// Also announce each transition as a notification
    pub fn with_notifier(mut self, gate: Arc<PermissionGate>) -> Self {
        self.notifier = Some(gate);
        self
    }

    pub fn on_transition(&self, state: NetworkState) {
        if let Some(gate) = &self.notifier {
            let body = match state {
                NetworkState::Online => "Connection restored",
                NetworkState::Offline => "Working offline",
            };
            gate.notify(
                &format!("Network {}", state),
                &NotificationOptions::default().body(body).silent(true),
            );
        }

        let Some(indicator) = self.indicator.clone() else {
            return;
        };

        let mut timer = self.hide_timer.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pending) = timer.take() {
            pending.abort();
        }

        indicator.show(state);

        if state.is_online() {
            let delay = self.hide_delay;
            *timer = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                debug!("Hiding status indicator after {:?}", delay);
                indicator.hide();
            }));
        }
    }

    /// Follow a state subscription until the sender is dropped
    pub async fn run(&self, mut states: watch::Receiver<NetworkState>) {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            self.on_transition(state);
        }
    }
}

impl Drop for StatusPresenter {
    fn drop(&mut self) {
        let timer = self
            .hide_timer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(pending) = timer.take() {
            pending.abort();
        }
    }
}
