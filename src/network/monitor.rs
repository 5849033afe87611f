//! Connectivity state machine

use super::probe::ConnectivityProbe;
use super::NetworkState;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use futures_util::future::{BoxFuture, Fuse, FusedFuture, FutureExt};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

type ChangeHandler = Box<dyn Fn(NetworkState) + Send + Sync>;

/// Which signal produced a state write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalSource {
    Event,
    Poll,
}

/// Sole owner of `NetworkState`
///
/// Handlers registered with `on_change` run once per real transition and
/// never for a re-assertion of the current state. They run synchronously on
/// the writer's task, in write order, and must not register handlers or
/// apply connectivity changes themselves.
pub struct NetworkMonitor {
    state: watch::Sender<NetworkState>,
    handlers: Mutex<Vec<ChangeHandler>>,
    events_applied: AtomicU64,
}

impl NetworkMonitor {
    pub fn new(initial: NetworkState) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            state,
            handlers: Mutex::new(Vec::new()),
            events_applied: AtomicU64::new(0),
        }
    }

    pub fn current_state(&self) -> NetworkState {
        *self.state.borrow()
    }

    /// Register a transition handler
    pub fn on_change<F>(&self, handler: F)
    where
        F: Fn(NetworkState) + Send + Sync + 'static,
    {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(handler));
    }

    /// Subscribe to state changes
    pub fn subscribe(&self) -> watch::Receiver<NetworkState> {
        self.state.subscribe()
    }

    /// Apply a platform connectivity event immediately
    pub fn apply_event(&self, state: NetworkState) -> bool {
        self.events_applied.fetch_add(1, Ordering::SeqCst);
        self.transition(state, SignalSource::Event)
    }

    /// Apply a polled connectivity sample
    pub fn apply_sample(&self, state: NetworkState) -> bool {
        self.transition(state, SignalSource::Poll)
    }

    fn transition(&self, state: NetworkState, source: SignalSource) -> bool {
        // Held across the write and dispatch so handlers see writes in order
        let handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        let changed = self.state.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });

        if !changed {
            return false;
        }

        info!("Network is now {} (via {:?})", state, source);
        for handler in handlers.iter() {
            handler(state);
        }
        true
    }

    /// Sample the probe once and apply the result unless an event was
    /// applied while sampling
    pub async fn poll(&self, probe: &dyn ConnectivityProbe) -> bool {
        let before = self.events_applied.load(Ordering::SeqCst);
        let sampled = probe.sample().await;
        self.settle_sample(sampled, before, false)
    }

    fn settle_sample(&self, sampled: NetworkState, before: u64, events_pending: bool) -> bool {
        if self.events_applied.load(Ordering::SeqCst) != before || events_pending {
            debug!("Discarding poll sample {}: connectivity event takes precedence", sampled);
            return false;
        }
        self.apply_sample(sampled)
    }

    /// Drive the monitor from an event stream and a polling probe.
    ///
    /// Events are applied as they arrive, including while a probe sample is
    /// in flight. The first poll happens one `interval` after start; a tick
    /// that comes due mid-sample waits for it. Runs until the owning task is
    /// cancelled; a closed event stream leaves polling in place.
    pub async fn run(
        &self,
        mut events: Option<mpsc::Receiver<NetworkState>>,
        probe: &dyn ConnectivityProbe,
        interval: Duration,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        let mut events_open = events.is_some();
        let mut sample: Fuse<BoxFuture<'_, NetworkState>> = Fuse::terminated();
        let mut sample_started = 0;
        info!("Network monitor started (poll every {:?})", interval);

        loop {
            tokio::select! {
                biased;

                event = next_event(&mut events), if events_open => match event {
                    Some(state) => {
                        self.apply_event(state);
                    }
                    None => {
                        debug!("Connectivity event stream closed, polling only");
                        events_open = false;
                    }
                },

                sampled = &mut sample, if !sample.is_terminated() => {
                    let pending = events.as_ref().is_some_and(|rx| !rx.is_empty());
                    self.settle_sample(sampled, sample_started, pending);
                }

                _ = ticker.tick(), if sample.is_terminated() => {
                    sample_started = self.events_applied.load(Ordering::SeqCst);
                    sample = probe.sample().fuse();
                }
            }
        }
    }
}

async fn next_event(events: &mut Option<mpsc::Receiver<NetworkState>>) -> Option<NetworkState> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
