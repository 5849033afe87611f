//! Application shell context
//!
//! `Shell` is built once at startup and owns every enhancement capability.
//! `start` brings them up in order: notification permission, then cache
//! registration as a detached task, then the network monitor driving the
//! status presenter. A failure in one capability is logged and never stops
//! the others.

use crate::cache::{parse_origin, CacheManager, CacheVersion, ManifestSet};
use crate::config::schema::NotificationsConfig;
use crate::config::Config;
use crate::error::{ShellError, ShellResult};
use crate::network::{ConnectivityProbe, NetworkMonitor, NetworkState};
use crate::notify::{
    NotificationDefaults, NotificationOptions, NotificationPlatform, PermissionGate,
    PermissionState,
};
use crate::status::{StatusIndicator, StatusPresenter};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const WELCOME_TITLE: &str = "مرحباً بك في ConnectHub!";
const WELCOME_BODY: &str = "ستتلقى إشعارات الأصدقاء والمنشورات الجديدة";

/// UI capabilities injected by the host; `None` disables the feature
#[derive(Default, Clone)]
pub struct Capabilities {
    pub indicator: Option<Arc<dyn StatusIndicator>>,
    pub notifications: Option<Arc<dyn NotificationPlatform>>,
}

/// Resolve the configured cache version and manifest
pub fn cache_target(config: &Config) -> ShellResult<(CacheVersion, ManifestSet)> {
    let origin = parse_origin(&config.cache.origin)?;
    let version = CacheVersion::new(config.cache.version.as_str())?;
    let manifest = ManifestSet::resolve(&origin, &config.cache.manifest)?;
    Ok((version, manifest))
}

/// Handle to the detached cache registration
pub struct Registration {
    version: CacheVersion,
    task: JoinHandle<ShellResult<Vec<String>>>,
}

impl Registration {
    pub fn version(&self) -> &CacheVersion {
        &self.version
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for registration to finish; returns the evicted store names
    pub async fn wait(self) -> ShellResult<Vec<String>> {
        self.task
            .await
            .map_err(|e| ShellError::Internal(format!("cache registration task failed: {}", e)))?
    }

    /// Cancel an unfinished registration; a partial install is discarded
    pub fn cancel(&self) {
        self.task.abort();
    }
}

/// Background work started by `Shell::start`
pub struct Running {
    registration: Registration,
    monitor: JoinHandle<()>,
    presenter: JoinHandle<()>,
}

impl Running {
    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    /// Stop network monitoring and hand back the registration, which keeps
    /// its own lifecycle
    pub fn stop(self) -> Registration {
        self.monitor.abort();
        self.presenter.abort();
        self.registration
    }
}

pub struct Shell {
    cache: Arc<CacheManager>,
    version: CacheVersion,
    manifest: ManifestSet,
    gate: Arc<PermissionGate>,
    monitor: Arc<NetworkMonitor>,
    presenter: Arc<StatusPresenter>,
    poll_interval: Duration,
    notifications: NotificationsConfig,
}

impl Shell {
    pub fn new(config: &Config, cache: Arc<CacheManager>, capabilities: Capabilities) -> ShellResult<Self> {
        let (version, manifest) = cache_target(config)?;

        if capabilities.indicator.is_none() {
            debug!("No status indicator available, status presentation disabled");
        }

        let gate = Arc::new(
            PermissionGate::new(capabilities.notifications)
                .with_defaults(NotificationDefaults::from_config(&config.notifications)),
        );
        if let Err(e) = gate.ensure_available() {
            if config.notifications.enabled {
                warn!("{}; notifications will be dropped", e);
            }
        }

        let mut presenter = StatusPresenter::new(
            capabilities.indicator,
            Duration::from_millis(config.status.online_hide_delay_ms),
        );
        if config.status.notify_on_transition {
            presenter = presenter.with_notifier(gate.clone());
        }

        Ok(Self {
            cache,
            version,
            manifest,
            gate,
            monitor: Arc::new(NetworkMonitor::new(NetworkState::Online)),
            presenter: Arc::new(presenter),
            poll_interval: Duration::from_secs(config.network.poll_interval_secs.max(1)),
            notifications: config.notifications.clone(),
        })
    }

    pub fn cache(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    pub fn gate(&self) -> &Arc<PermissionGate> {
        &self.gate
    }

    pub fn monitor(&self) -> &Arc<NetworkMonitor> {
        &self.monitor
    }

    pub fn version(&self) -> &CacheVersion {
        &self.version
    }

    /// Bring every capability up in startup order
    pub async fn start(
        &self,
        events: Option<mpsc::Receiver<NetworkState>>,
        probe: Arc<dyn ConnectivityProbe>,
    ) -> Running {
        self.negotiate_notifications().await;
        let registration = self.register_cache();
        let (monitor, presenter) = self.activate_monitor(events, probe).await;

        Running {
            registration,
            monitor,
            presenter,
        }
    }

    async fn negotiate_notifications(&self) {
        if !self.notifications.enabled {
            debug!("Notifications disabled in config");
            return;
        }

        if self.gate.negotiate().await == PermissionState::Granted && self.notifications.welcome {
            self.gate.notify(
                WELCOME_TITLE,
                &NotificationOptions::default()
                    .body(WELCOME_BODY)
                    .icon(self.notifications.default_icon.clone()),
            );
        }
    }

    /// Install and activate the current version on a detached task
    pub fn register_cache(&self) -> Registration {
        let cache = self.cache.clone();
        let version = self.version.clone();
        let manifest = self.manifest.clone();

        let task = {
            let version = version.clone();
            tokio::spawn(async move {
                let outcome = cache.restore(&manifest, &version).await;
                match &outcome {
                    Ok(evicted) => info!(
                        "Cache registration for {} complete ({} stale stores evicted)",
                        version,
                        evicted.len()
                    ),
                    Err(e) => warn!("Cache registration for {} failed: {}", version, e),
                }
                outcome
            })
        };

        Registration { version, task }
    }

    async fn activate_monitor(
        &self,
        events: Option<mpsc::Receiver<NetworkState>>,
        probe: Arc<dyn ConnectivityProbe>,
    ) -> (JoinHandle<()>, JoinHandle<()>) {
        let presenter = {
            let presenter = self.presenter.clone();
            let states = self.monitor.subscribe();
            tokio::spawn(async move { presenter.run(states).await })
        };

        // Initial reading; an offline start shows the indicator right away
        self.monitor.apply_sample(probe.sample().await);

        let monitor = {
            let monitor = self.monitor.clone();
            let interval = self.poll_interval;
            tokio::spawn(async move { monitor.run(events, probe.as_ref(), interval).await })
        };

        (monitor, presenter)
    }
}
