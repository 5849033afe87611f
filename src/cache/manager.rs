//! Versioned cache lifecycle and request interception
//!
//! Each cache version moves through `Installing -> Waiting -> Active ->
//! Serving`. A failed or cancelled install drops the version entirely, so
//! it can never be activated.

use crate::cache::store::CacheStorage;
use crate::cache::types::{CacheEntry, CacheVersion, ManifestSet, Request, ResourceKey, Response};
use crate::error::{ShellError, ShellResult};
use crate::fetch::Fetcher;
use async_trait::async_trait;
use futures_util::future::try_join_all;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Lifecycle phase of a cache version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionPhase {
    /// Manifest is being fetched and stored
    Installing,
    /// Installed, waiting for the previous version to be released
    Waiting,
    /// Activated, eviction sweep in progress
    Active,
    /// Sole target of request interception
    Serving,
}

impl fmt::Display for VersionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installing => write!(f, "installing"),
            Self::Waiting => write!(f, "waiting"),
            Self::Active => write!(f, "active"),
            Self::Serving => write!(f, "serving"),
        }
    }
}

/// Where an intercepted response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
}

/// An intercepted response together with its source
#[derive(Debug, Clone)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
}

/// Point-in-time view of the lifecycle for status output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSnapshot {
    pub serving: Option<CacheVersion>,
    pub phases: Vec<(CacheVersion, VersionPhase)>,
}

/// Lifecycle hook invoked before a waiting version takes over.
///
/// The host decides when the previously serving version may be released;
/// activation does not proceed until this returns.
#[async_trait]
pub trait HandoffHook: Send + Sync {
    async fn release(&self, previous: Option<&CacheVersion>, next: &CacheVersion)
        -> ShellResult<()>;
}

/// Hand-off policy that releases the previous version immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateHandoff;

#[async_trait]
impl HandoffHook for ImmediateHandoff {
    async fn release(&self, previous: Option<&CacheVersion>, next: &CacheVersion) -> ShellResult<()> {
        debug!("Releasing {:?} in favour of {}", previous.map(|v| v.as_str()), next);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Lifecycle {
    phases: HashMap<CacheVersion, VersionPhase>,
    serving: Option<CacheVersion>,
}

/// Marks a version as installing; removes it again unless completed
struct InstallGuard<'a> {
    lifecycle: &'a Mutex<Lifecycle>,
    version: CacheVersion,
    completed: bool,
}

impl InstallGuard<'_> {
    fn complete(mut self) {
        lock(self.lifecycle)
            .phases
            .insert(self.version.clone(), VersionPhase::Waiting);
        self.completed = true;
    }
}

impl Drop for InstallGuard<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let mut lifecycle = lock(self.lifecycle);
        if lifecycle.phases.get(&self.version) == Some(&VersionPhase::Installing) {
            lifecycle.phases.remove(&self.version);
            warn!("Installation of {} did not complete", self.version);
        }
    }
}

fn lock(lifecycle: &Mutex<Lifecycle>) -> MutexGuard<'_, Lifecycle> {
    lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the versioned cache and answers intercepted requests
pub struct CacheManager {
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    handoff: Arc<dyn HandoffHook>,
    lifecycle: Mutex<Lifecycle>,
}

impl CacheManager {
    /// Create a manager with immediate hand-off
    pub fn new(storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            storage,
            fetcher,
            handoff: Arc::new(ImmediateHandoff),
            lifecycle: Mutex::new(Lifecycle::default()),
        }
    }

    /// Replace the hand-off hook
    pub fn with_handoff(mut self, handoff: Arc<dyn HandoffHook>) -> Self {
        self.handoff = handoff;
        self
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Install `version` from `manifest`
    pub async fn install(&self, manifest: &ManifestSet, version: &CacheVersion) -> ShellResult<()> {
        self.install_with_progress(manifest, version, &|_| {}).await
    }

    /// Install `version`, calling `on_stored` for every manifest entry
    /// present in the store once the install succeeds.
    ///
    /// Every manifest resource must fetch successfully before anything is
    /// written. Re-installing an installed version only re-fetches entries
    /// missing from its store.
    pub async fn install_with_progress(
        &self,
        manifest: &ManifestSet,
        version: &CacheVersion,
        on_stored: &(dyn Fn(&ResourceKey) + Send + Sync),
    ) -> ShellResult<()> {
        let guard = {
            let mut lifecycle = lock(&self.lifecycle);
            match lifecycle.phases.get(version) {
                Some(VersionPhase::Installing) => {
                    return Err(ShellError::InstallInProgress(version.to_string()))
                }
                Some(_) => None,
                None => {
                    lifecycle
                        .phases
                        .insert(version.clone(), VersionPhase::Installing);
                    Some(InstallGuard {
                        lifecycle: &self.lifecycle,
                        version: version.clone(),
                        completed: false,
                    })
                }
            }
        };

        let Some(guard) = guard else {
            return self.revalidate(manifest, version, on_stored).await;
        };

        info!("Installing cache version {} ({} resources)", version, manifest.len());

        // A store left behind by an earlier process is adopted when complete
        // and discarded when partial.
        let missing = self.missing_keys(manifest, version).await?;
        let store_exists = self.storage.names().await?.iter().any(|n| n == version.as_str());
        if store_exists && missing.is_empty() {
            info!("Adopting existing store for {}", version);
            manifest.keys().iter().for_each(on_stored);
            guard.complete();
            return Ok(());
        }
        if store_exists {
            debug!("Discarding partial store for {}", version);
            self.storage.delete(version.as_str()).await?;
        }

        let fetched = self.fetch_all(manifest.keys(), version).await?;

        self.storage.open(version.as_str()).await?;
        let written = match self.write_entries(version, &fetched, on_stored).await {
            Ok(()) => self.verify_complete(manifest, version).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            warn!("Writing {} failed, removing partial store: {}", version, e);
            if let Err(cleanup) = self.storage.delete(version.as_str()).await {
                warn!("Failed to remove partial store {}: {}", version, cleanup);
            }
            return Err(e);
        }

        guard.complete();
        info!("Cache version {} installed", version);
        Ok(())
    }

    /// Re-check an installed version, re-fetching missing entries atomically
    async fn revalidate(
        &self,
        manifest: &ManifestSet,
        version: &CacheVersion,
        on_stored: &(dyn Fn(&ResourceKey) + Send + Sync),
    ) -> ShellResult<()> {
        let missing = self.missing_keys(manifest, version).await?;
        if missing.is_empty() {
            debug!("Cache version {} already holds its manifest", version);
            manifest.keys().iter().for_each(on_stored);
            return Ok(());
        }

        info!("Re-fetching {} missing entries for {}", missing.len(), version);
        let fetched = self.fetch_all(&missing, version).await?;
        self.write_entries(version, &fetched, &|_| {}).await?;
        self.verify_complete(manifest, version).await?;
        manifest.keys().iter().for_each(on_stored);
        Ok(())
    }

    /// Fail if any manifest entry is absent after writing, which happens
    /// when the store was deleted mid-install
    async fn verify_complete(&self, manifest: &ManifestSet, version: &CacheVersion) -> ShellResult<()> {
        match self.missing_keys(manifest, version).await?.first() {
            None => Ok(()),
            Some(key) => Err(ShellError::install(
                version.as_str(),
                key.as_str(),
                "store was removed while installing",
            )),
        }
    }

    async fn missing_keys(
        &self,
        manifest: &ManifestSet,
        version: &CacheVersion,
    ) -> ShellResult<Vec<ResourceKey>> {
        let mut missing = Vec::new();
        for key in manifest.keys() {
            if self.storage.lookup(version.as_str(), key).await?.is_none() {
                missing.push(key.clone());
            }
        }
        Ok(missing)
    }

    /// Fetch every key concurrently; the first failure fails the batch
    async fn fetch_all(
        &self,
        keys: &[ResourceKey],
        version: &CacheVersion,
    ) -> ShellResult<Vec<(ResourceKey, Response)>> {
        let fetches = keys.iter().map(|key| async move {
            let response = self
                .fetcher
                .fetch(&Request::get(key.clone()))
                .await
                .map_err(|e| ShellError::install(version.as_str(), key.as_str(), e.to_string()))?;

            if !response.is_success() {
                return Err(ShellError::install(
                    version.as_str(),
                    key.as_str(),
                    format!("HTTP {}", response.status),
                ));
            }

            debug!("Fetched {} for {}", key, version);
            Ok((key.clone(), response))
        });

        try_join_all(fetches).await
    }

    async fn write_entries(
        &self,
        version: &CacheVersion,
        fetched: &[(ResourceKey, Response)],
        on_stored: &(dyn Fn(&ResourceKey) + Send + Sync),
    ) -> ShellResult<()> {
        for (key, response) in fetched {
            let entry = CacheEntry::new(response.clone(), version.clone());
            self.storage.put(version.as_str(), key, &entry).await?;
            on_stored(key);
        }
        Ok(())
    }

    /// Promote an installed version and evict every other store.
    ///
    /// Returns the names of the evicted stores.
    pub async fn activate(&self, version: &CacheVersion) -> ShellResult<Vec<String>> {
        let previous = {
            let lifecycle = lock(&self.lifecycle);
            match lifecycle.phases.get(version) {
                None | Some(VersionPhase::Installing) => {
                    return Err(ShellError::VersionNotInstalled(version.to_string()))
                }
                Some(_) => lifecycle.serving.clone(),
            }
        };

        if previous.as_ref() != Some(version) {
            self.handoff.release(previous.as_ref(), version).await?;
        }

        lock(&self.lifecycle)
            .phases
            .insert(version.clone(), VersionPhase::Active);

        let mut evicted = Vec::new();
        for name in self.storage.names().await? {
            // Checked per store: an install may have started since the sweep began
            if name == version.as_str() || self.is_installing(&name) {
                continue;
            }
            if self.storage.delete(&name).await? {
                info!("Evicted stale cache store {}", name);
                evicted.push(name);
            }
        }

        {
            let mut lifecycle = lock(&self.lifecycle);
            lifecycle.phases.retain(|v, phase| {
                v == version
                    || (!evicted.iter().any(|name| name == v.as_str())
                        && matches!(phase, VersionPhase::Installing | VersionPhase::Waiting))
            });
            lifecycle.phases.insert(version.clone(), VersionPhase::Serving);
            lifecycle.serving = Some(version.clone());
        }

        info!("Cache version {} is serving", version);
        Ok(evicted)
    }

    fn is_installing(&self, store: &str) -> bool {
        lock(&self.lifecycle)
            .phases
            .iter()
            .any(|(v, phase)| v.as_str() == store && *phase == VersionPhase::Installing)
    }

    /// Serve an already installed version without the eviction sweep.
    ///
    /// Only a store holding the whole manifest is adopted; nothing is
    /// fetched or deleted. Returns whether the version is now serving.
    pub async fn adopt(&self, manifest: &ManifestSet, version: &CacheVersion) -> ShellResult<bool> {
        if self.phase(version) == Some(VersionPhase::Installing) {
            return Err(ShellError::InstallInProgress(version.to_string()));
        }

        let exists = self.storage.names().await?.iter().any(|n| n == version.as_str());
        if !exists || !self.missing_keys(manifest, version).await?.is_empty() {
            debug!("No complete store to adopt for {}", version);
            return Ok(false);
        }

        let mut lifecycle = lock(&self.lifecycle);
        if lifecycle.phases.get(version) == Some(&VersionPhase::Installing) {
            return Err(ShellError::InstallInProgress(version.to_string()));
        }
        let previous = lifecycle.serving.replace(version.clone());
        if let Some(previous) = previous.filter(|p| p != version) {
            lifecycle.phases.insert(previous, VersionPhase::Waiting);
        }
        lifecycle.phases.insert(version.clone(), VersionPhase::Serving);

        info!("Serving installed store {}", version);
        Ok(true)
    }

    /// Install (or re-validate) and activate in one step
    pub async fn restore(&self, manifest: &ManifestSet, version: &CacheVersion) -> ShellResult<Vec<String>> {
        self.install(manifest, version).await?;
        self.activate(version).await
    }

    /// Cache-first with network fallback
    pub async fn intercept(&self, request: &Request) -> ShellResult<Response> {
        self.serve(request).await.map(|served| served.response)
    }

    /// Like `intercept`, but also reports where the response came from.
    ///
    /// Misses are never written back; only installs grow the cache.
    pub async fn serve(&self, request: &Request) -> ShellResult<Served> {
        let serving = lock(&self.lifecycle).serving.clone();

        if let Some(version) = serving.filter(|_| request.is_get()) {
            match self.storage.lookup(version.as_str(), &request.key).await {
                Ok(Some(entry)) => {
                    debug!("Cache hit: {} ({})", request.key, version);
                    return Ok(Served {
                        response: entry.response,
                        source: ResponseSource::Cache,
                    });
                }
                Ok(None) => debug!("Cache miss: {}", request.key),
                Err(e) => warn!("Cache lookup for {} failed, using network: {}", request.key, e),
            }
        }

        let response = self.fetcher.fetch(request).await?;
        Ok(Served {
            response,
            source: ResponseSource::Network,
        })
    }

    /// Current phase of a version, if known
    pub fn phase(&self, version: &CacheVersion) -> Option<VersionPhase> {
        lock(&self.lifecycle).phases.get(version).copied()
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        let lifecycle = lock(&self.lifecycle);
        let mut phases: Vec<(CacheVersion, VersionPhase)> = lifecycle
            .phases
            .iter()
            .map(|(v, p)| (v.clone(), *p))
            .collect();
        phases.sort_by(|a, b| a.0.cmp(&b.0));
        CacheSnapshot {
            serving: lifecycle.serving.clone(),
            phases,
        }
    }
}
