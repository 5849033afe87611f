//! Named-namespace resource stores
//!
//! A store is a key/value namespace (one per cache version) holding
//! captured responses. Two backends are provided: an in-process map and a
//! directory tree on disk.

use crate::cache::types::{CacheEntry, CacheVersion, ResourceKey, Response};
use crate::error::{ShellError, ShellResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tokio::fs;
use tracing::debug;

/// Abstract cache store interface
///
/// Mirrors the host platform's cache API: open-by-name, put, match,
/// delete-by-name and list-names.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open (or create) a named store
    async fn open(&self, store: &str) -> ShellResult<()>;

    /// Write an entry, creating the store if needed
    async fn put(&self, store: &str, key: &ResourceKey, entry: &CacheEntry) -> ShellResult<()>;

    /// Look up an entry; a missing store is a miss
    async fn lookup(&self, store: &str, key: &ResourceKey) -> ShellResult<Option<CacheEntry>>;

    /// Delete a whole store, returning whether it existed
    async fn delete(&self, store: &str) -> ShellResult<bool>;

    /// Names of every existing store, sorted
    async fn names(&self) -> ShellResult<Vec<String>>;

    /// Keys held by a store, sorted
    async fn keys(&self, store: &str) -> ShellResult<Vec<ResourceKey>>;

    /// Human-readable backend name for display
    fn backend_name(&self) -> &'static str;
}

type Namespace = HashMap<ResourceKey, CacheEntry>;

/// In-process store backend
#[derive(Debug, Default)]
pub struct MemoryStorage {
    stores: RwLock<BTreeMap<String, Namespace>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, store: &str) -> ShellResult<()> {
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        stores.entry(store.to_string()).or_default();
        Ok(())
    }

    async fn put(&self, store: &str, key: &ResourceKey, entry: &CacheEntry) -> ShellResult<()> {
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        stores
            .entry(store.to_string())
            .or_default()
            .insert(key.clone(), entry.clone());
        Ok(())
    }

    async fn lookup(&self, store: &str, key: &ResourceKey) -> ShellResult<Option<CacheEntry>> {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        Ok(stores.get(store).and_then(|ns| ns.get(key)).cloned())
    }

    async fn delete(&self, store: &str) -> ShellResult<bool> {
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        Ok(stores.remove(store).is_some())
    }

    async fn names(&self) -> ShellResult<Vec<String>> {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        Ok(stores.keys().cloned().collect())
    }

    async fn keys(&self, store: &str) -> ShellResult<Vec<ResourceKey>> {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<ResourceKey> = stores
            .get(store)
            .map(|ns| ns.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

/// Entry metadata as written next to the body file
#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    key: ResourceKey,
    version: CacheVersion,
    status: u16,
    headers: Vec<(String, String)>,
    stored_at: DateTime<Utc>,
}

/// Marks a directory under the root as a cache store
const STORE_MARKER: &str = ".hubshell-store";

/// Directory-backed store backend
///
/// Layout: `<root>/<store>/<hash>.json` (metadata) and `<hash>.body`.
/// The metadata file is written last, so an entry only becomes visible
/// once its body is complete. Only directories holding a `.hubshell-store`
/// marker are treated as stores; anything else under the root is left
/// alone.
#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_path(&self, store: &str) -> ShellResult<PathBuf> {
        if store.is_empty() || store.contains(['/', '\\']) || store.starts_with('.') {
            return Err(ShellError::store(store, "invalid store name"));
        }
        Ok(self.root.join(store))
    }

    /// File stem for a key: first 16 bytes of its SHA256, hex encoded
    fn entry_stem(key: &ResourceKey) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_str().as_bytes());
        let digest = hasher.finalize();
        hex::encode(&digest[..16])
    }

    fn is_store(dir: &Path) -> bool {
        dir.join(STORE_MARKER).is_file()
    }

    async fn is_empty_dir(dir: &Path) -> ShellResult<bool> {
        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| ShellError::io(format!("reading {}", dir.display()), e))?;
        let next = entries
            .next_entry()
            .await
            .map_err(|e| ShellError::io(format!("reading {}", dir.display()), e))?;
        Ok(next.is_none())
    }

    async fn write_atomic(path: &Path, contents: &[u8]) -> ShellResult<()> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, contents)
            .await
            .map_err(|e| ShellError::io(format!("writing {}", tmp.display()), e))?;
        fs::rename(&tmp, path)
            .await
            .map_err(|e| ShellError::io(format!("renaming into {}", path.display()), e))
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, store: &str) -> ShellResult<()> {
        let dir = self.store_path(store)?;
        if Self::is_store(&dir) {
            return Ok(());
        }
        if dir.exists() && !Self::is_empty_dir(&dir).await? {
            return Err(ShellError::store(
                store,
                format!("{} exists and is not a cache store", dir.display()),
            ));
        }

        fs::create_dir_all(&dir)
            .await
            .map_err(|e| ShellError::io(format!("creating store {}", dir.display()), e))?;
        fs::write(dir.join(STORE_MARKER), store.as_bytes())
            .await
            .map_err(|e| ShellError::io(format!("marking store {}", dir.display()), e))
    }

    async fn put(&self, store: &str, key: &ResourceKey, entry: &CacheEntry) -> ShellResult<()> {
        self.open(store).await?;
        let dir = self.store_path(store)?;
        let stem = Self::entry_stem(key);

        let meta = StoredEntry {
            key: key.clone(),
            version: entry.version.clone(),
            status: entry.response.status,
            headers: entry.response.headers.clone(),
            stored_at: entry.stored_at,
        };

        Self::write_atomic(&dir.join(format!("{}.body", stem)), &entry.response.body).await?;
        Self::write_atomic(
            &dir.join(format!("{}.json", stem)),
            serde_json::to_string_pretty(&meta)?.as_bytes(),
        )
        .await?;

        debug!("Stored {} in {} ({} bytes)", key, store, entry.response.body.len());
        Ok(())
    }

    async fn lookup(&self, store: &str, key: &ResourceKey) -> ShellResult<Option<CacheEntry>> {
        let dir = self.store_path(store)?;
        let stem = Self::entry_stem(key);
        let meta_path = dir.join(format!("{}.json", stem));

        if !meta_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&meta_path)
            .await
            .map_err(|e| ShellError::io(format!("reading {}", meta_path.display()), e))?;
        let meta: StoredEntry = serde_json::from_str(&content)?;

        // Hash collision guard
        if &meta.key != key {
            return Ok(None);
        }

        let body_path = dir.join(format!("{}.body", stem));
        let body = fs::read(&body_path)
            .await
            .map_err(|e| ShellError::io(format!("reading {}", body_path.display()), e))?;

        Ok(Some(CacheEntry {
            response: Response {
                status: meta.status,
                headers: meta.headers,
                body,
            },
            version: meta.version,
            stored_at: meta.stored_at,
        }))
    }

    async fn delete(&self, store: &str) -> ShellResult<bool> {
        let dir = self.store_path(store)?;
        if !Self::is_store(&dir) {
            if dir.exists() {
                debug!("Not deleting {}: not a cache store", dir.display());
            }
            return Ok(false);
        }
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| ShellError::io(format!("deleting store {}", dir.display()), e))?;
        Ok(true)
    }

    async fn names(&self) -> ShellResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| ShellError::io("reading store directory", e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ShellError::io("reading store entry", e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if !is_dir || !Self::is_store(&entry.path()) {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    async fn keys(&self, store: &str) -> ShellResult<Vec<ResourceKey>> {
        let dir = self.store_path(store)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| ShellError::io(format!("reading store {}", dir.display()), e))?;

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ShellError::io("reading store entry", e))?
        {
            if entry.path().extension().is_some_and(|ext| ext == "json") {
                let content = fs::read_to_string(entry.path())
                    .await
                    .map_err(|e| ShellError::io("reading entry metadata", e))?;
                let meta: StoredEntry = serde_json::from_str(&content)?;
                keys.push(meta.key);
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn backend_name(&self) -> &'static str {
        "disk"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::types::parse_origin;
    use tempfile::TempDir;

    fn key(path: &str) -> ResourceKey {
        ResourceKey::resolve(&parse_origin("http://localhost:8080").unwrap(), path).unwrap()
    }

    fn entry(body: &str) -> CacheEntry {
        CacheEntry::new(
            Response::new(200, body).with_header("Content-Type", "text/plain"),
            CacheVersion::new("v1").unwrap(),
        )
    }

    async fn exercise(storage: &dyn CacheStorage) {
        assert!(storage.names().await.unwrap().is_empty());
        assert!(storage.lookup("v1", &key("/")).await.unwrap().is_none());

        storage.open("v1").await.unwrap();
        storage.put("v1", &key("/"), &entry("index")).await.unwrap();
        storage.put("v1", &key("/app.css"), &entry("css")).await.unwrap();
        storage.put("v2", &key("/"), &entry("index v2")).await.unwrap();

        let hit = storage.lookup("v1", &key("/")).await.unwrap().unwrap();
        assert_eq!(hit.response.body, b"index");
        assert_eq!(hit.response.header("content-type"), Some("text/plain"));

        assert_eq!(storage.names().await.unwrap(), vec!["v1", "v2"]);
        assert_eq!(
            storage.keys("v1").await.unwrap(),
            vec![key("/"), key("/app.css")]
        );

        assert!(storage.delete("v1").await.unwrap());
        assert!(!storage.delete("v1").await.unwrap());
        assert!(storage.lookup("v1", &key("/")).await.unwrap().is_none());
        assert_eq!(storage.names().await.unwrap(), vec!["v2"]);
    }

    #[tokio::test]
    async fn memory_storage_contract() {
        exercise(&MemoryStorage::new()).await;
    }

    #[tokio::test]
    async fn disk_storage_contract() {
        let temp = TempDir::new().unwrap();
        exercise(&DiskStorage::new(temp.path().join("stores"))).await;
    }

    #[tokio::test]
    async fn disk_storage_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("stores");

        DiskStorage::new(&root)
            .put("v1", &key("/script.js"), &entry("js"))
            .await
            .unwrap();

        let reopened = DiskStorage::new(&root);
        let hit = reopened.lookup("v1", &key("/script.js")).await.unwrap().unwrap();
        assert_eq!(hit.response.body, b"js");
        assert_eq!(hit.version.as_str(), "v1");
    }

    #[tokio::test]
    async fn disk_storage_leaves_unmarked_directories_alone() {
        let temp = TempDir::new().unwrap();
        let photos = temp.path().join("photos");
        std::fs::create_dir_all(&photos).unwrap();
        std::fs::write(photos.join("holiday.jpg"), b"jpeg").unwrap();

        let storage = DiskStorage::new(temp.path());
        storage.put("v1", &key("/"), &entry("index")).await.unwrap();

        assert_eq!(storage.names().await.unwrap(), vec!["v1"]);
        assert!(!storage.delete("photos").await.unwrap());
        assert!(photos.join("holiday.jpg").exists());
        assert!(storage.open("photos").await.is_err());
        assert!(storage.delete("v1").await.unwrap());
    }

    #[tokio::test]
    async fn disk_storage_rejects_traversal() {
        let temp = TempDir::new().unwrap();
        let storage = DiskStorage::new(temp.path());
        assert!(storage.open("../escape").await.is_err());
        assert!(storage.delete(".").await.is_err());
    }

    #[test]
    fn entry_stem_is_stable() {
        let a = DiskStorage::entry_stem(&key("/"));
        let b = DiskStorage::entry_stem(&key("/"));
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert_ne!(a, DiskStorage::entry_stem(&key("/app.css")));
    }
}
