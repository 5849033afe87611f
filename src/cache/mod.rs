//! Offline resource cache
//!
//! Serves resources from a versioned local store, falling back to the
//! network on a miss.
//!
//! # Policy
//!
//! - Cache-first: a hit is returned verbatim without revalidation
//! - Write-only-at-install: runtime misses never grow the cache
//! - Atomic manifest: one failed manifest fetch fails the whole install
//! - Single generation: activating a version deletes every other store
//!
//! # Version Lifecycle
//!
//! | Phase | Serves requests | Description |
//! |-------|-----------------|-------------|
//! | Installing | no | Manifest being fetched; dropped on failure or cancellation |
//! | Waiting | no | Installed, held until the previous version is released |
//! | Active | no | Eviction sweep of stale stores in progress |
//! | Serving | yes | Sole target of interception until superseded |

pub mod manager;
pub mod store;
pub mod types;

pub use manager::{
    CacheManager, CacheSnapshot, HandoffHook, ImmediateHandoff, ResponseSource, Served,
    VersionPhase,
};
pub use store::{CacheStorage, DiskStorage, MemoryStorage};
pub use types::{
    parse_origin, CacheEntry, CacheVersion, ManifestSet, Request, ResourceKey, Response,
};
