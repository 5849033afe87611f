//! CLI command implementations

pub mod clear;
pub mod config;
pub mod descriptor;
pub mod fetch;
pub mod install;
pub mod status;
pub mod watch;

pub use clear::execute as clear;
pub use config::execute as config;
pub use descriptor::execute as descriptor;
pub use fetch::execute as fetch;
pub use install::execute as install;
pub use status::execute as status;
pub use watch::execute as watch;

use crate::cache::{CacheManager, DiskStorage};
use crate::config::{Config, ConfigManager};
use crate::fetch::HttpFetcher;
use std::sync::Arc;

/// Cache manager over the on-disk store directory and the HTTP fetcher
fn disk_cache(config: &Config) -> Arc<CacheManager> {
    let storage = DiskStorage::new(ConfigManager::store_dir(config));
    Arc::new(CacheManager::new(
        Arc::new(storage),
        Arc::new(HttpFetcher::default().with_body_limit(config.cache.max_body_bytes)),
    ))
}
