//! `[cache]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [cache]
//! dir = "wp-content/cache/optimizador-pro"                      # Where combined files are written
//! url = "https://example.com/wp-content/cache/optimizador-pro"  # Where they are served from
//! ```
//!
//! Both default to `wp-content/cache/optimizador-pro` under the site root
//! and site URL respectively.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Path of the cache directory relative to the document root and site URL.
pub const DEFAULT_CACHE_SUBPATH: &str = "wp-content/cache/optimizador-pro";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory for combined artifacts.
    pub dir: Option<PathBuf>,
    /// Public URL of the cache directory.
    pub url: Option<String>,
}
