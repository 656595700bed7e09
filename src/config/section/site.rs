//! `[site]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [site]
//! url = "https://example.com"   # Public base URL of the site
//! root = "/var/www/html"        # Document root (relative to the config file)
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Public base URL, e.g. `https://example.com` or `https://example.com/blog`.
    pub url: String,
    /// Document root that site URLs map onto.
    pub root: PathBuf,
}
