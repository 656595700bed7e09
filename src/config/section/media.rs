//! `[lazyload]` and `[fonts]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [lazyload]
//! enable = true
//! exclude = ["logo.png", "hero"]
//!
//! [fonts]
//! optimize = true     # Merge Google Fonts requests
//! async = false       # Keep each request but load it without blocking render
//! ```

use crate::core::ExclusionList;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LazyLoadConfig {
    /// Defer offscreen images and iframes.
    pub enable: bool,
    pub exclude: ExclusionList,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FontsConfig {
    /// Optimize Google Fonts stylesheet links.
    pub optimize: bool,
    /// Async mode (preload + onload) instead of merging into one request.
    #[serde(rename = "async")]
    pub async_loading: bool,
}
