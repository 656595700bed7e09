//! `[js]`, `[defer]` and `[delay]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [js]
//! minify = true             # Combine and minify local scripts
//! dequeue_jquery = false    # Allow jQuery into the bundle when the page looks jQuery-free
//! exclude = ["slider.js"]
//!
//! [defer]
//! enable = true
//! exclude = ["maps.js"]
//!
//! [delay]
//! enable = true
//! timeout = 5000            # Run delayed scripts after this many ms without interaction
//! exclude = ["recaptcha"]
//! ```

use crate::core::ExclusionList;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JsConfig {
    /// Combine and minify eligible scripts.
    pub minify: bool,
    /// Treat jQuery as non-critical when the page shows no jQuery usage.
    pub dequeue_jquery: bool,
    pub exclude: ExclusionList,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeferConfig {
    /// Add `defer` to eligible external scripts.
    pub enable: bool,
    pub exclude: ExclusionList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    /// Postpone script execution until first user interaction.
    pub enable: bool,
    /// Fallback timer in milliseconds.
    pub timeout: u32,
    pub exclude: ExclusionList,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            enable: false,
            timeout: 5000,
            exclude: ExclusionList::default(),
        }
    }
}
