//! `[css]` and `[critical]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [css]
//! minify = true            # Combine and minify local stylesheets
//! combine_inline = true    # Also fold <head> <style> blocks into the bundle
//! exclude = """
//! print.css
//! elementor
//! """
//!
//! [critical]
//! css = "body{margin:0}"   # Inlined in <head>; switches stylesheets to async loading
//! ```

use crate::core::ExclusionList;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CssConfig {
    /// Combine and minify eligible stylesheets.
    pub minify: bool,
    /// Append eligible inline `<style>` blocks to the combined file.
    pub combine_inline: bool,
    /// Stylesheets whose href contains any of these are left alone.
    pub exclude: ExclusionList,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CriticalConfig {
    /// Above-the-fold CSS. Empty disables the feature.
    pub css: String,
}

impl CriticalConfig {
    pub fn is_active(&self) -> bool {
        !self.css.trim().is_empty()
    }
}
