//! `[page]` and `[debug]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [page]
//! exclude = ["/checkout", "/my-account"]   # Request paths left untouched
//!
//! [debug]
//! restore_console = true                   # Undo scripts that silence window.console
//! ```

use crate::core::ExclusionList;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    /// Request paths containing any of these skip the whole pipeline.
    pub exclude: ExclusionList,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub restore_console: bool,
}
