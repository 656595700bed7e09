//! Embedded client-side scripts.
//!
//! # Module Structure
//!
//! - `template` - Template types for typed variable injection
//! - `client` - Browser scripts emitted into optimized pages
//!
//! Sources live in `src/embed/client/` and are minified by `build.rs`.
//!
//! # Usage
//!
//! ```ignore
//! use embed::client::{DELAY_JS, DelayVars};
//!
//! let js = DELAY_JS.render(&DelayVars { timeout: 5000 });
//! ```

mod template;

pub use template::{NoVars, Template, TemplateVars};

pub mod client {
    use super::{NoVars, Template, TemplateVars};

    /// IntersectionObserver activation for `.lazyload` elements.
    pub const LAZYLOAD_JS: Template<NoVars> =
        Template::new(include_str!(concat!(env!("OUT_DIR"), "/lazyload.min.js")));

    /// Variables for delay.js.
    pub struct DelayVars {
        /// Fallback timer in milliseconds.
        pub timeout: u32,
    }

    impl TemplateVars for DelayVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__OPTIMIZADOR_DELAY_TIMEOUT__", &self.timeout.to_string())
        }
    }

    /// Re-injects delayed scripts on first interaction.
    pub const DELAY_JS: Template<DelayVars> =
        Template::new(include_str!(concat!(env!("OUT_DIR"), "/delay.min.js")));

    /// Restores a silenced `window.console`.
    pub const CONSOLE_JS: Template<NoVars> =
        Template::new(include_str!(concat!(env!("OUT_DIR"), "/console.min.js")));

}
