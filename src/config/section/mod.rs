//! Configuration section definitions.
//!
//! Each module corresponds to one or more sections in `optimizador.toml`:
//!
//! | Module  | TOML Section                   | Purpose                          |
//! |---------|--------------------------------|----------------------------------|
//! | `site`  | `[site]`                       | Base URL and document root       |
//! | `cache` | `[cache]`                      | Combined artifact location       |
//! | `css`   | `[css]`, `[critical]`          | Stylesheet combine, critical CSS |
//! | `js`    | `[js]`, `[defer]`, `[delay]`   | Script combine, defer, delay     |
//! | `media` | `[lazyload]`, `[fonts]`        | Images/iframes, Google Fonts     |
//! | `page`  | `[page]`, `[debug]`            | Page exclusions, debug helpers   |

mod cache;
mod css;
mod js;
mod media;
mod page;
mod site;

pub use cache::{CacheConfig, DEFAULT_CACHE_SUBPATH};
pub use css::{CriticalConfig, CssConfig};
pub use js::{DeferConfig, DelayConfig, JsConfig};
pub use media::{FontsConfig, LazyLoadConfig};
pub use page::{DebugConfig, PageConfig};
pub use site::SiteConfig;
