//! Asset extraction, filtering, caching and combination.
//!
//! The combining optimizers compose these stages:
//! extract → filter → key → (cache hit | combine + minify + write) → splice.

mod cache;
pub mod combine;
mod extract;
mod filter;
mod kind;
pub mod minify;

// Types
pub use cache::{ArtifactStore, CacheKey, CacheKeyBuilder};
pub use extract::AssetReference;
pub use filter::{FilteredAsset, Skip};
pub use kind::AssetKind;

// Extraction (pure functions)
pub use extract::{extract_inline_styles, extract_scripts, extract_stylesheets};

// Filtering
pub use filter::filter_local;
