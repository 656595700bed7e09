//! Core types shared by every optimizer.
//!
//! - `url`: URL → document-root path resolution and mtimes
//! - `exclude`: substring exclusion lists

pub mod exclude;
pub mod url;

pub use exclude::ExclusionList;
pub use url::{UrlResolver, mtime, strip_query_fragment};
