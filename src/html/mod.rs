//! Bounded HTML toolkit.
//!
//! Not a parser: pages are scanned with regexes over well-formed tag
//! fragments, and anything ambiguous is left untouched.
//!
//! - `scan`: tag/element extraction, masked regions, anchors
//! - `tag`: opening-tag tokenizer and attribute edits
//! - `splice`: span replacement and anchor insertion
//! - `escape`: entity escaping

pub mod escape;
pub mod scan;
pub mod splice;
pub mod tag;

pub use escape::{escape_attr, unescape};
pub use scan::{Masked, RawElement};
pub use tag::{Tag, TagEditor};
