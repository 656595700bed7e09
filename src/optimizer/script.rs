//! Script `type` classification.

use crate::html::Tag;

/// `type` values that browsers execute as classic scripts.
const CLASSIC_TYPES: &[&str] = &[
    "text/javascript",
    "application/javascript",
    "application/x-javascript",
    "text/ecmascript",
    "application/ecmascript",
    "text/jscript",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptType {
    /// No `type`, or a JavaScript MIME type.
    Classic,
    /// `type="module"`.
    Module,
    /// Data blocks (`application/ld+json`, `importmap`, templates) and
    /// anything already neutralized by an optimizer.
    Other,
}

impl ScriptType {
    pub fn of(tag: &Tag<'_>) -> Self {
        let Some(value) = tag.get_lower("type") else {
            return Self::Classic;
        };
        // Parameters such as `;charset=utf-8` do not change the kind
        let mime = value.split(';').next().unwrap_or_default().trim();
        if mime.is_empty() || CLASSIC_TYPES.contains(&mime) {
            Self::Classic
        } else if mime == "module" {
            Self::Module
        } else {
            Self::Other
        }
    }
}
