//! Asset extraction.
//!
//! Produces references in document order. Extraction only reads the page;
//! matches inside comments and `<noscript>` are never returned.

use std::ops::Range;

use crate::html::scan::{self, LINK_RE, SCRIPT_RE, STYLE_RE};
use crate::html::{Masked, Tag, unescape};

/// One extracted asset, scoped to a single optimize call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    /// Verbatim matched markup (whole element for `<script>`/`<style>`).
    pub tag: String,
    /// Entity-decoded `href`/`src`.
    pub url: Option<String>,
    /// Raw element body for inline assets.
    pub content: Option<String>,
    /// Byte span of `tag` in the page it was extracted from.
    pub span: Range<usize>,
}

impl AssetReference {
    /// Tokenized opening tag.
    pub fn open_tag(&self) -> Option<Tag<'_>> {
        Tag::parse(&self.tag)
    }

    /// URL as matched, or `""` for inline assets.
    pub fn url_str(&self) -> &str {
        self.url.as_deref().unwrap_or_default()
    }
}

fn decoded_attr(tag: &Tag<'_>, name: &str) -> Option<String> {
    let value = unescape(tag.get(name)?.trim()).into_owned();
    (!value.is_empty()).then_some(value)
}

/// `<link rel="stylesheet" href="...">` tags.
pub fn extract_stylesheets(html: &str, masked: &Masked) -> Vec<AssetReference> {
    scan::markup_tags(&LINK_RE, html, masked)
        .filter_map(|m| {
            let tag = Tag::parse(m.as_str())?;
            if !tag.has_rel("stylesheet") {
                return None;
            }
            Some(AssetReference {
                tag: m.as_str().to_string(),
                url: Some(decoded_attr(&tag, "href")?),
                content: None,
                span: m.range(),
            })
        })
        .collect()
}

/// `<style>` blocks inside `<head>`.
pub fn extract_inline_styles(html: &str, masked: &Masked) -> Vec<AssetReference> {
    let Some(head) = scan::head_range(html) else {
        return Vec::new();
    };
    scan::raw_elements(&STYLE_RE, html, masked)
        .into_iter()
        .filter(|el| head.contains(&el.span.start))
        .map(|el| AssetReference {
            tag: el.text.to_string(),
            url: None,
            content: Some(el.body.to_string()),
            span: el.span,
        })
        .collect()
}

/// `<script src="..."></script>` elements.
pub fn extract_scripts(html: &str, masked: &Masked) -> Vec<AssetReference> {
    scan::raw_elements(&SCRIPT_RE, html, masked)
        .into_iter()
        .filter_map(|el| {
            let tag = Tag::parse(el.open)?;
            Some(AssetReference {
                tag: el.text.to_string(),
                url: Some(decoded_attr(&tag, "src")?),
                content: None,
                span: el.span,
            })
        })
        .collect()
}
