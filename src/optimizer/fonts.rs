//! Google Fonts optimization.
//!
//! Two modes:
//! - combine: every mergeable request becomes one v2 request with
//!   `display=swap`, placed where the first one was
//! - async: each request is kept but loaded through `preload` + `onload`,
//!   with a `<noscript>` fallback
//!
//! Both add `preconnect` hints for the two Google Fonts hosts.

use std::collections::BTreeSet;
use std::ops::Range;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use rustc_hash::FxHashMap;
use url::Url;

use super::{OptimizeContext, Optimizer};
use crate::debug;
use crate::error::OptimizeError;
use crate::html::scan::{self, LINK_RE};
use crate::html::splice;
use crate::html::tag::format_attr;
use crate::html::{Masked, Tag, unescape};

const FONTS_CSS_MARKER: &str = "fonts.googleapis.com/css";
const FONTS_API_V2: &str = "https://fonts.googleapis.com/css2";
const STATIC_HOST: &str = "fonts.gstatic.com";
const PRECONNECT: &str = "<link rel=\"preconnect\" href=\"https://fonts.googleapis.com\"><link rel=\"preconnect\" href=\"https://fonts.gstatic.com\" crossorigin>";

/// Characters escaped in a family name.
const FAMILY_NAME: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'+')
    .add(b'<')
    .add(b'>')
    .add(b':')
    .add(b';')
    .add(b'@')
    .add(b',')
    .add(b'|');

// =============================================================================
// Font specs
// =============================================================================

/// One style of a family. Orders upright before italic, then by weight,
/// which is the tuple order the v2 API requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FontWeight {
    pub italic: bool,
    pub weight: u16,
}

impl FontWeight {
    pub const REGULAR: Self = Self::new(false, 400);

    pub const fn new(italic: bool, weight: u16) -> Self {
        Self { italic, weight }
    }

    /// Parse a v1 variant token (`300`, `700italic`, `300i`, `bold`, `bi`).
    pub fn parse_legacy(token: &str) -> Option<Self> {
        let token = token.trim().to_ascii_lowercase();
        let (weight, italic) = match token.as_str() {
            "" | "r" | "regular" | "normal" => (400, false),
            "i" | "italic" => (400, true),
            "b" | "bold" => (700, false),
            "bi" | "bolditalic" => (700, true),
            other => {
                let split = other
                    .find(|c: char| !c.is_ascii_digit())
                    .unwrap_or(other.len());
                let (digits, suffix) = other.split_at(split);
                let italic = match suffix {
                    "" => false,
                    "i" | "italic" => true,
                    _ => return None,
                };
                (digits.parse().ok()?, italic)
            }
        };
        Self::checked(italic, weight)
    }

    fn checked(italic: bool, weight: u16) -> Option<Self> {
        (1..=1000).contains(&weight).then_some(Self::new(italic, weight))
    }
}

/// A family and the styles requested for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFamilySpec {
    pub name: String,
    pub weights: BTreeSet<FontWeight>,
}

impl FontFamilySpec {
    /// Parse one `family` entry in either API syntax.
    ///
    /// `None` for anything not expressible as discrete weights (variable
    /// ranges, other axes), so the request is left alone.
    pub fn parse(entry: &str) -> Option<Self> {
        let mut parts = entry.splitn(3, ':');
        let name = parts.next()?.trim();
        if name.is_empty() {
            return None;
        }
        let variants = parts.next().unwrap_or_default().trim();

        let mut weights = match variants.split_once('@') {
            Some((axes, tuples)) => parse_v2_axes(axes, tuples)?,
            None => variants
                .split(',')
                .map(FontWeight::parse_legacy)
                .collect::<Option<BTreeSet<_>>>()?,
        };
        if weights.is_empty() {
            weights.insert(FontWeight::REGULAR);
        }
        Some(Self {
            name: name.to_string(),
            weights,
        })
    }

    /// `family=` parameter in v2 syntax.
    pub fn to_param(&self) -> String {
        let name = utf8_percent_encode(&self.name, FAMILY_NAME);
        let any_italic = self.weights.iter().any(|w| w.italic);
        let tuples: Vec<String> = self
            .weights
            .iter()
            .map(|w| {
                if any_italic {
                    format!("{},{}", u8::from(w.italic), w.weight)
                } else {
                    w.weight.to_string()
                }
            })
            .collect();
        let axes = if any_italic { "ital,wght" } else { "wght" };
        format!("family={name}:{axes}@{}", tuples.join(";"))
    }
}

/// `ital,wght@0,400;1,700` style variants.
fn parse_v2_axes(axes: &str, tuples: &str) -> Option<BTreeSet<FontWeight>> {
    let axes: Vec<&str> = axes.split(',').map(str::trim).collect();
    if axes.iter().any(|a| !matches!(*a, "ital" | "wght")) {
        return None;
    }

    let mut weights = BTreeSet::new();
    for tuple in tuples.split(';').filter(|t| !t.trim().is_empty()) {
        let values: Vec<&str> = tuple.split(',').map(str::trim).collect();
        if values.len() != axes.len() {
            return None;
        }
        let mut italic = false;
        let mut weight = 400;
        for (axis, value) in axes.iter().zip(values) {
            match *axis {
                "ital" => italic = value == "1",
                _ => weight = value.parse().ok()?,
            }
        }
        weights.insert(FontWeight::checked(italic, weight)?);
    }
    Some(weights)
}

/// Absolute URL of a Google Fonts stylesheet reference.
fn parse_fonts_url(href: &str) -> Option<Url> {
    let href = href.trim();
    let absolute = match href.strip_prefix("//") {
        Some(rest) => format!("https://{rest}"),
        None => href.to_string(),
    };
    let url = Url::parse(&absolute).ok()?;
    (url.host_str() == Some("fonts.googleapis.com") && url.path().starts_with("/css"))
        .then_some(url)
}

/// Families requested by one URL, `None` if any entry is unsupported.
pub fn parse_families(url: &Url) -> Option<Vec<FontFamilySpec>> {
    let mut families = Vec::new();
    for (key, value) in url.query_pairs() {
        if key == "family" {
            for entry in value.split('|').filter(|e| !e.trim().is_empty()) {
                families.push(FontFamilySpec::parse(entry)?);
            }
        }
    }
    (!families.is_empty()).then_some(families)
}

/// Merge by family name, first-seen order, unioning styles.
pub fn merge_families(families: impl IntoIterator<Item = FontFamilySpec>) -> Vec<FontFamilySpec> {
    let mut merged: Vec<FontFamilySpec> = Vec::new();
    let mut index: FxHashMap<String, usize> = FxHashMap::default();
    for family in families {
        match index.get(&family.name) {
            Some(&i) => merged[i].weights.extend(family.weights),
            None => {
                index.insert(family.name.clone(), merged.len());
                merged.push(family);
            }
        }
    }
    merged
}

/// Single v2 request covering every family.
pub fn combined_url(families: &[FontFamilySpec]) -> String {
    let params: Vec<String> = families.iter().map(FontFamilySpec::to_param).collect();
    format!("{FONTS_API_V2}?{}&display=swap", params.join("&"))
}

// =============================================================================
// Optimizer
// =============================================================================

/// One Google Fonts stylesheet link in the page.
struct FontLink {
    span: Range<usize>,
    /// Raw `href` attribute value.
    href: String,
    /// `None` when the request cannot be merged.
    families: Option<Vec<FontFamilySpec>>,
}

fn font_links(html: &str, masked: &Masked) -> Vec<FontLink> {
    scan::markup_tags(&LINK_RE, html, masked)
        .filter_map(|m| {
            let tag = Tag::parse(m.as_str())?;
            if !tag.has_rel("stylesheet") {
                return None;
            }
            let href = tag.get("href")?;
            let decoded = unescape(href);
            if !decoded.contains(FONTS_CSS_MARKER) {
                return None;
            }
            let url = parse_fonts_url(&decoded)?;
            // Subsetted requests (`text=`) only cover specific glyphs
            if url.query_pairs().any(|(k, _)| k == "text") {
                return None;
            }
            Some(FontLink {
                span: m.range(),
                href: href.to_string(),
                families: parse_families(&url),
            })
        })
        .collect()
}

fn has_preconnect(html: &str, masked: &Masked) -> bool {
    scan::markup_tags(&LINK_RE, html, masked).any(|m| {
        Tag::parse(m.as_str()).is_some_and(|tag| {
            tag.has_rel("preconnect") && tag.get("href").is_some_and(|h| h.contains(STATIC_HOST))
        })
    })
}

pub struct GoogleFontsOptimizer<'a> {
    ctx: &'a OptimizeContext<'a>,
}

impl<'a> GoogleFontsOptimizer<'a> {
    pub fn new(ctx: &'a OptimizeContext<'a>) -> Self {
        Self { ctx }
    }

    fn combine(&self, html: &str, links: Vec<FontLink>) -> String {
        let mut mergeable = links.into_iter().filter(|l| l.families.is_some()).peekable();
        let Some(first_span) = mergeable.peek().map(|l| l.span.clone()) else {
            return html.to_string();
        };

        let mut spans = Vec::new();
        let mut families = Vec::new();
        for link in mergeable {
            spans.push(link.span);
            families.extend(link.families.unwrap_or_default());
        }
        let merged = merge_families(families);
        let href = combined_url(&merged);
        debug!("fonts"; "merged {} requests into {} families", spans.len(), merged.len());

        let replacement = format!("<link rel=\"stylesheet\" {}>", format_attr("href", Some(&href)));
        let mut edits: Vec<_> = spans
            .into_iter()
            .map(|span| {
                let text = if span == first_span {
                    replacement.clone()
                } else {
                    String::new()
                };
                (span, text)
            })
            .collect();
        splice::replace_spans(html, &mut edits)
    }

    fn load_async(&self, html: &str, links: Vec<FontLink>) -> String {
        let mut edits: Vec<_> = links
            .into_iter()
            .map(|link| {
                let href = format_attr("href", Some(&link.href));
                let tag = format!(
                    "<link rel=\"preload\" as=\"style\" {href} onload=\"this.onload=null;this.rel='stylesheet'\"><noscript><link rel=\"stylesheet\" {href}></noscript>"
                );
                (link.span, tag)
            })
            .collect();
        splice::replace_spans(html, &mut edits)
    }
}

impl Optimizer for GoogleFontsOptimizer<'_> {
    const NAME: &'static str = "fonts";

    fn is_enabled(&self) -> bool {
        self.ctx.config.fonts.optimize
    }

    fn optimize(&self, html: &str) -> Result<String, OptimizeError> {
        let masked = Masked::new(html);
        let links = font_links(html, &masked);

        let out = if links.is_empty() {
            html.to_string()
        } else if self.ctx.config.fonts.async_loading {
            self.load_async(html, links)
        } else {
            self.combine(html, links)
        };

        if has_preconnect(&out, &Masked::new(&out)) {
            return Ok(out);
        }
        Ok(splice::insert_after_head_start(&out, PRECONNECT).unwrap_or(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::tests::TestSite;

    fn family(entry: &str) -> FontFamilySpec {
        FontFamilySpec::parse(entry).unwrap()
    }

    #[test]
    fn test_legacy_weights() {
        let parsed = family("Lato:300,regular,italic,700italic,300i,b,bi");
        let weights: Vec<_> = parsed.weights.iter().map(|w| (w.italic, w.weight)).collect();
        assert_eq!(
            weights,
            vec![(false, 300), (false, 400), (false, 700), (true, 300), (true, 400), (true, 700)]
        );
        assert_eq!(family("Roboto").weights, BTreeSet::from([FontWeight::REGULAR]));
        assert!(FontFamilySpec::parse("Roboto:heavy").is_none());
    }

    #[test]
    fn test_v2_axes() {
        let parsed = family("Inter:ital,wght@0,400;1,700");
        assert_eq!(
            parsed.weights,
            BTreeSet::from([FontWeight::new(false, 400), FontWeight::new(true, 700)])
        );
        assert_eq!(parsed.to_param(), "family=Inter:ital,wght@0,400;1,700");
        // Variable ranges are not discrete weights
        assert!(FontFamilySpec::parse("Inter:wght@100..900").is_none());
        assert!(FontFamilySpec::parse("Inter:opsz,wght@14,400").is_none());
    }

    #[test]
    fn test_merge_and_combined_url() {
        let v1 = Url::parse("https://fonts.googleapis.com/css?family=Open+Sans:300,400|Roboto:400").unwrap();
        let v2 = Url::parse("https://fonts.googleapis.com/css2?family=Open+Sans:wght@400;600").unwrap();
        let merged = merge_families(
            parse_families(&v1)
                .unwrap()
                .into_iter()
                .chain(parse_families(&v2).unwrap()),
        );
        assert_eq!(
            combined_url(&merged),
            "https://fonts.googleapis.com/css2?family=Open%20Sans:wght@300;400;600&family=Roboto:wght@400&display=swap"
        );
    }

    const PAGE: &str = r#"<html><head><link rel="stylesheet" href="https://fonts.googleapis.com/css?family=Open+Sans:300,400"><link rel="stylesheet" href="/theme.css"><link rel='stylesheet' href='//fonts.googleapis.com/css?family=Roboto:400&amp;display=swap'></head><body></body></html>"#;

    #[test]
    fn test_combine_mode() {
        let site = TestSite::new("[fonts]\noptimize = true");
        let ctx = site.ctx();
        let out = GoogleFontsOptimizer::new(&ctx).optimize(PAGE).unwrap();

        assert_eq!(out.matches("fonts.googleapis.com/css").count(), 1);
        assert!(out.contains(
            r#"<link rel="stylesheet" href="https://fonts.googleapis.com/css2?family=Open%20Sans:wght@300;400&family=Roboto:wght@400&display=swap"><link rel="stylesheet" href="/theme.css">"#
        ));
        assert!(out.starts_with(&format!("<html><head>{PRECONNECT}")));
        assert_eq!(GoogleFontsOptimizer::new(&ctx).optimize(&out).unwrap(), out);
    }

    #[test]
    fn test_async_mode() {
        let site = TestSite::new("[fonts]\noptimize = true\nasync = true");
        let ctx = site.ctx();
        let out = GoogleFontsOptimizer::new(&ctx).optimize(PAGE).unwrap();

        assert_eq!(out.matches("rel=\"preload\" as=\"style\"").count(), 2);
        assert!(out.contains(
            r#"<noscript><link rel="stylesheet" href="//fonts.googleapis.com/css?family=Roboto:400&amp;display=swap"></noscript>"#
        ));
        assert_eq!(GoogleFontsOptimizer::new(&ctx).optimize(&out).unwrap(), out);
    }

    #[test]
    fn test_text_subset_and_ranges_left_alone() {
        let site = TestSite::new("[fonts]\noptimize = true");
        let ctx = site.ctx();
        let subset = r#"<link rel="stylesheet" href="https://fonts.googleapis.com/css2?family=Lobster&text=Hello">"#;
        let range = r#"<link rel="stylesheet" href="https://fonts.googleapis.com/css2?family=Inter:wght@100..900">"#;
        let html = format!("<head>{subset}{range}</head>");
        let out = GoogleFontsOptimizer::new(&ctx).optimize(&html).unwrap();
        assert_eq!(out, format!("<head>{PRECONNECT}{subset}{range}</head>"));
    }

    #[test]
    fn test_existing_preconnect_not_duplicated() {
        let site = TestSite::new("[fonts]\noptimize = true");
        let ctx = site.ctx();
        let html = r#"<head><link rel="preconnect" href="https://fonts.gstatic.com" crossorigin></head>"#;
        assert_eq!(GoogleFontsOptimizer::new(&ctx).optimize(html).unwrap(), html);
    }
}
