//! Bounded pattern scanning over a full page.
//!
//! Tags are found with case-insensitive regexes over well-formed tag
//! fragments. Scanning never mutates the page.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

pub static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<link\b[^>]*>").unwrap());
pub static IMG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<img\b[^>]*>").unwrap());
pub static IFRAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<iframe\b[^>]*>").unwrap());
pub static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap());
pub static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap());

/// Comments, `<noscript>` blocks, and raw-text elements, leftmost first.
static REGION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<!--.*?-->|<noscript\b[^>]*>.*?</noscript\s*>|<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>",
    )
    .unwrap()
});

static HEAD_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<head\b[^>]*>").unwrap());
static HEAD_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</head\s*>").unwrap());
static BODY_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</body\s*>").unwrap());

/// Regions of a page that rewriters must not touch.
///
/// - `hidden`: comments and `<noscript>` blocks; nothing inside is processed
/// - `raw_text`: `<script>`/`<style>` elements; their bodies are not markup
#[derive(Debug, Default)]
pub struct Masked {
    hidden: Vec<Range<usize>>,
    raw_text: Vec<Range<usize>>,
}

impl Masked {
    pub fn new(html: &str) -> Self {
        let mut masked = Self::default();
        for m in REGION_RE.find_iter(html) {
            let head = m.as_str().get(..9).unwrap_or(m.as_str()).to_ascii_lowercase();
            if head.starts_with("<!--") || head.starts_with("<noscript") {
                masked.hidden.push(m.range());
            } else {
                masked.raw_text.push(m.range());
            }
        }
        masked
    }

    /// Inside a comment or `<noscript>`.
    pub fn is_hidden(&self, pos: usize) -> bool {
        contains(&self.hidden, pos)
    }

    /// Hidden, or inside the body of a script/style element.
    ///
    /// Use for markup tags (`<img>`, `<link>`); a raw-text element's own
    /// start offset is not "inside" itself.
    pub fn is_masked_markup(&self, pos: usize) -> bool {
        self.is_hidden(pos)
            || self
                .raw_text
                .iter()
                .any(|r| r.start < pos && pos < r.end)
    }
}

fn contains(ranges: &[Range<usize>], pos: usize) -> bool {
    ranges.iter().any(|r| r.contains(&pos))
}

/// Markup tags (`<img>`, `<link>`, ...) outside masked regions.
pub fn markup_tags<'h>(
    re: &'h Regex,
    html: &'h str,
    masked: &'h Masked,
) -> impl Iterator<Item = regex::Match<'h>> + 'h {
    re.find_iter(html)
        .filter(move |m| !masked.is_masked_markup(m.start()))
}

/// A raw-text element (`<script>` or `<style>`) split into parts.
#[derive(Debug, Clone)]
pub struct RawElement<'h> {
    /// Byte span of the whole element in the page.
    pub span: Range<usize>,
    /// Whole element text.
    pub text: &'h str,
    /// Opening tag text.
    pub open: &'h str,
    /// Raw body between the tags.
    pub body: &'h str,
}

/// Raw-text elements matched by `re`, outside comments and `<noscript>`.
pub fn raw_elements<'h>(re: &Regex, html: &'h str, masked: &Masked) -> Vec<RawElement<'h>> {
    re.find_iter(html)
        .filter(|m| !masked.is_hidden(m.start()))
        .filter_map(|m| split_raw_element(m.as_str(), m.range()))
        .collect()
}

fn split_raw_element(text: &str, span: Range<usize>) -> Option<RawElement<'_>> {
    let open_end = text.find('>')? + 1;
    let close_start = text.rfind("</")?;
    if close_start < open_end {
        return None;
    }
    Some(RawElement {
        span,
        text,
        open: &text[..open_end],
        body: &text[open_end..close_start],
    })
}

// Anchors inside comments, `<noscript>` or script/style text do not count.

/// Byte range between the end of `<head ...>` and the start of `</head>`.
pub fn head_range(html: &str) -> Option<Range<usize>> {
    let masked = Masked::new(html);
    let open = markup_tags(&HEAD_OPEN_RE, html, &masked).next()?;
    let close = markup_tags(&HEAD_CLOSE_RE, html, &masked).find(|m| m.start() >= open.end())?;
    Some(open.end()..close.start())
}

/// Offset of the end of the opening `<head>` tag.
pub fn head_open_end(html: &str) -> Option<usize> {
    let masked = Masked::new(html);
    markup_tags(&HEAD_OPEN_RE, html, &masked).next().map(|m| m.end())
}

/// Offset of the first `</head>`.
pub fn head_close_start(html: &str) -> Option<usize> {
    let masked = Masked::new(html);
    markup_tags(&HEAD_CLOSE_RE, html, &masked).next().map(|m| m.start())
}

/// Offset of the last `</body>`.
pub fn body_close_start(html: &str) -> Option<usize> {
    let masked = Masked::new(html);
    markup_tags(&BODY_CLOSE_RE, html, &masked).last().map(|m| m.start())
}
