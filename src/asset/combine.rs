//! Concatenation of eligible assets into one artifact body.
//!
//! CSS inputs are rebased so relative references keep resolving once the
//! rules are served from the cache directory.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

use super::minify::{minify_css, minify_js};
use crate::core::UrlResolver;

static CSS_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^"]*)"|'([^']*)'|([^)'"\s]*))\s*\)"#).unwrap()
});
static IMPORT_STRING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)@import\s+(?:"([^"]*)"|'([^']*)')"#).unwrap());
static IMPORT_RULE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)@import\s[^;]*;").unwrap());
static CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)@charset\s+[^;]*;").unwrap());
static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*:").unwrap());

/// Stylesheet text plus the URL its relative references resolve against.
#[derive(Debug, Clone)]
pub struct CssSource {
    pub base: Url,
    pub content: String,
}

/// Concatenate stylesheets in order, `inline` blocks strictly last.
///
/// `@charset` rules are dropped and every `@import` is hoisted to the top
/// in document order.
pub fn combine_css(files: &[CssSource], inline: &[CssSource], resolver: &UrlResolver) -> String {
    let mut imports = Vec::new();
    let mut bodies = Vec::new();

    for source in files.iter().chain(inline) {
        let without_charset = CHARSET_RE.replace_all(&source.content, "");
        let rebased = rebase_css(&without_charset, &source.base, resolver);
        imports.extend(IMPORT_RULE_RE.find_iter(&rebased).map(|m| m.as_str().to_string()));
        let body = IMPORT_RULE_RE.replace_all(&rebased, "");
        bodies.push(body.trim().to_string());
    }

    let mut out = imports.join("\n");
    for body in bodies.into_iter().filter(|b| !b.is_empty()) {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&body);
    }
    out
}

/// Minified stylesheet, or the input unchanged when it does not parse.
pub fn finish_css(combined: String) -> String {
    minify_css(&combined).unwrap_or(combined)
}

/// Rewrite relative `url(...)` and `@import "..."` targets against `base`.
pub fn rebase_css(css: &str, base: &Url, resolver: &UrlResolver) -> String {
    let rebase = |target: &str| -> Option<String> {
        if !needs_rebase(target) {
            return None;
        }
        let absolute = base.join(target).ok()?;
        Some(resolver.to_site_relative(&absolute))
    };

    let with_urls = CSS_URL_RE.replace_all(css, |caps: &Captures<'_>| {
        let (target, quote) = quoted_capture(caps);
        match rebase(target) {
            Some(new) => format!("url({quote}{new}{quote})"),
            None => caps[0].to_string(),
        }
    });

    IMPORT_STRING_RE
        .replace_all(&with_urls, |caps: &Captures<'_>| {
            let (target, quote) = quoted_capture(caps);
            match rebase(target) {
                Some(new) => format!("@import {quote}{new}{quote}"),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Target of a `"..." | '...' | bare` capture set and its quote.
fn quoted_capture<'c>(caps: &'c Captures<'_>) -> (&'c str, &'static str) {
    if let Some(m) = caps.get(1) {
        (m.as_str(), "\"")
    } else if let Some(m) = caps.get(2) {
        (m.as_str(), "'")
    } else {
        (caps.get(3).map_or("", |m| m.as_str()), "")
    }
}

/// Page-relative references only: not empty, root-relative, fragment,
/// protocol-relative or carrying a scheme (`data:`, `https:`).
fn needs_rebase(target: &str) -> bool {
    let target = target.trim();
    !(target.is_empty()
        || target.starts_with('/')
        || target.starts_with('#')
        || SCHEME_RE.is_match(target))
}

/// Minify each script on its own and join them.
///
/// A script that fails to parse goes in verbatim.
pub fn combine_js<S: AsRef<str>>(sources: &[S]) -> String {
    sources
        .iter()
        .map(|source| {
            let source = source.as_ref();
            minify_js(source)
                .map(|code| code.trim_end().to_string())
                .unwrap_or_else(|| source.trim().to_string())
        })
        .collect::<Vec<_>>()
        .join(";\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> UrlResolver {
        UrlResolver::new(Url::parse("https://example.com").unwrap(), "/srv/www")
    }

    fn source(base: &str, content: &str) -> CssSource {
        CssSource {
            base: Url::parse(base).unwrap(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_rebase_relative_urls() {
        let base = Url::parse("https://example.com/wp-content/themes/t/css/style.css").unwrap();
        let css = r#".a{background:url(../img/a.png)}.b{background:url("b.png")}.c{background:url('/abs.png')}.d{background:url(data:image/png;base64,AA)}.e{filter:url(#f)}"#;
        let out = rebase_css(css, &base, &resolver());
        assert!(out.contains("url(/wp-content/themes/t/img/a.png)"));
        assert!(out.contains(r#"url("/wp-content/themes/t/css/b.png")"#));
        assert!(out.contains("url('/abs.png')"));
        assert!(out.contains("url(data:image/png;base64,AA)"));
        assert!(out.contains("url(#f)"));
    }

    #[test]
    fn test_rebase_keeps_external_absolute() {
        let base = Url::parse("https://example.com/css/a.css").unwrap();
        let out = rebase_css("@import 'fonts.css';.x{background:url(https://cdn.net/x.png)}", &base, &resolver());
        assert_eq!(out, "@import '/css/fonts.css';.x{background:url(https://cdn.net/x.png)}");
    }

    #[test]
    fn test_combine_order_imports_and_charset() {
        let files = [
            source("https://example.com/a.css", "@charset \"utf-8\";\n.a{color:red}"),
            source("https://example.com/b/b.css", "@import url(base.css);\n.b{color:blue}"),
        ];
        let inline = [source("https://example.com/page/", ".inline{color:green}")];
        let out = combine_css(&files, &inline, &resolver());

        assert!(out.starts_with("@import url(/b/base.css);"));
        assert!(!out.contains("@charset"));
        let a = out.find(".a{").unwrap();
        let b = out.find(".b{").unwrap();
        let inline_pos = out.find(".inline{").unwrap();
        assert!(a < b && b < inline_pos);
    }

    #[test]
    fn test_finish_css_minifies() {
        assert_eq!(finish_css(".a {\n  color: red;\n}".into()), ".a{color:red}");
    }

    #[test]
    fn test_combine_js_keeps_page_globals() {
        let out = combine_js(&[
            "var settings = { ajax: '/admin-ajax.php' };",
            "function initSlider(el) { return el; }",
        ]);
        assert!(out.contains("settings"));
        assert!(out.contains("admin-ajax.php"));
        assert!(out.contains("initSlider"));
        let (first, second) = out.split_once(";\n").unwrap();
        assert!(first.contains("settings") && second.contains("initSlider"));
    }

    #[test]
    fn test_combine_js_joins_and_falls_back() {
        let out = combine_js(&["var first = 1;", "this is not js", "window.last = 2;"]);
        let parts: Vec<_> = out.split(";\n").collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[0].contains("first"));
        assert_eq!(parts[1], "this is not js");
        assert!(parts[2].contains("last"));
    }
}
