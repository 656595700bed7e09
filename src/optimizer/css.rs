//! Stylesheet combination.
//!
//! ```text
//! disabled ─► unchanged
//! scanning ─► nothing eligible ─► unchanged
//!          └► filtering ─► key ─► cache hit ──────────────► splice
//!                              └► cache miss ─► build ─────► splice
//! ```
//!
//! Eligible `<link>` tags (and optionally `<head>` `<style>` blocks) are
//! removed and one reference to the combined file goes before `</head>`.

use std::fs;
use std::sync::LazyLock;

use regex::Regex;

use super::critical::CRITICAL_STYLE_ID;
use super::{OptimizeContext, Optimizer};
use crate::asset::combine::{CssSource, combine_css, finish_css};
use crate::asset::{
    AssetKind, AssetReference, CacheKey, CacheKeyBuilder, FilteredAsset, Skip,
    extract_inline_styles, extract_stylesheets, filter_local,
};
use crate::debug;
use crate::error::OptimizeError;
use crate::html::{Masked, scan, splice};

/// Inline blocks shorter than this stay in place.
const MIN_INLINE_LEN: usize = 50;

/// Inline blocks that hide `body` until a script reveals it.
static BODY_HIDING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)body\s*\{[^}]*(?:display\s*:\s*none|visibility\s*:\s*hidden|opacity\s*:\s*0)")
        .unwrap()
});

pub struct CssOptimizer<'a> {
    ctx: &'a OptimizeContext<'a>,
}

impl<'a> CssOptimizer<'a> {
    pub fn new(ctx: &'a OptimizeContext<'a>) -> Self {
        Self { ctx }
    }

    fn eligible_link(&self, asset: AssetReference) -> Result<FilteredAsset, Skip> {
        let tag = asset.open_tag().ok_or(Skip::Other("unparsable tag"))?;
        if tag.has_rel("alternate") || tag.has("disabled") {
            return Err(Skip::Other("not an active stylesheet"));
        }
        if !applies_to_screen(tag.get_lower("media").as_deref()) {
            return Err(Skip::Other("media-specific"));
        }
        if self.ctx.store.is_artifact_url(asset.url_str()) {
            return Err(Skip::Other("already combined"));
        }
        filter_local(asset, &self.ctx.resolver, &self.ctx.config.css.exclude)
    }

    fn eligible_inline(&self, asset: &AssetReference) -> Result<(), Skip> {
        let content = asset.content.as_deref().unwrap_or_default();
        if content.trim().len() < MIN_INLINE_LEN {
            return Err(Skip::Other("too short"));
        }

        let tag = asset.open_tag().ok_or(Skip::Other("unparsable tag"))?;
        if matches!(tag.get("id"), Some("wp-custom-css") | Some(CRITICAL_STYLE_ID))
            || tag.has("data-no-optimize")
        {
            return Err(Skip::Other("marked critical"));
        }
        if !applies_to_screen(tag.get_lower("media").as_deref()) {
            return Err(Skip::Other("media-specific"));
        }

        let lower = content.to_ascii_lowercase();
        if lower.contains("@media print") || lower.contains("@keyframes") {
            return Err(Skip::Other("print or animation rules"));
        }
        if BODY_HIDING_RE.is_match(content) {
            return Err(Skip::Other("hides body"));
        }
        if let Some(pattern) = self.ctx.config.css.exclude.matching(&asset.tag) {
            return Err(Skip::Excluded(pattern.to_string()));
        }
        Ok(())
    }

    fn build(
        &self,
        key: &CacheKey,
        files: &[FilteredAsset],
        inline: &[AssetReference],
    ) -> Result<(), OptimizeError> {
        let store = &self.ctx.store;
        // Fail before reading anything when the cache is unusable
        store.ensure_dir(AssetKind::Css)?;

        let mut sources = Vec::with_capacity(files.len());
        for file in files {
            let url = file.asset.url_str();
            let Some(base) = self.ctx.resolver.absolute(url) else {
                continue;
            };
            match fs::read_to_string(&file.path) {
                Ok(content) => sources.push(CssSource { base, content }),
                Err(err) => debug!("css"; "skipping unreadable {}: {}", file.path.display(), err),
            }
        }
        let inline_sources: Vec<_> = inline
            .iter()
            .map(|asset| CssSource {
                base: self.ctx.page_url.clone(),
                content: asset.content.clone().unwrap_or_default(),
            })
            .collect();

        let combined = finish_css(combine_css(&sources, &inline_sources, &self.ctx.resolver));
        let path = store.write(AssetKind::Css, key, &combined)?;
        debug!("css"; "wrote {} ({} bytes)", path.display(), combined.len());
        Ok(())
    }

    fn reference_tag(&self, href: &str) -> String {
        if self.ctx.config.critical.is_active() {
            format!(
                "<link rel=\"preload\" as=\"style\" href=\"{href}\" onload=\"this.onload=null;this.rel='stylesheet'\"><noscript><link rel=\"stylesheet\" href=\"{href}\"></noscript>"
            )
        } else {
            format!("<link rel=\"stylesheet\" href=\"{href}\">")
        }
    }
}

/// Whether a `media` value always applies on screens.
fn applies_to_screen(media: Option<&str>) -> bool {
    matches!(media, None | Some("") | Some("all") | Some("screen"))
}

impl Optimizer for CssOptimizer<'_> {
    const NAME: &'static str = "css";

    fn is_enabled(&self) -> bool {
        self.ctx.config.css.minify
    }

    fn optimize(&self, html: &str) -> Result<String, OptimizeError> {
        if scan::head_close_start(html).is_none() {
            return Ok(html.to_string());
        }
        let masked = Masked::new(html);

        let files: Vec<FilteredAsset> = extract_stylesheets(html, &masked)
            .into_iter()
            .filter_map(|asset| {
                let url = asset.url_str().to_string();
                self.eligible_link(asset)
                    .inspect_err(|skip| debug!("css"; "skipping {}: {}", url, skip))
                    .ok()
            })
            .collect();

        let inline: Vec<AssetReference> = if self.ctx.config.css.combine_inline {
            extract_inline_styles(html, &masked)
                .into_iter()
                .filter(|asset| {
                    self.eligible_inline(asset)
                        .inspect_err(|skip| debug!("css"; "keeping inline style: {}", skip))
                        .is_ok()
                })
                .collect()
        } else {
            Vec::new()
        };

        if files.is_empty() && inline.is_empty() {
            return Ok(html.to_string());
        }

        let mut builder = CacheKeyBuilder::new();
        for file in &files {
            builder.file(file.asset.url_str(), file.mtime);
        }
        for asset in &inline {
            builder.inline(asset.content.as_deref().unwrap_or_default());
        }
        let key = builder.finish();

        if self.ctx.store.exists(AssetKind::Css, &key) {
            debug!("css"; "cache hit {}", key);
        } else {
            self.build(&key, &files, &inline)?;
        }

        let spans = files
            .iter()
            .map(|f| f.asset.span.clone())
            .chain(inline.iter().map(|a| a.span.clone()));
        let stripped = splice::remove_spans(html, spans);
        let tag = self.reference_tag(&self.ctx.store.url(AssetKind::Css, &key));
        debug!("css"; "combined {} files and {} inline blocks", files.len(), inline.len());

        Ok(splice::insert_before_head_end(&stripped, &tag).unwrap_or_else(|| html.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::tests::TestSite;

    const LONG_RULE: &str = ".inline-block-rule { color: rebeccapurple; margin: 0 auto; }";

    fn page(head: &str) -> String {
        format!("<html><head>{head}</head><body><p>x</p></body></html>")
    }

    #[test]
    fn test_combines_links_before_head_end() {
        let site = TestSite::new("[css]\nminify = true");
        site.write("wp-content/theme/a.css", ".a { color: red; }");
        site.write("wp-content/theme/b.css", ".b { background: url(img/b.png); }");
        let ctx = site.ctx();

        let html = page(r#"<link rel="stylesheet" href="/wp-content/theme/a.css"><link rel="stylesheet" href="/wp-content/theme/b.css">"#);
        let out = CssOptimizer::new(&ctx).optimize(&html).unwrap();

        assert!(!out.contains("/wp-content/theme/a.css"));
        assert!(!out.contains("/wp-content/theme/b.css"));
        assert_eq!(out.matches("<link").count(), 1);
        assert!(out.contains("/wp-content/cache/optimizador-pro/css/combined-"));
        assert!(out.contains(".css\"></head>"));

        let files = site.cache_files("css");
        assert_eq!(files.len(), 1);
        let combined = fs::read_to_string(&files[0]).unwrap();
        assert!(combined.find(".a{").unwrap() < combined.find(".b{").unwrap());
        assert!(combined.contains("/wp-content/theme/img/b.png"));

        assert_eq!(CssOptimizer::new(&ctx).optimize(&out).unwrap(), out);
    }

    #[test]
    fn test_ineligible_links_untouched() {
        let site = TestSite::new("[css]\nminify = true\nexclude = \"keep.css\"");
        site.write("keep.css", "a{}");
        site.write("print.css", "a{}");
        let ctx = site.ctx();

        let html = page(concat!(
            r#"<link rel="stylesheet" href="/keep.css">"#,
            r#"<link rel="stylesheet" href="/print.css" media="print">"#,
            r#"<link rel="stylesheet" href="https://cdn.example.net/x.css">"#,
            r#"<link rel="stylesheet" href="/missing.css">"#,
        ));
        assert_eq!(CssOptimizer::new(&ctx).optimize(&html).unwrap(), html);
        assert!(site.cache_files("css").is_empty());
    }

    #[test]
    fn test_inline_styles_appended_after_files() {
        let site = TestSite::new("[css]\nminify = true\ncombine_inline = true");
        site.write("a.css", ".from-file { color: blue; }");
        let ctx = site.ctx();

        let html = page(&format!(
            r#"<style>{LONG_RULE}</style><link rel="stylesheet" href="/a.css"><style>.tiny{{}}</style><style id="wp-custom-css">{LONG_RULE}</style>"#
        ));
        let out = CssOptimizer::new(&ctx).optimize(&html).unwrap();

        assert!(out.contains("<style>.tiny{}</style>"));
        assert!(out.contains(r#"<style id="wp-custom-css">"#));
        assert_eq!(out.matches(LONG_RULE).count(), 1);

        let combined = fs::read_to_string(&site.cache_files("css")[0]).unwrap();
        assert!(combined.find(".from-file").unwrap() < combined.find(".inline-block-rule").unwrap());
    }

    #[test]
    fn test_inline_critical_markers_kept() {
        let site = TestSite::new("[css]\nminify = true\ncombine_inline = true");
        let ctx = site.ctx();
        let optimizer = CssOptimizer::new(&ctx);
        for body in [
            format!("@media print {{ {LONG_RULE} }}"),
            format!("@keyframes spin {{ from {{ opacity: 0 }} }} {LONG_RULE}"),
            format!("body {{ opacity: 0; }} {LONG_RULE}"),
        ] {
            let html = page(&format!("<style>{body}</style>"));
            assert_eq!(optimizer.optimize(&html).unwrap(), html);
        }
    }

    #[test]
    fn test_async_reference_with_critical_css() {
        let site = TestSite::new("[css]\nminify = true\n[critical]\ncss = \"body{margin:0}\"");
        site.write("a.css", "a{color:red}");
        let ctx = site.ctx();

        let out = CssOptimizer::new(&ctx)
            .optimize(&page(r#"<link rel="stylesheet" href="/a.css">"#))
            .unwrap();
        assert!(out.contains(r#"<link rel="preload" as="style" href="https://example.com/wp-content/cache/optimizador-pro/css/combined-"#));
        assert!(out.contains("<noscript><link rel=\"stylesheet\""));
    }

    #[test]
    fn test_cache_hit_reuses_artifact() {
        let site = TestSite::new("[css]\nminify = true");
        site.write("a.css", "a{color:red}");
        let ctx = site.ctx();
        let html = page(r#"<link rel="stylesheet" href="/a.css">"#);

        let first = CssOptimizer::new(&ctx).optimize(&html).unwrap();
        let artifact = site.cache_files("css").remove(0);
        fs::write(&artifact, "/* cached */").unwrap();

        let second = CssOptimizer::new(&ctx).optimize(&html).unwrap();
        assert_eq!(first, second);
        assert_eq!(fs::read_to_string(&artifact).unwrap(), "/* cached */");
    }

    #[test]
    fn test_unusable_cache_dir_is_an_error() {
        let site = TestSite::new("[css]\nminify = true\n[cache]\ndir = \"blocked\"");
        site.write("blocked", "file, not a directory");
        site.write("a.css", "a{}");
        let ctx = site.ctx();

        let err = CssOptimizer::new(&ctx)
            .optimize(&page(r#"<link rel="stylesheet" href="/a.css">"#))
            .unwrap_err();
        assert!(matches!(err, OptimizeError::CacheDir { .. }));
    }

    #[test]
    fn test_head_end_inside_script_or_comment_is_ignored() {
        let site = TestSite::new("[css]\nminify = true");
        site.write("a.css", "a{color:red}");
        let ctx = site.ctx();

        let html = concat!(
            "<html><head><script>var tpl = \"</head>\";</script><!-- </head> -->",
            r#"<link rel="stylesheet" href="/a.css"></head><body></body></html>"#,
        );
        let out = CssOptimizer::new(&ctx).optimize(html).unwrap();
        assert!(out.contains("<script>var tpl = \"</head>\";</script><!-- </head> --><link rel=\"stylesheet\" href=\"https://example.com/wp-content/cache/optimizador-pro/css/combined-"));
        assert!(out.ends_with(".css\"></head><body></body></html>"));
        assert!(!out.contains("\"/a.css\""));
    }
}
