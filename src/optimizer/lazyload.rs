//! Image and iframe lazy loading.
//!
//! `<img>` sources move to `data-src` behind an inline SVG placeholder
//! sized like the image; iframes only swap `src` to `data-src`. An
//! activation script loads elements as they approach the viewport.

use super::{OptimizeContext, Optimizer};
use crate::core::ExclusionList;
use crate::embed::client::LAZYLOAD_JS;
use crate::error::OptimizeError;
use crate::html::scan::{self, IFRAME_RE, IMG_RE};
use crate::html::tag::merge_class;
use crate::html::{Masked, Tag, TagEditor, splice, unescape};
use crate::image;

const LAZY_CLASS: &str = "lazyload";
const SCRIPT_ID: &str = "optimizador-pro-lazyload";
const DEFAULT_EXCLUDES: &[&str] = &["no-lazy", "skip-lazy", "data-no-lazy"];

/// Inline SVG with the given aspect, no network request.
pub fn placeholder(width: u32, height: u32) -> String {
    format!(
        "data:image/svg+xml,%3Csvg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 {width} {height}'%3E%3C/svg%3E"
    )
}

/// Unitless positive integer attribute.
fn dimension_attr(tag: &Tag<'_>, name: &str) -> Option<u32> {
    tag.get(name)?.trim().parse().ok().filter(|&v| v > 0)
}

pub struct LazyLoadOptimizer<'a> {
    ctx: &'a OptimizeContext<'a>,
    exclude: ExclusionList,
}

impl<'a> LazyLoadOptimizer<'a> {
    pub fn new(ctx: &'a OptimizeContext<'a>) -> Self {
        Self {
            ctx,
            exclude: ctx.config.lazyload.exclude.with_defaults(DEFAULT_EXCLUDES),
        }
    }

    /// Source to defer, `None` when the element must load eagerly.
    fn lazy_src<'t>(&self, tag: &'t Tag<'_>) -> Option<&'t str> {
        let src = tag.get("src")?;
        let trimmed = src.trim();
        let skip = trimmed.is_empty()
            || trimmed.starts_with("data:")
            || trimmed.starts_with("about:")
            || tag.has("data-src")
            || tag.get_lower("loading").as_deref() == Some("eager")
            || self.exclude.is_any_excluded(&[src, tag.text()]);
        (!skip).then_some(src)
    }

    fn viewbox(&self, tag: &Tag<'_>, src: &str) -> (u32, u32) {
        if let (Some(w), Some(h)) = (dimension_attr(tag, "width"), dimension_attr(tag, "height")) {
            return (w, h);
        }
        self.ctx
            .resolve_page_file(&unescape(src.trim()))
            .and_then(|path| image::dimensions(&path))
            .unwrap_or((1, 1))
    }

    fn rewrite_img(&self, text: &str) -> Option<String> {
        let tag = Tag::parse(text)?;
        let src = self.lazy_src(&tag)?;
        let (width, height) = self.viewbox(&tag, src);

        let mut editor = TagEditor::new(text)?;
        editor
            .set("class", Some(&merge_class(tag.get("class"), LAZY_CLASS)))
            .set("src", Some(&placeholder(width, height)))
            .insert_after("src", "data-src", Some(src));
        if tag.has("srcset") {
            editor.rename("srcset", "data-srcset");
        }
        Some(editor.finish())
    }

    fn rewrite_iframe(&self, text: &str) -> Option<String> {
        let tag = Tag::parse(text)?;
        self.lazy_src(&tag)?;

        let mut editor = TagEditor::new(text)?;
        editor
            .set("class", Some(&merge_class(tag.get("class"), LAZY_CLASS)))
            .rename("src", "data-src");
        Some(editor.finish())
    }
}

impl Optimizer for LazyLoadOptimizer<'_> {
    const NAME: &'static str = "lazyload";

    fn is_enabled(&self) -> bool {
        self.ctx.config.lazyload.enable
    }

    fn optimize(&self, html: &str) -> Result<String, OptimizeError> {
        // Deferred sources without the activation script would never load
        if scan::body_close_start(html).is_none() {
            return Ok(html.to_string());
        }

        let masked = Masked::new(html);
        let images = scan::markup_tags(&IMG_RE, html, &masked)
            .filter_map(|m| Some((m.range(), self.rewrite_img(m.as_str())?)));
        let iframes = scan::markup_tags(&IFRAME_RE, html, &masked)
            .filter_map(|m| Some((m.range(), self.rewrite_iframe(m.as_str())?)));
        let mut edits: Vec<_> = images.chain(iframes).collect();
        if edits.is_empty() {
            return Ok(html.to_string());
        }
        crate::debug!("lazyload"; "deferred {} elements", edits.len());

        let out = splice::replace_spans(html, &mut edits);
        if out.contains(&format!("id=\"{SCRIPT_ID}\"")) {
            return Ok(out);
        }
        let script = format!("<script id=\"{SCRIPT_ID}\">{}</script>", LAZYLOAD_JS.raw());
        Ok(splice::insert_before_body_end(&out, &script).unwrap_or(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::tests::TestSite;

    fn lazy(site: &TestSite, body: &str) -> String {
        let ctx = site.ctx();
        let html = format!("<html><body>{body}</body></html>");
        LazyLoadOptimizer::new(&ctx).optimize(&html).unwrap()
    }

    fn enabled() -> TestSite {
        TestSite::new("[lazyload]\nenable = true\nexclude = [\"hero\"]")
    }

    #[test]
    fn test_image_with_dimensions() {
        let out = lazy(&enabled(), r#"<img src="photo.jpg" width="800" height="600">"#);
        assert!(out.starts_with(&format!(
            r#"<html><body><img class="lazyload" src="{}" data-src="photo.jpg" width="800" height="600">"#,
            placeholder(800, 600)
        )));
        assert!(out.contains("viewBox='0 0 800 600'"));
        assert!(out.contains(r#"<script id="optimizador-pro-lazyload">"#));
        assert!(out.ends_with("</script></body></html>"));
    }

    #[test]
    fn test_class_merge_and_srcset() {
        let out = lazy(
            &enabled(),
            r#"<img class="wp-image-5 size-full" src="/a.jpg" srcset="/a-2x.jpg 2x" alt="">"#,
        );
        assert!(out.contains(&format!(
            r#"<img class="wp-image-5 size-full lazyload" src="{}" data-src="/a.jpg" data-srcset="/a-2x.jpg 2x" alt="">"#,
            placeholder(1, 1)
        )));
    }

    #[test]
    fn test_dimensions_from_file() {
        let site = enabled();
        let path = site.write("uploads/pic.png", "");
        ::image::RgbImage::new(40, 30).save(&path).unwrap();

        let out = lazy(&site, r#"<img src="/uploads/pic.png" alt="x">"#);
        assert!(out.contains("viewBox='0 0 40 30'"));
        // Derived dimensions are not added as attributes
        assert!(!out.contains("width="));
    }

    #[test]
    fn test_skipped_images() {
        let site = enabled();
        for img in [
            r#"<img src="/hero.jpg">"#,
            r#"<img class="no-lazy" src="/a.jpg">"#,
            r#"<img data-no-lazy src="/a.jpg">"#,
            r#"<img src="/a.jpg" loading="eager">"#,
            r#"<img src="data:image/gif;base64,R0lGOD">"#,
            r#"<img alt="no source">"#,
            r#"<noscript><img src="/fallback.jpg"></noscript>"#,
        ] {
            let html = format!("<html><body>{img}</body></html>");
            assert_eq!(lazy(&site, img), html, "{img}");
        }
    }

    #[test]
    fn test_iframe() {
        let out = lazy(&enabled(), r#"<iframe src="https://www.youtube.com/embed/x" allowfullscreen></iframe>"#);
        assert!(out.contains(
            r#"<iframe class="lazyload" data-src="https://www.youtube.com/embed/x" allowfullscreen></iframe>"#
        ));
    }

    #[test]
    fn test_idempotent() {
        let site = enabled();
        let once = lazy(&site, r#"<img src="/a.jpg"><iframe src="/embed"></iframe>"#);
        let ctx = site.ctx();
        assert_eq!(LazyLoadOptimizer::new(&ctx).optimize(&once).unwrap(), once);
    }
}
