//! jQuery dequeue safety check.
//!
//! Content sniffing, best effort: a page is considered jQuery-free only
//! when no inline script uses jQuery and no known jQuery-dependent plugin
//! or admin context shows up anywhere in the page.

use crate::html::scan::{self, SCRIPT_RE};
use crate::html::{Masked, Tag};

/// Inline-script fragments that indicate live jQuery usage.
const USAGE_MARKERS: &[&str] = &["$(", "jQuery(", ".ready(", ".click(", ".on("];

/// Page-wide signatures of jQuery-dependent plugins and admin context.
const PAGE_MARKERS: &[&str] = &[
    "woocommerce",
    "wpcf7",
    "gform",
    "elementor",
    "et_pb_",
    "vc_",
    "fl-builder",
    "ninja-forms",
    "wpforms",
    "wp-admin",
    "admin-bar",
    "customize-support",
];

/// Whether jQuery can be treated as non-critical for this page.
pub fn is_dequeue_safe(html: &str, masked: &Masked) -> bool {
    let inline_usage = scan::raw_elements(&SCRIPT_RE, html, masked)
        .into_iter()
        .filter(|el| Tag::parse(el.open).is_some_and(|tag| !tag.has("src")))
        .find_map(|el| USAGE_MARKERS.iter().find(|m| el.body.contains(**m)));
    if let Some(marker) = inline_usage {
        crate::debug!("js"; "jQuery kept: inline script uses `{}`", marker);
        return false;
    }

    let lower = html.to_ascii_lowercase();
    if let Some(marker) = PAGE_MARKERS.iter().find(|m| lower.contains(**m)) {
        crate::debug!("js"; "jQuery kept: page contains `{}`", marker);
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn safe(html: &str) -> bool {
        is_dequeue_safe(html, &Masked::new(html))
    }

    #[test]
    fn test_plain_page_is_safe() {
        assert!(safe(r#"<script src="/jquery.min.js"></script><script>window.x = 1;</script>"#));
    }

    #[test]
    fn test_inline_usage_is_unsafe() {
        assert!(!safe("<script>jQuery(function () {});</script>"));
        assert!(!safe("<script>$('.menu').toggle();</script>"));
        assert!(!safe("<script>el.on('click', f);</script>"));
    }

    #[test]
    fn test_plugin_markers_are_unsafe() {
        assert!(!safe(r#"<body class="woocommerce-page"></body>"#));
        assert!(!safe(r#"<div class="wpcf7"></div>"#));
        assert!(!safe(r#"<body class="admin-bar"></body>"#));
    }

    #[test]
    fn test_usage_inside_comments_is_ignored() {
        assert!(safe("<!-- <script>jQuery(x)</script> -->"));
    }
}
