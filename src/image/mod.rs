//! Intrinsic image dimensions for lazyload placeholders.
//!
//! Raster formats are read header-only through the `image` crate; SVG
//! files use the root element's `width`/`height`, then its `viewBox`.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::html::Tag;

static SVG_ROOT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<svg\b[^>]*>").unwrap());

/// Pixel dimensions of an image file, `None` when unreadable.
pub fn dimensions(path: &Path) -> Option<(u32, u32)> {
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
    if is_svg {
        return svg_dimensions(&fs::read_to_string(path).ok()?);
    }
    image::image_dimensions(path).ok()
}

fn svg_dimensions(source: &str) -> Option<(u32, u32)> {
    let root = SVG_ROOT_RE.find(source)?;
    let tag = Tag::parse(root.as_str())?;

    let width = tag.get("width").and_then(parse_length);
    let height = tag.get("height").and_then(parse_length);
    if let (Some(w), Some(h)) = (width, height) {
        return Some((w, h));
    }

    let view_box: Vec<f64> = tag
        .get("viewbox")?
        .split(|c: char| c.is_ascii_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    match view_box[..] {
        [_, _, w, h] if w > 0.0 && h > 0.0 => Some((w.round() as u32, h.round() as u32)),
        _ => None,
    }
}

/// Absolute lengths only (`120`, `120px`); percentages and ems are unknown.
fn parse_length(value: &str) -> Option<u32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value);
    let parsed: f64 = number.trim().parse().ok()?;
    (parsed > 0.0).then(|| parsed.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_raster_dimensions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        image::RgbImage::new(8, 5).save(&path).unwrap();
        assert_eq!(dimensions(&path), Some((8, 5)));
    }

    #[test]
    fn test_unreadable_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        fs::write(&path, "not an image").unwrap();
        assert_eq!(dimensions(&path), None);
        assert_eq!(dimensions(&dir.path().join("missing.png")), None);
    }

    #[test]
    fn test_svg_dimensions() {
        assert_eq!(
            svg_dimensions(r#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg" width="120px" height="40">"#),
            Some((120, 40))
        );
        assert_eq!(
            svg_dimensions(r#"<svg viewBox="0 0 24.4 12" width="100%">"#),
            Some((24, 12))
        );
        assert_eq!(svg_dimensions("<svg>"), None);
    }
}
