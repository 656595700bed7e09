//! Eligibility filtering shared by the combining optimizers.
//!
//! Kind-specific disqualifiers (module scripts, critical inline styles)
//! live with their optimizers; this only decides "local, not excluded,
//! exists on disk".

use std::fmt;
use std::path::PathBuf;

use super::AssetReference;
use crate::core::{ExclusionList, UrlResolver, mtime};

/// An asset that passed filtering, resolved to a file.
#[derive(Debug, Clone)]
pub struct FilteredAsset {
    pub asset: AssetReference,
    pub path: PathBuf,
    /// Modification time in seconds since the Unix epoch.
    pub mtime: u64,
}

/// Why an asset was left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Skip {
    External,
    Excluded(String),
    Unresolved,
    /// Kind-specific reason.
    Other(&'static str),
}

impl fmt::Display for Skip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::External => f.write_str("external origin"),
            Self::Excluded(pattern) => write!(f, "excluded by `{pattern}`"),
            Self::Unresolved => f.write_str("no local file"),
            Self::Other(reason) => f.write_str(reason),
        }
    }
}

/// Keep an asset only if it is a local, existing, non-excluded file.
///
/// Exclusion patterns are checked against the URL and the full tag text.
pub fn filter_local(
    asset: AssetReference,
    resolver: &UrlResolver,
    exclude: &ExclusionList,
) -> Result<FilteredAsset, Skip> {
    let url = asset.url_str();
    if url.is_empty() || resolver.is_external(url) {
        return Err(Skip::External);
    }
    let hit = exclude
        .matching(url)
        .or_else(|| exclude.matching(&asset.tag));
    if let Some(pattern) = hit {
        return Err(Skip::Excluded(pattern.to_string()));
    }

    let path = resolver.resolve_file(url).ok_or(Skip::Unresolved)?;
    let mtime = mtime(&path).ok_or(Skip::Unresolved)?;
    Ok(FilteredAsset { asset, path, mtime })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use url::Url;

    fn setup() -> (TempDir, UrlResolver) {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.css"), "a{}").unwrap();
        let resolver = UrlResolver::new(Url::parse("https://example.com").unwrap(), dir.path());
        (dir, resolver)
    }

    fn link(href: &str) -> AssetReference {
        AssetReference {
            tag: format!(r#"<link rel="stylesheet" href="{href}">"#),
            url: Some(href.to_string()),
            content: None,
            span: 0..0,
        }
    }

    #[test]
    fn test_local_file_passes() {
        let (dir, resolver) = setup();
        let filtered = filter_local(link("/a.css?ver=1"), &resolver, &ExclusionList::default()).unwrap();
        assert_eq!(filtered.path, dir.path().join("a.css"));
    }

    #[test]
    fn test_skip_reasons() {
        let (_dir, resolver) = setup();
        let none = ExclusionList::default();
        assert_eq!(
            filter_local(link("https://cdn.net/a.css"), &resolver, &none).unwrap_err(),
            Skip::External
        );
        assert_eq!(
            filter_local(link("/missing.css"), &resolver, &none).unwrap_err(),
            Skip::Unresolved
        );
        let exclude = ExclusionList::parse("rel=\"stylesheet\"");
        assert!(matches!(
            filter_local(link("/a.css"), &resolver, &exclude).unwrap_err(),
            Skip::Excluded(_)
        ));
    }

    #[test]
    fn test_removing_pattern_only_widens_eligibility() {
        let (_dir, resolver) = setup();
        let strict = ExclusionList::parse("a.css\nb.css");
        let loose = ExclusionList::parse("b.css");
        assert!(filter_local(link("/a.css"), &resolver, &strict).is_err());
        assert!(filter_local(link("/a.css"), &resolver, &loose).is_ok());
    }
}
