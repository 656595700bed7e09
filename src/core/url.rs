//! Site URL resolution.
//!
//! Maps site URLs onto files under the document root. Anything that
//! cannot be mapped resolves to `None`; nothing here returns an error.

use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

use percent_encoding::percent_decode_str;
use url::Url;

/// Resolves request-relative URLs against one site.
///
/// Invariants:
/// - `host` is lowercase
/// - `base_path` is empty or starts with `/` without a trailing slash
#[derive(Debug, Clone)]
pub struct UrlResolver {
    base: Url,
    host: String,
    base_path: String,
    root: PathBuf,
}

impl UrlResolver {
    pub fn new(base: Url, root: impl Into<PathBuf>) -> Self {
        let host = base.host_str().unwrap_or_default().to_ascii_lowercase();
        let base_path = base.path().trim_end_matches('/').to_string();
        Self {
            base,
            host,
            base_path,
            root: root.into(),
        }
    }

    /// Site base URL.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Document root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a URL to a local file path under the document root.
    ///
    /// Handles absolute URLs on the site's own origin (either scheme) and
    /// root-relative paths. Protocol-relative, external and page-relative
    /// URLs resolve to `None`, as does any path escaping the root.
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        let url = strip_query_fragment(url.trim());

        let path = if let Some(rest) = self.strip_origin(url) {
            rest
        } else if url.starts_with('/') && !url.starts_with("//") {
            url
        } else {
            return None;
        };

        let path = self.strip_base_path(path);
        let decoded = percent_decode_str(path).decode_utf8().ok()?;
        join_within(&self.root, &decoded)
    }

    /// Resolve a URL and require the target to be an existing file.
    pub fn resolve_file(&self, url: &str) -> Option<PathBuf> {
        self.resolve(url).filter(|path| path.is_file())
    }

    /// True if the URL names an http(s) origin other than the site's own.
    ///
    /// Protocol-relative URLs count as http(s).
    pub fn is_external(&self, url: &str) -> bool {
        let url = url.trim();
        let Some(rest) = strip_http_scheme(url) else {
            return false;
        };
        let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
        let host = authority
            .rsplit('@')
            .next()
            .unwrap_or(authority)
            .split(':')
            .next()
            .unwrap_or_default();
        !host.eq_ignore_ascii_case(&self.host)
    }

    /// Absolute URL for a site path (used to rebase relative references).
    pub fn absolute(&self, url: &str) -> Option<Url> {
        let url = url.trim();
        if url.starts_with("//") {
            return Url::parse(&format!("{}:{}", self.base.scheme(), url)).ok();
        }
        self.base.join(url).ok()
    }

    /// Emit a URL root-relative when it lives on the site's origin.
    pub fn to_site_relative(&self, url: &Url) -> String {
        let same_host = url
            .host_str()
            .is_some_and(|h| h.eq_ignore_ascii_case(&self.host));
        if same_host && url.port_or_known_default() == self.base.port_or_known_default() {
            let mut out = url.path().to_string();
            if let Some(query) = url.query() {
                out.push('?');
                out.push_str(query);
            }
            if let Some(fragment) = url.fragment() {
                out.push('#');
                out.push_str(fragment);
            }
            out
        } else {
            url.to_string()
        }
    }

    /// Strip `http(s)://host[:port]` of the site, returning the path part.
    fn strip_origin<'u>(&self, url: &'u str) -> Option<&'u str> {
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))?;
        let (authority, path) = match rest.find('/') {
            Some(pos) => (&rest[..pos], &rest[pos..]),
            None => (rest, "/"),
        };
        let expected = match self.base.port() {
            Some(port) => format!("{}:{port}", self.host),
            None => self.host.clone(),
        };
        authority.eq_ignore_ascii_case(&expected).then_some(path)
    }

    fn strip_base_path<'u>(&self, path: &'u str) -> &'u str {
        if self.base_path.is_empty() {
            return path;
        }
        match path.strip_prefix(self.base_path.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => path,
        }
    }
}

/// Last modification time of a file as seconds since the Unix epoch.
pub fn mtime(path: &Path) -> Option<u64> {
    path.metadata()
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
}

/// Strip query string and fragment.
#[inline]
pub fn strip_query_fragment(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

fn strip_http_scheme(url: &str) -> Option<&str> {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    if lower.starts_with("https://") {
        Some(&url[8..])
    } else if lower.starts_with("http://") {
        Some(&url[7..])
    } else {
        url.strip_prefix("//")
    }
}

/// Join a URL path onto `root`, refusing to climb above it.
fn join_within(root: &Path, url_path: &str) -> Option<PathBuf> {
    let mut parts: Vec<&str> = Vec::new();
    for component in Path::new(url_path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    let mut path = root.to_path_buf();
    path.extend(parts);
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn resolver(base: &str) -> UrlResolver {
        UrlResolver::new(Url::parse(base).unwrap(), "/srv/www")
    }

    #[test]
    fn test_resolve_site_absolute_url() {
        let r = resolver("https://example.com");
        assert_eq!(
            r.resolve("https://example.com/wp-content/theme/a.css?ver=6.4"),
            Some(PathBuf::from("/srv/www/wp-content/theme/a.css"))
        );
        // Other scheme of the same origin
        assert_eq!(
            r.resolve("http://example.com/a.js"),
            Some(PathBuf::from("/srv/www/a.js"))
        );
    }

    #[test]
    fn test_resolve_root_relative() {
        let r = resolver("https://example.com/");
        assert_eq!(
            r.resolve("/wp-content/theme/b.css#x"),
            Some(PathBuf::from("/srv/www/wp-content/theme/b.css"))
        );
    }

    #[test]
    fn test_resolve_rejects_external_and_relative() {
        let r = resolver("https://example.com");
        assert_eq!(r.resolve("https://cdn.other.com/a.css"), None);
        assert_eq!(r.resolve("//example.com/a.css"), None);
        assert_eq!(r.resolve("photo.jpg"), None);
        assert_eq!(r.resolve("data:image/png;base64,AAAA"), None);
        assert_eq!(r.resolve(""), None);
    }

    #[test]
    fn test_resolve_subdirectory_site() {
        let r = resolver("https://example.com/blog");
        assert_eq!(
            r.resolve("https://example.com/blog/wp-content/a.css"),
            Some(PathBuf::from("/srv/www/wp-content/a.css"))
        );
        assert_eq!(
            r.resolve("/blog/wp-content/a.css"),
            Some(PathBuf::from("/srv/www/wp-content/a.css"))
        );
        // A sibling path that merely shares the prefix is not stripped
        assert_eq!(
            r.resolve("/blogroll/a.css"),
            Some(PathBuf::from("/srv/www/blogroll/a.css"))
        );
    }

    #[test]
    fn test_resolve_decodes_and_confines_to_root() {
        let r = resolver("https://example.com");
        assert_eq!(
            r.resolve("/uploads/my%20photo.jpg"),
            Some(PathBuf::from("/srv/www/uploads/my photo.jpg"))
        );
        assert_eq!(
            r.resolve("/a/../b.css"),
            Some(PathBuf::from("/srv/www/b.css"))
        );
        assert_eq!(r.resolve("/../../etc/passwd"), None);
    }

    #[test]
    fn test_is_external() {
        let r = resolver("https://example.com");
        assert!(r.is_external("https://cdn.jsdelivr.net/npm/x.js"));
        assert!(r.is_external("//fonts.googleapis.com/css?family=Roboto"));
        assert!(r.is_external("HTTP://other.org"));
        assert!(!r.is_external("https://example.com/a.js"));
        assert!(!r.is_external("https://EXAMPLE.com:443/a.js"));
        assert!(!r.is_external("/a.js"));
        assert!(!r.is_external("a.js"));
    }

    #[test]
    fn test_rebase_relative_reference() {
        let r = resolver("https://example.com");
        let sheet = r.absolute("/wp-content/themes/t/css/style.css").unwrap();
        let image = sheet.join("../img/bg.png").unwrap();
        assert_eq!(r.to_site_relative(&image), "/wp-content/themes/t/img/bg.png");

        let cdn = Url::parse("https://cdn.example.org/x.png").unwrap();
        assert_eq!(r.to_site_relative(&cdn), "https://cdn.example.org/x.png");
    }

    #[test]
    fn test_mtime_and_resolve_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.css"), "body{}").unwrap();
        let r = UrlResolver::new(Url::parse("https://example.com").unwrap(), dir.path());

        let path = r.resolve_file("/a.css").unwrap();
        assert!(mtime(&path).is_some());
        assert!(r.resolve_file("/missing.css").is_none());
        assert!(mtime(&dir.path().join("missing.css")).is_none());
    }
}
