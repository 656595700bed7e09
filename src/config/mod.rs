//! Optimizer configuration management for `optimizador.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! ├── error          # ConfigError
//! └── mod.rs         # OptimizerConfig (this file)
//! ```
//!
//! The configuration is a read-only snapshot: it is resolved once per
//! invocation and passed explicitly into every optimizer.

mod error;
pub mod section;

pub use error::ConfigError;
pub use section::{
    CacheConfig, CriticalConfig, CssConfig, DebugConfig, DeferConfig, DelayConfig, FontsConfig,
    JsConfig, LazyLoadConfig, PageConfig, SiteConfig,
};

use crate::log;
use section::DEFAULT_CACHE_SUBPATH;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use url::Url;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing optimizador.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Site base URL and document root
    pub site: SiteConfig,

    /// Combined artifact location
    pub cache: CacheConfig,

    /// Stylesheet combination
    pub css: CssConfig,

    /// Script combination
    pub js: JsConfig,

    /// `defer` attribute injection
    pub defer: DeferConfig,

    /// Delayed script execution
    pub delay: DelayConfig,

    /// Image/iframe lazy loading
    pub lazyload: LazyLoadConfig,

    /// Google Fonts handling
    pub fonts: FontsConfig,

    /// Critical CSS injection
    pub critical: CriticalConfig,

    /// Per-page exclusions
    pub page: PageConfig,

    /// Debug helpers
    pub debug: DebugConfig,
}

impl OptimizerConfig {
    /// Load configuration from a file path.
    ///
    /// Relative paths inside the file are resolved against its directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let base_dir = path.parent().unwrap_or(Path::new("."));

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        config.config_path = path.to_path_buf();
        config.finalize(base_dir);
        config.validate()?;
        Ok(config)
    }

    /// Parse, resolve and validate configuration from a TOML string.
    pub fn parse(content: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.finalize(base_dir);
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Resolve paths and fill derived defaults.
    fn finalize(&mut self, base_dir: &Path) {
        self.site.url = self.site.url.trim().trim_end_matches('/').to_string();
        self.site.root = resolve_path(&self.site.root, base_dir);

        let cache_dir = match &self.cache.dir {
            Some(dir) => resolve_path(dir, &self.site.root),
            None => self.site.root.join(DEFAULT_CACHE_SUBPATH),
        };
        self.cache.dir = Some(cache_dir);

        let cache_url = match &self.cache.url {
            Some(url) => url.trim().trim_end_matches('/').to_string(),
            None => format!("{}/{DEFAULT_CACHE_SUBPATH}", self.site.url),
        };
        self.cache.url = Some(cache_url);
    }

    /// Validate required fields.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.site.url.is_empty() {
            return Err(ConfigError::Validation("`site.url` is required".into()));
        }
        require_http_url("site.url", &self.site.url)?;
        if let Some(url) = &self.cache.url {
            require_http_url("cache.url", url)?;
        }
        Ok(())
    }

    /// Parsed site base URL.
    pub fn site_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.site.url)
            .map_err(|err| ConfigError::Validation(format!("`site.url` is invalid: {err}")))
    }

    /// Cache directory (resolved by `finalize`).
    pub fn cache_dir(&self) -> PathBuf {
        self.cache
            .dir
            .clone()
            .unwrap_or_else(|| self.site.root.join(DEFAULT_CACHE_SUBPATH))
    }

    /// Public cache URL without trailing slash (resolved by `finalize`).
    pub fn cache_url(&self) -> String {
        self.cache
            .url
            .clone()
            .unwrap_or_else(|| format!("{}/{DEFAULT_CACHE_SUBPATH}", self.site.url))
    }

    /// Effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Expand `~` and make a path absolute against `base`.
fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    let expanded = PathBuf::from(shellexpand::tilde(&raw).as_ref());
    if expanded.as_os_str().is_empty() {
        base.to_path_buf()
    } else if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

fn require_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|err| ConfigError::Validation(format!("`{field}` is invalid: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ConfigError::Validation(format!(
            "`{field}` must be an absolute http(s) URL, got `{value}`"
        )));
    }
    Ok(())
}

/// Parse a config for tests, asserting there are no unknown fields.
#[cfg(test)]
pub fn test_parse_config(extra: &str) -> OptimizerConfig {
    let content = format!("[site]\nurl = \"https://example.com\"\nroot = \"/srv/www\"\n{extra}");
    let (mut parsed, ignored) = OptimizerConfig::parse_with_ignored(&content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed.finalize(Path::new("/"));
    parsed.validate().unwrap();
    parsed
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = test_parse_config("");
        assert!(!config.css.minify);
        assert!(!config.js.minify);
        assert!(!config.lazyload.enable);
        assert_eq!(config.delay.timeout, 5000);
        assert!(!config.critical.is_active());
        assert_eq!(
            config.cache_dir(),
            PathBuf::from("/srv/www/wp-content/cache/optimizador-pro")
        );
        assert_eq!(
            config.cache_url(),
            "https://example.com/wp-content/cache/optimizador-pro"
        );
    }

    #[test]
    fn test_sections() {
        let config = test_parse_config(
            r#"
[css]
minify = true
combine_inline = true
exclude = "print.css\nadmin"

[js]
minify = true
dequeue_jquery = true
exclude = ["slider.js"]

[fonts]
optimize = true
async = true

[critical]
css = "body{margin:0}"
"#,
        );
        assert!(config.css.minify && config.css.combine_inline);
        assert!(config.css.exclude.is_excluded("/theme/print.css"));
        assert!(config.js.dequeue_jquery);
        assert!(config.js.exclude.is_excluded("/js/slider.js"));
        assert!(config.fonts.async_loading);
        assert!(config.critical.is_active());
    }

    #[test]
    fn test_relative_cache_dir_resolves_against_root() {
        let config = test_parse_config("[cache]\ndir = \"cache\"\nurl = \"https://cdn.example.com/c/\"");
        assert_eq!(config.cache_dir(), PathBuf::from("/srv/www/cache"));
        assert_eq!(config.cache_url(), "https://cdn.example.com/c");
    }

    #[test]
    fn test_missing_site_url_is_rejected() {
        let err = OptimizerConfig::parse("[css]\nminify = true", Path::new("/")).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_non_http_site_url_is_rejected() {
        let err =
            OptimizerConfig::parse("[site]\nurl = \"ftp://example.com\"", Path::new("/")).unwrap_err();
        assert!(format!("{err}").contains("http"));
    }

    #[test]
    fn test_unknown_fields_collected() {
        let (_, ignored) =
            OptimizerConfig::parse_with_ignored("[site]\nurl = \"https://a.b\"\ncolour = 1").unwrap();
        assert_eq!(ignored, vec!["site.colour"]);
    }

    #[test]
    fn test_load_resolves_root_against_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("optimizador.toml");
        fs::write(&path, "[site]\nurl = \"https://example.com/\"\nroot = \"public\"").unwrap();

        let config = OptimizerConfig::load(&path).unwrap();
        assert_eq!(config.site.url, "https://example.com");
        assert_eq!(config.site.root, dir.path().join("public"));
        assert_eq!(config.config_path, path);
    }

    #[test]
    fn test_to_toml_roundtrips_flags() {
        let config = test_parse_config("[lazyload]\nenable = true\nexclude = [\"hero\"]");
        let text = config.to_toml().unwrap();
        assert!(text.contains("[lazyload]"));
        assert!(text.contains("hero"));
    }
}
