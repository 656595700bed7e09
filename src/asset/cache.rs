//! Content-addressed artifact cache.
//!
//! The filesystem is the index: an artifact exists iff
//! `<dir>/<kind>/combined-<key>.<ext>` exists. Artifacts are only ever
//! replaced by a key change or removed by [`ArtifactStore::clear`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use jwalk::WalkDir;
use url::Url;

use super::AssetKind;
use crate::error::OptimizeError;

/// Number of hex characters kept from the digest.
const KEY_LEN: usize = 32;

/// Distinguishes temporary files of concurrent writers in one process.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Deterministic digest over the identity of a combined asset set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Accumulates ordered identity parts for a [`CacheKey`].
#[derive(Debug, Default)]
pub struct CacheKeyBuilder {
    parts: Vec<String>,
}

impl CacheKeyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A file input, identified by its URL and mtime.
    ///
    /// `|` never appears unescaped in a URL, so it keeps the two apart.
    pub fn file(&mut self, url: &str, mtime: u64) -> &mut Self {
        self.parts.push(format!("{url}|{mtime}"));
        self
    }

    /// An inline input, identified by a hash of its content.
    pub fn inline(&mut self, content: &str) -> &mut Self {
        let digest = blake3::hash(content.as_bytes());
        self.parts.push(format!("inline:{}", digest.to_hex()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn finish(&self) -> CacheKey {
        let digest = blake3::hash(self.parts.join("\n").as_bytes());
        let mut hex = hex::encode(digest.as_bytes());
        hex.truncate(KEY_LEN);
        CacheKey(hex)
    }
}

/// Directory/URL pair where combined artifacts live.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
    url: String,
    /// Path component of `url`, for matching root-relative references.
    url_path: String,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, url: &str) -> Self {
        let url = url.trim_end_matches('/').to_string();
        let url_path = Url::parse(&url)
            .map(|u| u.path().trim_end_matches('/').to_string())
            .unwrap_or_default();
        Self {
            dir: dir.into(),
            url,
            url_path,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(kind: AssetKind, key: &CacheKey) -> String {
        format!("combined-{key}.{}", kind.ext())
    }

    /// Filesystem path of an artifact.
    pub fn path(&self, kind: AssetKind, key: &CacheKey) -> PathBuf {
        self.dir.join(kind.dir()).join(Self::file_name(kind, key))
    }

    /// Public URL of an artifact.
    pub fn url(&self, kind: AssetKind, key: &CacheKey) -> String {
        format!("{}/{}/{}", self.url, kind.dir(), Self::file_name(kind, key))
    }

    pub fn exists(&self, kind: AssetKind, key: &CacheKey) -> bool {
        self.path(kind, key).is_file()
    }

    /// True if `url` points into the cache (absolute or root-relative).
    pub fn is_artifact_url(&self, url: &str) -> bool {
        let under = |prefix: &str| {
            url.strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
        };
        under(&self.url) || (!self.url_path.is_empty() && under(&self.url_path))
    }

    /// Create `<dir>/<kind>` if missing.
    pub fn ensure_dir(&self, kind: AssetKind) -> Result<PathBuf, OptimizeError> {
        let dir = self.dir.join(kind.dir());
        fs::create_dir_all(&dir).map_err(|source| OptimizeError::CacheDir {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }

    /// Write an artifact via a temporary file and rename.
    ///
    /// Every call gets its own temporary file. Concurrent writers of one
    /// key produce identical bytes, so the last rename wins.
    pub fn write(
        &self,
        kind: AssetKind,
        key: &CacheKey,
        content: &str,
    ) -> Result<PathBuf, OptimizeError> {
        let dir = self.ensure_dir(kind)?;
        let path = self.path(kind, key);
        let tmp = dir.join(format!(
            ".{}.{}-{}.tmp",
            Self::file_name(kind, key),
            std::process::id(),
            TMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));

        let result = fs::write(&tmp, content).and_then(|()| fs::rename(&tmp, &path));
        if let Err(source) = result {
            let _ = fs::remove_file(&tmp);
            return Err(OptimizeError::Write { path, source });
        }
        Ok(path)
    }

    /// Delete the whole cache tree, returning how many files it held.
    ///
    /// A missing directory counts as already clear.
    pub fn clear(&self) -> Result<usize, OptimizeError> {
        if !self.dir.exists() {
            return Ok(0);
        }
        let files = WalkDir::new(&self.dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .count();
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(files),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(0),
            Err(err) => Err(OptimizeError::Io(self.dir.clone(), err)),
        }
    }
}
