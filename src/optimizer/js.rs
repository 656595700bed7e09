//! Script combination.
//!
//! Eligible external classic scripts are removed and replaced by one
//! combined script before `</body>`. Inline scripts are never folded in,
//! since their position relative to other scripts matters.

use std::fs;
use std::sync::LazyLock;

use regex::Regex;

use super::script::ScriptType;
use super::{OptimizeContext, Optimizer, jquery};
use crate::asset::combine::combine_js;
use crate::asset::{
    AssetKind, AssetReference, CacheKeyBuilder, FilteredAsset, Skip, extract_scripts,
    filter_local,
};
use crate::debug;
use crate::error::OptimizeError;
use crate::html::{Masked, scan, splice};

/// Always-loaded scripts that other code depends on.
const CRITICAL_PATTERNS: &[&str] = &[
    "jquery",
    "/wp-admin/",
    "customize-",
    "admin-bar",
];

/// The subset of [`CRITICAL_PATTERNS`] that a safe jQuery dequeue releases.
const JQUERY_PATTERNS: &[&str] = &["jquery"];

/// Path conventions of ES module bundles.
const MODULE_PATH_PATTERNS: &[&str] = &[".mjs", "/modules/", "/esm/", "script-modules", "interactivity"];

/// `import … from`, `import "…"`, `export …` or dynamic `import(`, minified
/// output included (`;export{a as default}`).
static MODULE_SYNTAX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?m)(?:^|[;})\s])import\s*(?:[\w$*{][^;]*?\bfrom\s*)?["']"#,
        r"|(?:^|[;})\s])export\s*(?:[{*]|(?:default|const|let|var|function|class|async)\b)",
        r"|\bimport\s*\(",
    ))
    .unwrap()
});

/// A script that passed eligibility, with its source already read.
struct ScriptFile {
    file: FilteredAsset,
    source: String,
}

pub struct JsOptimizer<'a> {
    ctx: &'a OptimizeContext<'a>,
}

impl<'a> JsOptimizer<'a> {
    pub fn new(ctx: &'a OptimizeContext<'a>) -> Self {
        Self { ctx }
    }

    fn eligible(&self, asset: AssetReference, jquery_released: bool) -> Result<ScriptFile, Skip> {
        let tag = asset.open_tag().ok_or(Skip::Other("unparsable tag"))?;
        match ScriptType::of(&tag) {
            ScriptType::Classic => {}
            ScriptType::Module => return Err(Skip::Other("module script")),
            ScriptType::Other => return Err(Skip::Other("not JavaScript")),
        }
        if tag.has("async") || tag.has("nomodule") {
            return Err(Skip::Other("async or nomodule"));
        }

        let url = asset.url_str();
        if self.ctx.store.is_artifact_url(url) {
            return Err(Skip::Other("already combined"));
        }
        if MODULE_PATH_PATTERNS.iter().any(|p| url.contains(p)) {
            return Err(Skip::Other("module path"));
        }
        if let Some(pattern) = CRITICAL_PATTERNS.iter().find(|p| url.contains(**p))
            && !(jquery_released && JQUERY_PATTERNS.contains(pattern))
        {
            return Err(Skip::Other("critical script"));
        }

        let file = filter_local(asset, &self.ctx.resolver, &self.ctx.config.js.exclude)?;
        let source = fs::read_to_string(&file.path).map_err(|_| Skip::Other("unreadable"))?;
        if MODULE_SYNTAX_RE.is_match(&source) {
            return Err(Skip::Other("module syntax"));
        }
        Ok(ScriptFile { file, source })
    }
}

impl Optimizer for JsOptimizer<'_> {
    const NAME: &'static str = "js";

    fn is_enabled(&self) -> bool {
        self.ctx.config.js.minify
    }

    fn optimize(&self, html: &str) -> Result<String, OptimizeError> {
        if scan::body_close_start(html).is_none() {
            return Ok(html.to_string());
        }
        let masked = Masked::new(html);
        let jquery_released =
            self.ctx.config.js.dequeue_jquery && jquery::is_dequeue_safe(html, &masked);

        let scripts: Vec<ScriptFile> = extract_scripts(html, &masked)
            .into_iter()
            .filter_map(|asset| {
                let url = asset.url_str().to_string();
                self.eligible(asset, jquery_released)
                    .inspect_err(|skip| debug!("js"; "skipping {}: {}", url, skip))
                    .ok()
            })
            .collect();
        if scripts.is_empty() {
            return Ok(html.to_string());
        }

        let mut builder = CacheKeyBuilder::new();
        for script in &scripts {
            builder.file(script.file.asset.url_str(), script.file.mtime);
        }
        let key = builder.finish();

        let store = &self.ctx.store;
        if store.exists(AssetKind::Js, &key) {
            debug!("js"; "cache hit {}", key);
        } else {
            store.ensure_dir(AssetKind::Js)?;
            let sources: Vec<&str> = scripts.iter().map(|s| s.source.as_str()).collect();
            let combined = combine_js(&sources);
            let path = store.write(AssetKind::Js, &key, &combined)?;
            debug!("js"; "wrote {} ({} bytes)", path.display(), combined.len());
        }

        let stripped = splice::remove_spans(html, scripts.iter().map(|s| s.file.asset.span.clone()));
        let tag = format!("<script src=\"{}\"></script>", store.url(AssetKind::Js, &key));
        debug!("js"; "combined {} scripts", scripts.len());

        Ok(splice::insert_before_body_end(&stripped, &tag).unwrap_or_else(|| html.to_string()))
    }
}
