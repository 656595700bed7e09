//! HTML optimization pipeline.
//!
//! A page runs through independent rewriters in a fixed order. Each one
//! takes the page text and returns the rewritten text.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ gate: page.exclude / empty / AMP  ──►  page unchanged       │
//! └────────────────────────────────────────────────────────────┘
//!   critical → fonts → css → js → defer → delay → lazyload → console
//! ```
//!
//! A step that is disabled is skipped. A step that errors or panics is
//! logged and the page from before that step moves on to the next one.

mod console;
mod critical;
mod css;
mod defer;
mod delay;
mod fonts;
mod jquery;
mod js;
mod lazyload;
mod script;


use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::asset::ArtifactStore;
use crate::config::{ConfigError, OptimizerConfig};
use crate::core::UrlResolver;
use crate::error::OptimizeError;
use crate::{debug, log};

pub use console::ConsoleRestore;
pub use critical::CriticalCss;
pub use css::CssOptimizer;
pub use defer::DeferOptimizer;
pub use delay::DelayOptimizer;
pub use fonts::{FontFamilySpec, FontWeight, GoogleFontsOptimizer};
pub use js::JsOptimizer;
pub use lazyload::LazyLoadOptimizer;

static AMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<html\b[^>]*?\s(?:amp|⚡)(?:[\s=/>])").unwrap());

// =============================================================================
// Optimizer
// =============================================================================

/// One page rewriter.
pub trait Optimizer {
    /// Name used in log prefixes.
    const NAME: &'static str;

    fn is_enabled(&self) -> bool;

    /// Rewrite the page. Returning the input unchanged is always valid.
    fn optimize(&self, html: &str) -> Result<String, OptimizeError>;
}

/// Per-request state shared by every optimizer.
#[derive(Debug)]
pub struct OptimizeContext<'a> {
    pub config: &'a OptimizerConfig,
    pub resolver: UrlResolver,
    pub store: ArtifactStore,
    /// Absolute URL of the page being optimized.
    pub page_url: Url,
}

impl<'a> OptimizeContext<'a> {
    pub fn new(config: &'a OptimizerConfig, request_path: &str) -> Result<Self, ConfigError> {
        let base = config.site_url()?;
        let page_url = match request_path.trim() {
            "" => base.clone(),
            path => base.join(path).unwrap_or_else(|_| base.clone()),
        };
        Ok(Self {
            config,
            resolver: UrlResolver::new(base, config.site.root.clone()),
            store: ArtifactStore::new(config.cache_dir(), &config.cache_url()),
            page_url,
        })
    }

    /// Resolve a reference as written in the page, relative ones included.
    pub fn resolve_page_file(&self, url: &str) -> Option<PathBuf> {
        if let Some(path) = self.resolver.resolve_file(url) {
            return Some(path);
        }
        if url.starts_with("//") || self.resolver.is_external(url) {
            return None;
        }
        let absolute = self.page_url.join(url).ok()?;
        self.resolver.resolve_file(absolute.as_str())
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Sequential optimizer chain over one page.
pub struct Pipeline {
    html: String,
}

impl Pipeline {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    /// Run one optimizer, keeping the current page if it fails.
    pub fn pipe<O: Optimizer>(mut self, optimizer: O) -> Self {
        if !optimizer.is_enabled() {
            return self;
        }
        let result = panic::catch_unwind(AssertUnwindSafe(|| optimizer.optimize(&self.html)));
        match result {
            Ok(Ok(html)) => {
                if html != self.html {
                    debug!(O::NAME; "rewrote page ({} -> {} bytes)", self.html.len(), html.len());
                }
                self.html = html;
            }
            Ok(Err(err)) => log!("error"; "{}: {}", O::NAME, error_chain(&err)),
            Err(payload) => log!("error"; "{} panicked: {}", O::NAME, panic_message(&*payload)),
        }
        self
    }

    pub fn into_inner(self) -> String {
        self.html
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Why a page bypasses the pipeline entirely.
fn gate(html: &str, config: &OptimizerConfig, request_path: &str) -> Option<&'static str> {
    if html.trim().is_empty() {
        Some("empty document")
    } else if config.page.exclude.is_excluded(request_path) {
        Some("excluded page")
    } else if AMP_RE.is_match(html) {
        Some("AMP document")
    } else {
        None
    }
}

/// Run every enabled optimizer over one page.
///
/// Never fails: any problem leaves the affected step's input in place.
pub fn optimize_page(html: &str, config: &OptimizerConfig, request_path: &str) -> String {
    if let Some(reason) = gate(html, config, request_path) {
        debug!("pipeline"; "skipping {}: {}", request_path, reason);
        return html.to_string();
    }

    let ctx = match OptimizeContext::new(config, request_path) {
        Ok(ctx) => ctx,
        Err(err) => {
            log!("error"; "{}", err);
            return html.to_string();
        }
    };

    Pipeline::new(html)
        .pipe(CriticalCss::new(&ctx))
        .pipe(GoogleFontsOptimizer::new(&ctx))
        .pipe(CssOptimizer::new(&ctx))
        .pipe(JsOptimizer::new(&ctx))
        .pipe(DeferOptimizer::new(&ctx))
        .pipe(DelayOptimizer::new(&ctx))
        .pipe(LazyLoadOptimizer::new(&ctx))
        .pipe(ConsoleRestore::new(&ctx))
        .into_inner()
}
