//! `defer` attribute injection.
//!
//! Pure tag rewrite: `<script src=...>` becomes `<script defer src=...>`
//! with every other byte kept.

use super::script::ScriptType;
use super::{OptimizeContext, Optimizer};
use crate::core::ExclusionList;
use crate::error::OptimizeError;
use crate::html::scan::{self, SCRIPT_RE};
use crate::html::{Masked, Tag, TagEditor, splice};

const DEFAULT_EXCLUDES: &[&str] = &["jquery", "wp-admin", "data-no-defer"];

pub struct DeferOptimizer<'a> {
    ctx: &'a OptimizeContext<'a>,
    exclude: ExclusionList,
}

impl<'a> DeferOptimizer<'a> {
    pub fn new(ctx: &'a OptimizeContext<'a>) -> Self {
        Self {
            ctx,
            exclude: ctx.config.defer.exclude.with_defaults(DEFAULT_EXCLUDES),
        }
    }

    fn is_eligible(&self, tag: &Tag<'_>) -> bool {
        let Some(src) = tag.get("src").map(str::trim).filter(|s| !s.is_empty()) else {
            return false;
        };
        !tag.has("defer")
            && !tag.has("async")
            && ScriptType::of(tag) == ScriptType::Classic
            && !self.ctx.resolver.is_external(src)
            && !self.exclude.is_any_excluded(&[src, tag.text()])
    }
}

impl Optimizer for DeferOptimizer<'_> {
    const NAME: &'static str = "defer";

    fn is_enabled(&self) -> bool {
        self.ctx.config.defer.enable
    }

    fn optimize(&self, html: &str) -> Result<String, OptimizeError> {
        let masked = Masked::new(html);
        let mut edits = Vec::new();

        for element in scan::raw_elements(&SCRIPT_RE, html, &masked) {
            let Some(tag) = Tag::parse(element.open) else {
                continue;
            };
            if !self.is_eligible(&tag) {
                continue;
            }
            if let Some(mut editor) = TagEditor::new(element.open) {
                editor.set("defer", None);
                let start = element.span.start;
                edits.push((start..start + element.open.len(), editor.finish()));
            }
        }

        crate::debug!("defer"; "deferred {} scripts", edits.len());
        Ok(splice::replace_spans(html, &mut edits))
    }
}
