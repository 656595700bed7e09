//! Delayed script execution.
//!
//! Scripts are neutralized into placeholders the browser will not run:
//!
//! ```text
//! <script src="/a.js">        -> <script type="optimizador-pro-delayed" data-src="/a.js">
//! <script>body</script>       -> <script type="optimizador-pro-delayed-inline">base64(body)</script>
//! ```
//!
//! The original `type` moves to `data-type`. A footer script restores the
//! placeholders in order on first interaction or after `delay.timeout`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::script::ScriptType;
use super::{OptimizeContext, Optimizer};
use crate::core::ExclusionList;
use crate::embed::client::{DELAY_JS, DelayVars};
use crate::error::OptimizeError;
use crate::html::scan::{self, RawElement, SCRIPT_RE};
use crate::html::{Masked, Tag, TagEditor, splice};

pub const DELAYED_TYPE: &str = "optimizador-pro-delayed";
pub const DELAYED_INLINE_TYPE: &str = "optimizador-pro-delayed-inline";
const FOOTER_ID: &str = "optimizador-pro-delay";

const DEFAULT_EXCLUDES: &[&str] = &[
    "jquery",
    "wp-admin",
    "admin-bar",
    "customize-",
    "data-no-delay",
];

/// Id prefix of the scripts this crate injects.
const OWN_ID_PREFIX: &str = "optimizador-pro";

/// Inline bodies shorter than this run immediately.
const MIN_INLINE_LEN: usize = 50;

/// Globals that other code expects before first interaction.
const CRITICAL_INLINE: &[&str] = &[
    "dataLayer",
    "gtag(",
    "wp.i18n",
    "wpApiSettings",
    "ajaxurl",
    "_wpemojiSettings",
    "document.write",
];

pub struct DelayOptimizer<'a> {
    ctx: &'a OptimizeContext<'a>,
    exclude: ExclusionList,
}

impl<'a> DelayOptimizer<'a> {
    pub fn new(ctx: &'a OptimizeContext<'a>) -> Self {
        Self {
            ctx,
            exclude: ctx.config.delay.exclude.with_defaults(DEFAULT_EXCLUDES),
        }
    }

    /// Placeholder for one script, `None` to leave it running normally.
    fn neutralize(&self, element: &RawElement<'_>) -> Option<String> {
        let tag = Tag::parse(element.open)?;
        if ScriptType::of(&tag) != ScriptType::Classic
            || tag.get("id").is_some_and(|id| id.starts_with(OWN_ID_PREFIX))
        {
            return None;
        }

        let mut editor = TagEditor::new(element.open)?;
        if tag.has("type") {
            editor.rename("type", "data-type");
        }

        match tag.get("src").map(str::trim).filter(|s| !s.is_empty()) {
            Some(src) => {
                if self.exclude.is_any_excluded(&[src, element.open]) {
                    return None;
                }
                editor.rename("src", "data-src").set("type", Some(DELAYED_TYPE));
                Some(format!("{}{}</script>", editor.finish(), element.body))
            }
            None => {
                let body = element.body;
                if body.trim().len() < MIN_INLINE_LEN
                    || CRITICAL_INLINE.iter().any(|g| body.contains(g))
                    || self.exclude.is_excluded(element.text)
                {
                    return None;
                }
                editor.set("type", Some(DELAYED_INLINE_TYPE));
                Some(format!("{}{}</script>", editor.finish(), STANDARD.encode(body)))
            }
        }
    }
}

impl Optimizer for DelayOptimizer<'_> {
    const NAME: &'static str = "delay";

    fn is_enabled(&self) -> bool {
        self.ctx.config.delay.enable
    }

    fn optimize(&self, html: &str) -> Result<String, OptimizeError> {
        // Placeholders without the footer would never run
        if scan::body_close_start(html).is_none() {
            return Ok(html.to_string());
        }

        let masked = Masked::new(html);
        let mut edits: Vec<_> = scan::raw_elements(&SCRIPT_RE, html, &masked)
            .iter()
            .filter_map(|element| Some((element.span.clone(), self.neutralize(element)?)))
            .collect();
        if edits.is_empty() {
            return Ok(html.to_string());
        }
        crate::debug!("delay"; "delayed {} scripts", edits.len());

        let out = splice::replace_spans(html, &mut edits);
        if out.contains(&format!("id=\"{FOOTER_ID}\"")) {
            return Ok(out);
        }
        let footer = format!(
            "<script id=\"{FOOTER_ID}\">{}</script>",
            DELAY_JS.render(&DelayVars {
                timeout: self.ctx.config.delay.timeout,
            })
        );
        Ok(splice::insert_before_body_end(&out, &footer).unwrap_or(out))
    }
}
