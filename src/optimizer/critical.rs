//! Critical CSS injection.
//!
//! Inlines the configured above-the-fold CSS right after `<head>`, so it
//! applies before any stylesheet arrives.

use super::{OptimizeContext, Optimizer};
use crate::asset::combine::finish_css;
use crate::error::OptimizeError;
use crate::html::splice;

pub const CRITICAL_STYLE_ID: &str = "optimizador-pro-critical-css";

pub struct CriticalCss<'a> {
    ctx: &'a OptimizeContext<'a>,
}

impl<'a> CriticalCss<'a> {
    pub fn new(ctx: &'a OptimizeContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Optimizer for CriticalCss<'_> {
    const NAME: &'static str = "critical";

    fn is_enabled(&self) -> bool {
        self.ctx.config.critical.is_active()
    }

    fn optimize(&self, html: &str) -> Result<String, OptimizeError> {
        if html.contains(&format!("id=\"{CRITICAL_STYLE_ID}\"")) {
            return Ok(html.to_string());
        }

        let css = finish_css(self.ctx.config.critical.css.trim().to_string());
        // A literal `</style` would end the element early
        let css = css.replace("</style", "<\\/style");
        let style = format!("<style id=\"{CRITICAL_STYLE_ID}\" data-no-optimize>{css}</style>");

        Ok(splice::insert_after_head_start(html, &style).unwrap_or_else(|| html.to_string()))
    }
}
