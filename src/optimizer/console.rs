//! `window.console` restoration.

use super::{OptimizeContext, Optimizer};
use crate::embed::client::CONSOLE_JS;
use crate::error::OptimizeError;
use crate::html::splice;

const SCRIPT_ID: &str = "optimizador-pro-console";

/// Re-installs a working console after themes or plugins stub it out.
pub struct ConsoleRestore<'a> {
    ctx: &'a OptimizeContext<'a>,
}

impl<'a> ConsoleRestore<'a> {
    pub fn new(ctx: &'a OptimizeContext<'a>) -> Self {
        Self { ctx }
    }
}

impl Optimizer for ConsoleRestore<'_> {
    const NAME: &'static str = "console";

    fn is_enabled(&self) -> bool {
        self.ctx.config.debug.restore_console
    }

    fn optimize(&self, html: &str) -> Result<String, OptimizeError> {
        if html.contains(&format!("id=\"{SCRIPT_ID}\"")) {
            return Ok(html.to_string());
        }
        let script = format!("<script id=\"{SCRIPT_ID}\">{}</script>", CONSOLE_JS.raw());
        Ok(splice::insert_before_body_end(html, &script).unwrap_or_else(|| html.to_string()))
    }
}
