//! Optimize command - run the pipeline over one page.

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Read, Write};

use super::OptimizeArgs;
use optimizador::config::OptimizerConfig;
use optimizador::optimizer::optimize_page;
use optimizador::{debug, log};

/// Read the page, transform it and write the result.
pub fn run_optimize(args: &OptimizeArgs, config: &OptimizerConfig) -> Result<()> {
    let html = match args.input_file() {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read page `{}`", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read page from stdin")?;
            buf
        }
    };

    let out = optimize_page(&html, config, &args.request_path);
    debug!("optimize"; "{} -> {} bytes", html.len(), out.len());

    match &args.output {
        Some(path) => {
            fs::write(path, &out)
                .with_context(|| format!("failed to write page `{}`", path.display()))?;
            log!("optimize"; "wrote {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(out.as_bytes())
                .and_then(|()| stdout.flush())
                .context("failed to write page to stdout")?;
        }
    }
    Ok(())
}
