//! Optimizador - server-side HTML post-processing for rendered pages.

mod cli;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use optimizador::config::OptimizerConfig;
use optimizador::logger;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = OptimizerConfig::load(&cli.config)
        .with_context(|| format!("failed to load config `{}`", cli.config.display()))?;

    match &cli.command {
        Commands::Optimize { args } => cli::optimize::run_optimize(args, &config),
        Commands::ClearCache => cli::cache::clear_cache(&config),
        Commands::Config => cli::cache::print_config(&config),
    }
}
