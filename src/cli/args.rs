//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Optimizador HTML post-processing CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: optimizador.toml)
    #[arg(short = 'C', long, global = true, default_value = "optimizador.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the optimization pipeline over one rendered page
    #[command(visible_alias = "o")]
    Optimize {
        #[command(flatten)]
        args: OptimizeArgs,
    },

    /// Delete every combined artifact under the cache directory
    #[command(visible_alias = "c")]
    ClearCache,

    /// Print the effective configuration as TOML
    Config,
}

/// Optimize command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct OptimizeArgs {
    /// Rendered HTML page. Use `-` or omit to read stdin.
    #[arg(value_name = "INPUT", value_hint = clap::ValueHint::FilePath)]
    pub input: Option<PathBuf>,

    /// Write the transformed page to a file instead of stdout
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Request path of the page, matched against `page.exclude`
    #[arg(short, long = "request-path", default_value = "/")]
    pub request_path: String,
}

impl OptimizeArgs {
    /// Input file, `None` for stdin.
    pub fn input_file(&self) -> Option<&PathBuf> {
        self.input.as_ref().filter(|p| p.as_os_str() != "-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_optimize() {
        let cli = Cli::parse_from(["optimizador", "-C", "site.toml", "optimize", "page.html", "-r", "/shop/"]);
        assert_eq!(cli.config, PathBuf::from("site.toml"));
        let Commands::Optimize { args } = cli.command else {
            panic!("expected optimize");
        };
        assert_eq!(args.input_file(), Some(&PathBuf::from("page.html")));
        assert_eq!(args.request_path, "/shop/");
        assert!(args.output.is_none());
    }

    #[test]
    fn test_stdin_input() {
        let cli = Cli::parse_from(["optimizador", "optimize", "-", "--verbose"]);
        assert!(cli.verbose);
        let Commands::Optimize { args } = cli.command else {
            panic!("expected optimize");
        };
        assert!(args.input_file().is_none());
        assert_eq!(args.request_path, "/");
    }

    #[test]
    fn test_clear_cache() {
        let cli = Cli::parse_from(["optimizador", "clear-cache"]);
        assert!(matches!(cli.command, Commands::ClearCache));
        assert_eq!(cli.config, PathBuf::from("optimizador.toml"));
    }
}
