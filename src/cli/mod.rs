//! Command-line interface module.

mod args;
pub mod cache;
pub mod optimize;

pub use args::{Cli, Commands, OptimizeArgs};
