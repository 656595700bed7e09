//! Optimizador - HTML post-processing pipeline.
//!
//! A fully rendered page goes in, the same page comes out with its
//! stylesheets and scripts combined and minified, scripts deferred or
//! delayed, images lazy-loaded and Google Fonts requests merged. See
//! [`optimizer::optimize_page`].

pub mod asset;
pub mod config;
pub mod core;
pub mod embed;
pub mod error;
pub mod html;
pub mod image;
pub mod logger;
pub mod optimizer;

pub use config::OptimizerConfig;
pub use error::OptimizeError;
pub use optimizer::optimize_page;
