//! Cache commands.

use anyhow::{Context, Result};

use optimizador::asset::ArtifactStore;
use optimizador::config::OptimizerConfig;
use optimizador::log;

/// Remove the cache root. Safe to run when nothing was ever cached.
pub fn clear_cache(config: &OptimizerConfig) -> Result<()> {
    let store = ArtifactStore::new(config.cache_dir(), &config.cache_url());
    let removed = store
        .clear()
        .with_context(|| format!("failed to clear `{}`", store.dir().display()))?;
    log!("cache"; "removed {} files from {}", removed, store.dir().display());
    Ok(())
}

/// Print the effective configuration.
pub fn print_config(config: &OptimizerConfig) -> Result<()> {
    let toml = config.to_toml().context("failed to serialize config")?;
    print!("{toml}");
    Ok(())
}
