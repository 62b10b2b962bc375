//! Loading of encounter configuration files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use horde_core::EncounterConfig;

/// Reads the encounter configuration at `path`, or the built-in defaults when absent.
pub(crate) fn load(path: Option<&Path>) -> Result<EncounterConfig> {
    let Some(path) = path else {
        tracing::debug!("no configuration file supplied; using built-in encounter");
        return Ok(EncounterConfig::default());
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    let config =
        parse(&text).with_context(|| format!("invalid configuration {}", path.display()))?;
    tracing::info!(path = %path.display(), pools = config.pools.len(), "configuration loaded");
    Ok(config)
}

fn parse(text: &str) -> Result<EncounterConfig> {
    let config: EncounterConfig = toml::from_str(text).context("malformed TOML")?;
    if config.pools.is_empty() {
        tracing::warn!("configuration registers no pools; every spawn will be rejected");
    }
    Ok(config)
}
