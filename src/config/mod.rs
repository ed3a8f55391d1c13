mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

use crate::policy::PolicyRegistry;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config = parse_config(&content)
        .with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse config")?;
    validate_config(&config)?;
    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./reelmerge.toml",
        "~/.config/reelmerge/config.toml",
        "/etc/reelmerge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!(path = %path.display(), "Using config file");
            return load_config(path);
        }
    }

    // Return default config if no file found
    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.worker.concurrency == 0 {
        anyhow::bail!("worker.concurrency cannot be 0");
    }

    if config.worker.cache_capacity == 0 {
        anyhow::bail!("worker.cache_capacity cannot be 0");
    }

    if config.providers.requests_per_second == 0 {
        anyhow::bail!("providers.requests_per_second cannot be 0");
    }

    if config.database.path.as_os_str().is_empty() {
        anyhow::bail!("database.path cannot be empty");
    }

    for (source, domains) in &config.merge.trusted_domains {
        if domains.iter().all(|d| d.trim().is_empty()) {
            anyhow::bail!("merge.trusted_domains.{} lists no domains", source);
        }
    }

    // Field overrides are checked against the policy table itself.
    PolicyRegistry::from_config(&config.merge).context("Invalid [merge] section")?;

    Ok(())
}
