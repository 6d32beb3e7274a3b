mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    parse_config(&content).with_context(|| format!("Invalid config file: {:?}", path))
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

    let default_paths = [
        "./hlsrelay.toml",
        "./config.toml",
        "~/.config/hlsrelay/config.toml",
        "/etc/hlsrelay/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.upstream.user_agent.trim().is_empty() {
        anyhow::bail!("Upstream user_agent cannot be empty");
    }
    if config.upstream.timeout_secs == 0 {
        anyhow::bail!("Upstream timeout_secs must be greater than 0");
    }
    if config.upstream.connect_timeout_secs == 0 {
        anyhow::bail!("Upstream connect_timeout_secs must be greater than 0");
    }

    if config.relay.max_manifest_bytes == 0 {
        anyhow::bail!("Relay max_manifest_bytes must be greater than 0");
    }
    let public_base = config.relay.public_base_url.trim();
    if !public_base.is_empty() {
        url::Url::parse(public_base)
            .with_context(|| format!("Relay public_base_url is not a valid URL: {}", public_base))?;
    }

    match &config.catalog {
        CatalogConfig::Passthrough => {}
        CatalogConfig::Static { channels } => {
            if channels.is_empty() {
                tracing::warn!("Static catalog has no channels configured");
            }
            for (id, target) in channels {
                let parsed = url::Url::parse(target)
                    .with_context(|| format!("Channel '{}' has an invalid URL: {}", id, target))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    anyhow::bail!("Channel '{}' must use http or https: {}", id, target);
                }
            }
        }
        CatalogConfig::Remote { url_template } => {
            if !url_template.contains("{id}") {
                anyhow::bail!("Remote catalog url_template must contain {{id}}");
            }
        }
    }

    Ok(())
}
