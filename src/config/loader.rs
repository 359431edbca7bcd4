use super::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Yaml,
    Toml,
}

fn format_for<P: AsRef<Path>>(path: P) -> Result<ConfigFormat> {
    match path.as_ref().extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
        Some("toml") => Ok(ConfigFormat::Toml),
        _ => Err(anyhow::anyhow!(
            "Unsupported config file extension: {} (expected .yaml, .yml or .toml)",
            path.as_ref().display()
        )),
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let format = format_for(&path)?;
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

    let config = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {}", path.as_ref().display()))?,
        ConfigFormat::Toml => toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.as_ref().display()))?,
    };

    Ok(config)
}

pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Config {
    if !path.as_ref().exists() {
        log::warn!(
            "Configuration file '{}' not found, using default configuration",
            path.as_ref().display()
        );
        return Config::default();
    }

    match load_config(&path) {
        Ok(config) => {
            log::info!("Loaded configuration from: {}", path.as_ref().display());
            config
        }
        Err(e) => {
            log::warn!("Failed to load config ({e:#}), using defaults");
            Config::default()
        }
    }
}

pub fn write_config<P: AsRef<Path>>(config: &Config, path: P) -> Result<()> {
    let content = match format_for(&path)? {
        ConfigFormat::Yaml => {
            serde_yaml::to_string(config).context("Failed to serialize config as YAML")?
        }
        ConfigFormat::Toml => {
            toml::to_string_pretty(config).context("Failed to serialize config as TOML")?
        }
    };
    fs::write(&path, content)
        .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;
    Ok(())
}
