mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./picfolio.toml",
        "~/.config/picfolio/config.toml",
        "/etc/picfolio/config.toml",
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
    if config.thumbnail.max_dimension == 0 {
        anyhow::bail!("Thumbnail max_dimension cannot be 0");
    }

    if !(1..=100).contains(&config.thumbnail.jpeg_quality) {
        anyhow::bail!(
            "Thumbnail jpeg_quality must be between 1 and 100, got {}",
            config.thumbnail.jpeg_quality
        );
    }

    if config.storage.staging_dir() == config.storage.image_dir {
        anyhow::bail!(
            "Staging directory must differ from the image directory: {:?}",
            config.storage.image_dir
        );
    }

    if config.storage.image_dir.as_os_str().is_empty() {
        anyhow::bail!("Image directory cannot be empty");
    }

    Ok(())
}
