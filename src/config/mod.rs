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
        "./config.toml",
        "./mediavault.toml",
        "~/.config/mediavault/config.toml",
        "/etc/mediavault/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
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

    if config.transcode.segment_seconds == 0 {
        anyhow::bail!("transcode.segment_seconds must be greater than 0");
    }

    if config.transcode.max_concurrent == 0 {
        anyhow::bail!("transcode.max_concurrent must be greater than 0");
    }

    for (kind, root) in [("audio", config.audio_root()), ("video", config.video_root())] {
        if !root.exists() {
            tracing::warn!("{} sandbox root does not exist: {:?}", kind, root);
        }
    }

    Ok(())
}
