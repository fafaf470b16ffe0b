use crate::domain::models::ConfigFile;
use anyhow::Context;
use std::path::{Path, PathBuf};

fn default_config_path() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")?;
    Ok(PathBuf::from(home).join(".config/group-report/config.toml"))
}

pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<ConfigFile> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Ok(p) if p.exists() => p,
            _ => {
                tracing::debug!("no config file, using defaults");
                return Ok(ConfigFile::default());
            }
        },
    };
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: ConfigFile =
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
    if !(0.0..=1.0).contains(&config.storage.warn_ratio) {
        anyhow::bail!(
            "storage.warn_ratio must be between 0 and 1, got {}",
            config.storage.warn_ratio
        );
    }
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}
