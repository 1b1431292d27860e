use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub parse: ParseConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArchiveConfig {
    /// Root directory holding one subdirectory per authority.
    pub dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ParseConfig {
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("./vocabs")
}

impl Config {
    /// Configuration used when no config file exists.
    pub fn minimal() -> Self {
        Self {
            archive: ArchiveConfig {
                dir: default_archive_dir(),
            },
            parse: ParseConfig::default(),
            log: LogConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.archive.dir.as_os_str().is_empty() {
        anyhow::bail!("archive.dir must not be empty");
    }

    if config.log.level.trim().is_empty() {
        anyhow::bail!("log.level must not be empty");
    }

    Ok(config)
}

/// Where a loaded [`Config`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    File,
    Defaults,
}

/// Loads `path` if it exists, otherwise falls back to [`Config::minimal`].
///
/// Runs before logging is configured, so the caller reports the source.
pub fn load_or_minimal(path: &Path) -> Result<(Config, ConfigSource)> {
    if path.exists() {
        Ok((load_config(path)?, ConfigSource::File))
    } else {
        Ok((Config::minimal(), ConfigSource::Defaults))
    }
}
