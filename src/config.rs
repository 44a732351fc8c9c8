use std::ffi::OsString;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const CONFIG_ENV: &str = "MEME_INSERTS_CONFIG";

pub const MAX_OUTLINE_WIDTH: u32 = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Height in pixels of the on-screen preview.
    pub display_height: u32,
    /// Hue rotation in degrees between successive insert outlines.
    pub hue_step: u16,
    /// Outline width as it should appear in the preview.
    pub outline_width: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            display_height: 600,
            hue_step: 45,
            outline_width: 2,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, unless `MEME_INSERTS_CONFIG` names a TOML file.
    pub fn from_env() -> Result<Self> {
        Self::from_optional_path(std::env::var_os(CONFIG_ENV))
    }

    fn from_optional_path(path: Option<OsString>) -> Result<Self> {
        match path {
            Some(path) => {
                debug!("Loading config from {:?}", path);
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.display_height > 0, "display_height must be positive");
        ensure!(
            self.outline_width <= MAX_OUTLINE_WIDTH,
            "outline_width must be at most {}",
            MAX_OUTLINE_WIDTH
        );
        Ok(())
    }
}
