use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const PROJECT_CONFIG: &str = "samplety.toml";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tick_ms: u64,
    pub midi_port: Option<String>, // substring of the port name, first port if unset
    pub output_gain: f32,
    pub pad_base_note: u8,
    pub pad_velocity: u8,
    pub default_sample: Option<String>, // used when the project has no saved state
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            midi_port: None,
            output_gain: 1.0,
            pad_base_note: 48,
            pad_velocity: 100,
            default_sample: None,
        }
    }
}

impl Config {
    // project file wins over the user file; neither is required
    pub fn load(project_dir: &Path) -> Self {
        let candidates = [Some(project_dir.join(PROJECT_CONFIG)), user_config_path()];
        for path in candidates.into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(contents) => match Self::parse(&contents) {
                    Ok(config) => {
                        log::info!(target: "config", "loaded {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                    }
                },
                Err(e) => log::warn!(target: "config", "could not read config {}: {}", path.display(), e),
            }
        }
        Self::default()
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(contents)?;
        config.tick_ms = config.tick_ms.clamp(1, 1000);
        config.output_gain = if config.output_gain.is_finite() { config.output_gain.max(0.0) } else { 1.0 };
        config.pad_base_note = config.pad_base_note.min(127 - 15);
        config.pad_velocity = config.pad_velocity.clamp(1, 127);
        Ok(config)
    }
}

pub fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("samplety")
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("samplety").join("config.toml"))
}
