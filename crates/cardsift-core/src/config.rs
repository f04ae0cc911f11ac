use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CardsiftError, Result};

/// Root application configuration, loaded from `~/.config/cardsift/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dedup: DedupConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub near_duplicate_threshold: f64,
    pub concept_threshold: f64,
    /// Pairwise comparisons between two yields to the scheduler.
    pub batch_size: usize,
    pub yield_to_scheduler: bool,
    /// Category placeholder that earns no quality credit.
    pub default_category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            near_duplicate_threshold: 0.7,
            concept_threshold: 0.25,
            batch_size: 50,
            yield_to_scheduler: true,
            default_category: "Uncategorized".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/cardsift/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("CARDSIFT_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("cardsift")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the standard path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            ("dedup.near_duplicate_threshold", self.dedup.near_duplicate_threshold),
            ("dedup.concept_threshold", self.dedup.concept_threshold),
        ];
        for (key, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(CardsiftError::ConfigError(format!(
                    "{key} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.dedup.batch_size == 0 {
            return Err(CardsiftError::ConfigError(
                "dedup.batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
