//! Configuration file support for Gainz.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/gainz/config.toml`.

use crate::types::{EffortTarget, MesocyclePlan, RepRange};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub planning: PlanningConfig,

    #[serde(default)]
    pub periodization: PeriodizationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub progression: ProgressionConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Initial plan generation parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlanningConfig {
    #[serde(default = "default_exercises_per_day")]
    pub exercises_per_day: usize,

    #[serde(default = "default_sets_per_exercise")]
    pub sets_per_exercise: u32,

    #[serde(default = "default_rep_range_low")]
    pub rep_range_low: u32,

    #[serde(default = "default_rep_range_high")]
    pub rep_range_high: u32,

    #[serde(default = "default_target_rir")]
    pub target_rir: u8,

    #[serde(default = "default_mesocycle_weeks")]
    pub mesocycle_weeks: u8,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            exercises_per_day: default_exercises_per_day(),
            sets_per_exercise: default_sets_per_exercise(),
            rep_range_low: default_rep_range_low(),
            rep_range_high: default_rep_range_high(),
            target_rir: default_target_rir(),
            mesocycle_weeks: default_mesocycle_weeks(),
        }
    }
}

impl PlanningConfig {
    pub fn rep_range(&self) -> Result<RepRange> {
        RepRange::new(self.rep_range_low, self.rep_range_high)
            .map_err(|e| Error::Config(e.to_string()))
    }

    pub fn effort(&self) -> EffortTarget {
        EffortTarget::Rir(self.target_rir)
    }
}

/// Periodization parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PeriodizationConfig {
    /// Share of the base volume kept in the deload week
    #[serde(default = "default_deload_factor")]
    pub deload_factor: f64,
}

impl Default for PeriodizationConfig {
    fn default() -> Self {
        Self {
            deload_factor: default_deload_factor(),
        }
    }
}

/// Live logging parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_rest_seconds")]
    pub rest_seconds: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rest_seconds: default_rest_seconds(),
        }
    }
}

/// Progression parameters
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressionConfig {
    #[serde(default = "default_load_increment")]
    pub load_increment: f64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            load_increment: default_load_increment(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("gainz")
}

fn default_exercises_per_day() -> usize {
    5
}

fn default_sets_per_exercise() -> u32 {
    3
}

fn default_rep_range_low() -> u32 {
    8
}

fn default_rep_range_high() -> u32 {
    12
}

fn default_target_rir() -> u8 {
    1
}

fn default_mesocycle_weeks() -> u8 {
    4
}

fn default_deload_factor() -> f64 {
    0.6
}

fn default_rest_seconds() -> u32 {
    90
}

fn default_load_increment() -> f64 {
    2.5
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("gainz").join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject values the planners cannot work with
    pub fn validate(&self) -> Result<()> {
        self.planning.rep_range()?;
        if self.planning.exercises_per_day == 0 {
            return Err(Error::Config("planning.exercises_per_day must be positive".into()));
        }
        let weeks = MesocyclePlan::MIN_WEEKS..=MesocyclePlan::MAX_WEEKS;
        if !weeks.contains(&self.planning.mesocycle_weeks) {
            return Err(Error::Config(format!(
                "planning.mesocycle_weeks must be within {}..={}, got {}",
                weeks.start(),
                weeks.end(),
                self.planning.mesocycle_weeks
            )));
        }
        if self.planning.target_rir > 5 {
            return Err(Error::Config(format!(
                "planning.target_rir must be at most 5, got {}",
                self.planning.target_rir
            )));
        }
        if !(0.0..=1.0).contains(&self.periodization.deload_factor) {
            return Err(Error::Config(format!(
                "periodization.deload_factor must be within 0..=1, got {}",
                self.periodization.deload_factor
            )));
        }
        if self.progression.load_increment <= 0.0 {
            return Err(Error::Config("progression.load_increment must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.planning.exercises_per_day, 5);
        assert_eq!(config.planning.sets_per_exercise, 3);
        assert_eq!(config.planning.rep_range().unwrap(), RepRange { low: 8, high: 12 });
        assert_eq!(config.planning.effort(), EffortTarget::Rir(1));
        assert_eq!(config.planning.mesocycle_weeks, 4);
        assert_eq!(config.periodization.deload_factor, 0.6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("gainz").join("config.toml");

        let mut config = Config::default();
        config.logging.rest_seconds = 120;
        config.save_to(&path).unwrap();

        let parsed = Config::load_from(&path).unwrap();
        assert_eq!(parsed.logging.rest_seconds, 120);
        assert_eq!(parsed.planning, config.planning);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[planning]
exercises_per_day = 4
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.planning.exercises_per_day, 4);
        assert_eq!(config.planning.rep_range_high, 12); // default
        assert_eq!(config.progression.load_increment, 2.5);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[planning]\nrep_range_low = 15\nrep_range_high = 10\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_mesocycle_weeks_out_of_range_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        for weeks in [0, 13] {
            std::fs::write(&path, format!("[planning]\nmesocycle_weeks = {}\n", weeks)).unwrap();
            match Config::load_from(&path) {
                Err(Error::Config(message)) => assert!(message.contains("mesocycle_weeks")),
                other => panic!("expected config error, got {:?}", other),
            }
        }

        std::fs::write(&path, "[planning]\nmesocycle_weeks = 12\n").unwrap();
        assert_eq!(Config::load_from(&path).unwrap().planning.mesocycle_weeks, 12);
    }
}
