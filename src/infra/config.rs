//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml

use crate::domain::types::TiltPolarity;
use crate::services::countdown::{self, CountdownStep};
use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_time_limit_secs")]
    pub default_time_limit_secs: u32,
    #[serde(default = "default_min_time_limit_secs")]
    pub min_time_limit_secs: u32,
    #[serde(default = "default_max_time_limit_secs")]
    pub max_time_limit_secs: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            default_time_limit_secs: default_time_limit_secs(),
            min_time_limit_secs: default_min_time_limit_secs(),
            max_time_limit_secs: default_max_time_limit_secs(),
        }
    }
}

fn default_time_limit_secs() -> u32 {
    60
}

fn default_min_time_limit_secs() -> u32 {
    30
}

fn default_max_time_limit_secs() -> u32 {
    180
}

#[derive(Debug, Clone, Deserialize)]
pub struct GestureTomlConfig {
    #[serde(default = "default_tilt_threshold")]
    pub tilt_threshold: f64,
    #[serde(default = "default_rearm_threshold")]
    pub rearm_threshold: f64,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,
    #[serde(default)]
    pub polarity: TiltPolarity,
}

impl Default for GestureTomlConfig {
    fn default() -> Self {
        Self {
            tilt_threshold: default_tilt_threshold(),
            rearm_threshold: default_rearm_threshold(),
            debounce_ms: default_debounce_ms(),
            grace_ms: default_grace_ms(),
            polarity: TiltPolarity::Normal,
        }
    }
}

fn default_tilt_threshold() -> f64 {
    0.7
}

fn default_rearm_threshold() -> f64 {
    0.3
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_grace_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorConfig {
    /// Interval between accelerometer samples
    #[serde(default = "default_sensor_interval_ms")]
    pub interval_ms: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self { interval_ms: default_sensor_interval_ms() }
    }
}

fn default_sensor_interval_ms() -> u64 {
    100
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CountdownConfig {
    /// Ordered (label, hold) steps; empty means the built-in table
    #[serde(default)]
    pub steps: Vec<CountdownStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecksConfig {
    /// JSON file holding the saved decks
    #[serde(default = "default_decks_file")]
    pub file: String,
}

impl Default for DecksConfig {
    fn default() -> Self {
        Self { file: default_decks_file() }
    }
}

fn default_decks_file() -> String {
    "decks.json".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct EgressConfig {
    /// File path for session summary egress (JSONL format)
    #[serde(default = "default_egress_file")]
    pub file: String,
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self { file: default_egress_file() }
    }
}

fn default_egress_file() -> String {
    "sessions.jsonl".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_interval_secs")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval_secs() }
    }
}

fn default_metrics_interval_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateConfig {
    #[serde(default = "default_generate_url")]
    pub url: String,
    /// Items requested per generated deck
    #[serde(default = "default_generate_count")]
    pub count: u32,
    #[serde(default = "default_generate_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            url: default_generate_url(),
            count: default_generate_count(),
            timeout_ms: default_generate_timeout_ms(),
        }
    }
}

fn default_generate_url() -> String {
    "https://charaids.onrender.com/generate-list".to_string()
}

fn default_generate_count() -> u32 {
    35
}

fn default_generate_timeout_ms() -> u64 {
    15000
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub gesture: GestureTomlConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub countdown: CountdownConfig,
    #[serde(default)]
    pub decks: DecksConfig,
    #[serde(default)]
    pub egress: EgressConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub generate: GenerateConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    default_time_limit_secs: u32,
    min_time_limit_secs: u32,
    max_time_limit_secs: u32,
    tilt_threshold: f64,
    rearm_threshold: f64,
    debounce_ms: u64,
    grace_ms: u64,
    polarity: TiltPolarity,
    sensor_interval_ms: u64,
    countdown_steps: Vec<CountdownStep>,
    decks_file: String,
    egress_file: String,
    metrics_interval_secs: u64,
    generate_url: String,
    generate_count: u32,
    generate_timeout_ms: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default")
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, config_file: &str) -> Self {
        let countdown_steps = if toml_config.countdown.steps.is_empty() {
            countdown::default_steps()
        } else {
            toml_config.countdown.steps
        };

        Self {
            default_time_limit_secs: toml_config.game.default_time_limit_secs,
            min_time_limit_secs: toml_config.game.min_time_limit_secs,
            max_time_limit_secs: toml_config.game.max_time_limit_secs,
            tilt_threshold: toml_config.gesture.tilt_threshold,
            rearm_threshold: toml_config.gesture.rearm_threshold,
            debounce_ms: toml_config.gesture.debounce_ms,
            grace_ms: toml_config.gesture.grace_ms,
            polarity: toml_config.gesture.polarity,
            sensor_interval_ms: toml_config.sensor.interval_ms,
            countdown_steps,
            decks_file: toml_config.decks.file,
            egress_file: toml_config.egress.file,
            metrics_interval_secs: toml_config.metrics.interval_secs,
            generate_url: toml_config.generate.url,
            generate_count: toml_config.generate.count,
            generate_timeout_ms: toml_config.generate.timeout_ms,
            config_file: config_file.to_string(),
        }
    }

    /// Determine config file path from args or environment
    pub fn resolve_config_path(args: &[String]) -> String {
        // Check for --config argument
        for (i, arg) in args.iter().enumerate() {
            if arg == "--config" {
                if let Some(path) = args.get(i + 1) {
                    return path.clone();
                }
            }
            if let Some(path) = arg.strip_prefix("--config=") {
                return path.to_string();
            }
        }

        // Check CONFIG_FILE environment variable
        if let Ok(path) = env::var("CONFIG_FILE") {
            return path;
        }

        // Default to dev.toml
        "config/dev.toml".to_string()
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self::from_toml(toml_config, &path.display().to_string()))
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {}. Using defaults.", e);
                Self::default()
            }
        }
    }

    /// Clamp a requested time limit into the configured range
    pub fn clamp_time_limit(&self, requested_secs: u32) -> u32 {
        requested_secs.clamp(self.min_time_limit_secs, self.max_time_limit_secs)
    }

    // Getters for all config fields
    pub fn default_time_limit_secs(&self) -> u32 {
        self.default_time_limit_secs
    }

    pub fn min_time_limit_secs(&self) -> u32 {
        self.min_time_limit_secs
    }

    pub fn max_time_limit_secs(&self) -> u32 {
        self.max_time_limit_secs
    }

    pub fn tilt_threshold(&self) -> f64 {
        self.tilt_threshold
    }

    pub fn rearm_threshold(&self) -> f64 {
        self.rearm_threshold
    }

    pub fn debounce_ms(&self) -> u64 {
        self.debounce_ms
    }

    pub fn grace_ms(&self) -> u64 {
        self.grace_ms
    }

    pub fn polarity(&self) -> TiltPolarity {
        self.polarity
    }

    pub fn sensor_interval_ms(&self) -> u64 {
        self.sensor_interval_ms
    }

    pub fn countdown_steps(&self) -> &[CountdownStep] {
        &self.countdown_steps
    }

    pub fn decks_file(&self) -> &str {
        &self.decks_file
    }

    pub fn egress_file(&self) -> &str {
        &self.egress_file
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn generate_url(&self) -> &str {
        &self.generate_url
    }

    pub fn generate_count(&self) -> u32 {
        self.generate_count
    }

    pub fn generate_timeout_ms(&self) -> u64 {
        self.generate_timeout_ms
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to set the gesture polarity
    #[cfg(test)]
    pub fn with_polarity(mut self, polarity: TiltPolarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Builder method for tests to set the decks file
    #[cfg(test)]
    pub fn with_decks_file(mut self, path: &str) -> Self {
        self.decks_file = path.to_string();
        self
    }
}
