//! Configuration management
//!
//! Handles loading, parsing and validating the YAML configuration file. The
//! hot-reload side lives in [`watcher`].

pub mod watcher;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

pub use watcher::ConfigWatcher;

use crate::sliders::scalar::SEVEN_BIT_FULL_SCALE;
use crate::sliders::DeliveryPolicy;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub midi: MidiConfig,
    pub noise_reduction: NoiseReduction,
    pub invert_sliders: bool,
    pub delivery: DeliveryPolicy,
}

/// MIDI input connection
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MidiConfig {
    /// Input port index, used unless `use_device_name` is set
    #[serde(default)]
    pub port: usize,
    /// Channel the sliders report on (0-15)
    #[serde(default)]
    pub channel: u8,
    /// Substring of the input port name
    #[serde(default)]
    pub device_name: String,
    #[serde(default)]
    pub use_device_name: bool,
    /// Raw magnitude that maps to 100%
    #[serde(default = "default_full_scale")]
    pub full_scale: u16,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            port: 0,
            channel: 0,
            device_name: String::new(),
            use_device_name: false,
            full_scale: default_full_scale(),
        }
    }
}

/// Noise reduction: a named level or an explicit threshold
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum NoiseReduction {
    Level(NoiseLevel),
    Threshold(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseLevel {
    Low,
    #[serde(rename = "default")]
    Normal,
    High,
}

impl NoiseReduction {
    /// Minimum percentage delta that counts as a real move
    pub fn threshold(&self) -> f64 {
        match *self {
            NoiseReduction::Level(NoiseLevel::Low) => 0.015,
            NoiseReduction::Level(NoiseLevel::Normal) => 0.025,
            NoiseReduction::Level(NoiseLevel::High) => 0.035,
            NoiseReduction::Threshold(value) => value,
        }
    }
}

impl Default for NoiseReduction {
    fn default() -> Self {
        NoiseReduction::Level(NoiseLevel::Normal)
    }
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::from_yaml(&contents).with_context(|| format!("Invalid config file: {}", path))
    }

    /// Parse and validate YAML text
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: AppConfig =
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.midi.channel > 15 {
            anyhow::bail!(
                "MIDI channel {} is invalid (must be 0-15)",
                self.midi.channel
            );
        }

        if self.midi.full_scale == 0 {
            anyhow::bail!("MIDI full_scale must be greater than 0");
        }

        if self.midi.use_device_name && self.midi.device_name.trim().is_empty() {
            anyhow::bail!("MIDI device_name cannot be empty when use_device_name is set");
        }

        let threshold = self.noise_reduction.threshold();
        if !threshold.is_finite() || threshold < 0.0 {
            anyhow::bail!(
                "noise_reduction {} is invalid (must be a non-negative number)",
                threshold
            );
        }

        Ok(())
    }
}

fn default_full_scale() -> u16 {
    SEVEN_BIT_FULL_SCALE
}
