// src/config/mod.rs
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ExtractError, Result};

pub const BLOCK_PLACEHOLDER: &str = "{block}";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Recording path with a `{block}` placeholder, filled with 1..=blocks.
    pub file_template: String,
    pub blocks: usize,
    pub frequencies: usize,
    /// Event code of frequency index `i` (1-based) is `i + label_offset`.
    pub label_offset: usize,
    pub label_suffix: String,
    pub channels: usize,
    pub samples: usize,
    /// 1-based channel index handed to the processor unchanged.
    pub reference_channel: usize,
    pub bandpass: BandConfig,
    pub notch: BandConfig,
    pub epoch: EpochConfig,
    pub baseline: f64,
    pub fill_value: f64,
    pub run_log_dir: Option<PathBuf>,
    pub synthetic: SyntheticConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BandConfig {
    pub f_low: f64,
    pub f_high: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct EpochConfig {
    pub start_s: f64,
    pub end_s: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SyntheticConfig {
    pub sampling_rate: f64,
    pub amplitude: f64,
    pub noise: f64,
    pub seed: u64,
    /// Samples appended past the end of every epoch window.
    pub extra_samples: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            file_template: "data/block{block}.edf".to_string(),
            blocks: 5,
            frequencies: 8,
            label_offset: 7,
            label_suffix: ", Expr 20s".to_string(),
            channels: 31,
            samples: 10000,
            reference_channel: 22,
            bandpass: BandConfig {
                f_low: 1.0,
                f_high: 200.0,
            },
            notch: BandConfig {
                f_low: 40.0,
                f_high: 60.0,
            },
            epoch: EpochConfig {
                start_s: 0.0,
                end_s: 20.0,
            },
            baseline: 0.0,
            fill_value: 1.0,
            run_log_dir: None,
            synthetic: SyntheticConfig::default(),
        }
    }
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 500.0,
            amplitude: 10.0,
            noise: 1.0,
            seed: 42,
            extra_samples: 0,
        }
    }
}

impl BandConfig {
    fn check(&self, name: &str) -> Result<()> {
        if !(self.f_low >= 0.0 && self.f_low < self.f_high) {
            return Err(ExtractError::InvalidConfig(format!(
                "{} band must satisfy 0 <= f_low < f_high, got {}..{}",
                name, self.f_low, self.f_high
            )));
        }
        Ok(())
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.file_template.contains(BLOCK_PLACEHOLDER) {
            return Err(ExtractError::InvalidConfig(format!(
                "file_template '{}' has no {} placeholder",
                self.file_template, BLOCK_PLACEHOLDER
            )));
        }

        for (name, value) in [
            ("blocks", self.blocks),
            ("frequencies", self.frequencies),
            ("channels", self.channels),
            ("samples", self.samples),
        ] {
            if value == 0 {
                return Err(ExtractError::InvalidConfig(format!("{} must be > 0", name)));
            }
        }

        self.bandpass.check("bandpass")?;
        self.notch.check("notch")?;

        if !(self.epoch.start_s < self.epoch.end_s) {
            return Err(ExtractError::InvalidConfig(format!(
                "epoch window [{}, {}] is empty",
                self.epoch.start_s, self.epoch.end_s
            )));
        }

        if self.synthetic.sampling_rate <= 0.0 {
            return Err(ExtractError::InvalidConfig(
                "synthetic.sampling_rate must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Tensor shape `(channels, samples, frequencies, blocks)`.
    pub fn shape(&self) -> (usize, usize, usize, usize) {
        (self.channels, self.samples, self.frequencies, self.blocks)
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ExtractionConfig> {
    let config_str = fs::read_to_string(path)?;
    let config: ExtractionConfig = serde_yaml::from_str(&config_str)?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(config: &ExtractionConfig, path: P) -> Result<()> {
    let yaml = serde_yaml::to_string(config)?;
    fs::write(path, yaml)?;
    Ok(())
}
