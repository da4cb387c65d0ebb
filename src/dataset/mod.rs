// src/dataset/mod.rs
use serde::{Deserialize, Serialize};

use crate::config::ExtractionConfig;
use crate::error::{ExtractError, Result};

/// Full recording montage. `CPz` (1-based index 22) is the re-reference
/// electrode and is absent from the extracted epochs.
pub const MONTAGE: [&str; 32] = [
    "Fp1", "Fp2", "AF3", "AF4", "F7", "F3", "Fz", "F4", "F8", "FT7", "FC3", "FCz", "FC4", "FT8",
    "T7", "C3", "Cz", "C4", "T8", "TP7", "CP3", "CPz", "CP4", "TP8", "P7", "P3", "Pz", "P4", "P8",
    "O1", "Oz", "O2",
];

/// Description of the extracted SSVEP dataset, shipped next to the tensor.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DatasetInfo {
    pub id: String,
    pub channels: Vec<String>,
    /// Stimulus flicker frequency of each frequency index, in Hz.
    pub frequencies: Vec<f64>,
    /// Stimulus phase of each frequency index, in radians.
    pub phases: Vec<f64>,
    pub sampling_rate: f64,
    pub block_num: usize,
    /// Trial length in seconds.
    pub trial_len: f64,
    /// Montage entry (1-based) used as the reference.
    pub reference_channel: usize,
}

impl Default for DatasetInfo {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl DatasetInfo {
    /// Channel labels follow the montage with the reference electrode dropped.
    /// When the configuration asks for a different channel count than the
    /// montage provides, channels are named by position instead.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let reference = config.reference_channel;
        let referenced: Vec<String> = MONTAGE
            .iter()
            .enumerate()
            .filter(|(idx, _)| idx + 1 != reference)
            .map(|(_, name)| name.to_string())
            .collect();

        let channels = if referenced.len() == config.channels {
            referenced
        } else {
            (1..=config.channels).map(|c| format!("Ch{}", c)).collect()
        };

        let frequencies: Vec<f64> = (1..=config.frequencies)
            .map(|freq_idx| (freq_idx + config.label_offset) as f64)
            .collect();

        Self {
            id: "SSVEP block extraction".to_string(),
            channels,
            phases: vec![0.0; frequencies.len()],
            frequencies,
            sampling_rate: config.synthetic.sampling_rate,
            block_num: config.blocks,
            trial_len: config.epoch.end_s - config.epoch.start_s,
            reference_channel: reference,
        }
    }

    pub fn trial_num(&self) -> usize {
        self.frequencies.len()
    }

    pub fn samples_per_trial(&self) -> usize {
        (self.trial_len * self.sampling_rate).round() as usize
    }

    pub fn channel_index(&self, name: &str) -> Option<usize> {
        self.channels.iter().position(|c| c == name)
    }

    /// Splits 0-based blocks into `(test, train)` with `block_idx` held out.
    pub fn leave_one_block_out(&self, block_idx: usize) -> Result<(Vec<usize>, Vec<usize>)> {
        if block_idx >= self.block_num {
            return Err(ExtractError::InvalidConfig(format!(
                "block index {} out of range (0..{})",
                block_idx, self.block_num
            )));
        }
        let train = (0..self.block_num).filter(|&b| b != block_idx).collect();
        Ok((vec![block_idx], train))
    }
}
