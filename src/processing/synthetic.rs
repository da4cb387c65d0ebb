use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use super::signal_processor::{Epoch, EpochWindow, SignalProcessor};
use crate::config::{ExtractionConfig, SyntheticConfig};
use crate::dataset::MONTAGE;
use crate::error::ProcessorError;
use crate::extraction::event_label;

// -----------------------------------------------------------------------------
// SYNTHETIC SSVEP SOURCE
// -----------------------------------------------------------------------------

/// Stand-in toolbox producing already-conditioned SSVEP responses.
///
/// Every channel of an epoch is a sinusoid at the stimulus frequency encoded in
/// the event label, phase-shifted per channel, plus seeded uniform noise. The
/// conditioning calls only validate their arguments and are recorded on the
/// recording; no filtering takes place.
pub struct SyntheticProcessor {
    config: SyntheticConfig,
    channels: usize,
    events: Vec<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConditioningStep {
    Bandpass { f_low: f64, f_high: f64 },
    Notch { f_low: f64, f_high: f64 },
    Rereference { channel: usize },
}

#[derive(Debug, Clone)]
pub struct SyntheticRecording {
    pub path: PathBuf,
    pub steps: Vec<ConditioningStep>,
    seed: u64,
}

impl SyntheticProcessor {
    /// `events` pairs each event label with its stimulus frequency in Hz.
    pub fn new(config: SyntheticConfig, channels: usize, events: Vec<(String, f64)>) -> Self {
        Self {
            config,
            channels,
            events,
        }
    }

    /// Events follow the extraction labels, the event code doubling as the
    /// flicker frequency ("8, Expr 20s" flickers at 8 Hz).
    pub fn from_config(config: &ExtractionConfig) -> Self {
        let events = (1..=config.frequencies)
            .map(|freq_idx| {
                let code = freq_idx + config.label_offset;
                (
                    event_label(freq_idx, config.label_offset, &config.label_suffix),
                    code as f64,
                )
            })
            .collect();
        Self::new(config.synthetic.clone(), config.channels, events)
    }

    pub fn event_labels(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(|(label, _)| label.as_str())
    }

    fn nyquist(&self) -> f64 {
        self.config.sampling_rate / 2.0
    }

    fn check_band(&self, f_low: f64, f_high: f64) -> Result<(), ProcessorError> {
        if f_low < 0.0 || f_low >= f_high {
            return Err(ProcessorError::Filter(format!(
                "invalid band {}..{} Hz",
                f_low, f_high
            )));
        }
        if f_high >= self.nyquist() {
            return Err(ProcessorError::Filter(format!(
                "upper edge {} Hz is not below Nyquist ({} Hz)",
                f_high,
                self.nyquist()
            )));
        }
        Ok(())
    }
}

/// FNV-1a over the path bytes, folded into the configured seed so each block
/// file gets its own noise stream.
fn path_seed(seed: u64, path: &Path) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in path.to_string_lossy().bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash ^ seed
}

impl SignalProcessor for SyntheticProcessor {
    type Recording = SyntheticRecording;

    fn load(&self, path: &Path) -> Result<SyntheticRecording, ProcessorError> {
        if path.as_os_str().is_empty() {
            return Err(ProcessorError::FileNotFound(path.to_path_buf()));
        }
        Ok(SyntheticRecording {
            path: path.to_path_buf(),
            steps: Vec::new(),
            seed: path_seed(self.config.seed, path),
        })
    }

    fn bandpass(
        &self,
        mut recording: SyntheticRecording,
        f_low: f64,
        f_high: f64,
    ) -> Result<SyntheticRecording, ProcessorError> {
        self.check_band(f_low, f_high)?;
        recording
            .steps
            .push(ConditioningStep::Bandpass { f_low, f_high });
        Ok(recording)
    }

    fn notch_reject(
        &self,
        mut recording: SyntheticRecording,
        f_low: f64,
        f_high: f64,
    ) -> Result<SyntheticRecording, ProcessorError> {
        self.check_band(f_low, f_high)?;
        recording.steps.push(ConditioningStep::Notch { f_low, f_high });
        Ok(recording)
    }

    fn rereference(
        &self,
        mut recording: SyntheticRecording,
        channel_index: usize,
    ) -> Result<SyntheticRecording, ProcessorError> {
        // The reference is a montage electrode, independent of how many
        // channels the epochs are cut down to.
        let montage = MONTAGE.len().max(self.channels + 1);
        if channel_index == 0 || channel_index > montage {
            return Err(ProcessorError::Rereference(format!(
                "channel {} outside montage 1..={}",
                channel_index, montage
            )));
        }
        recording.steps.push(ConditioningStep::Rereference {
            channel: channel_index,
        });
        Ok(recording)
    }

    fn extract_epoch(
        &self,
        recording: &SyntheticRecording,
        label: &str,
        window: EpochWindow,
        _baseline: f64,
    ) -> Result<Epoch, ProcessorError> {
        let (event_idx, stimulus_hz) = self
            .events
            .iter()
            .enumerate()
            .find(|(_, (event, _))| event == label)
            .map(|(idx, (_, hz))| (idx, *hz))
            .ok_or_else(|| ProcessorError::EventNotFound(label.to_string()))?;

        let fs = self.config.sampling_rate;
        let n_samples = window.samples_at(fs) + self.config.extra_samples;
        let mut rng = StdRng::seed_from_u64(
            recording
                .seed
                .wrapping_add((event_idx as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15)),
        );

        let mut data = Array2::zeros((self.channels, n_samples));
        for ((chan, sample), value) in data.indexed_iter_mut() {
            let t = window.start_s + sample as f64 / fs;
            let phase = chan as f64 * PI / self.channels as f64;
            let noise = if self.config.noise > 0.0 {
                rng.gen_range(-self.config.noise..=self.config.noise)
            } else {
                0.0
            };
            *value = self.config.amplitude * (2.0 * PI * stimulus_hz * t + phase).sin() + noise;
        }

        Ok(Epoch::new(label, data))
    }
}
