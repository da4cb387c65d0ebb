use ndarray::{Array2, ArrayView1};
use std::path::Path;

use crate::error::ProcessorError;

// -----------------------------------------------------------------------------
// SIGNAL PROCESSOR COLLABORATOR
// -----------------------------------------------------------------------------

/// The EEG toolbox the extraction driver delegates to.
///
/// Every step consumes the recording it is given and returns the conditioned
/// one, so no call depends on an implicit "current dataset". `extract_epoch`
/// only borrows, which lets the driver cut every frequency's epoch from the
/// same base recording.
pub trait SignalProcessor {
    type Recording;

    fn load(&self, path: &Path) -> Result<Self::Recording, ProcessorError>;

    fn bandpass(
        &self,
        recording: Self::Recording,
        f_low: f64,
        f_high: f64,
    ) -> Result<Self::Recording, ProcessorError>;

    fn notch_reject(
        &self,
        recording: Self::Recording,
        f_low: f64,
        f_high: f64,
    ) -> Result<Self::Recording, ProcessorError>;

    /// `channel_index` follows the toolbox convention (1-based).
    fn rereference(
        &self,
        recording: Self::Recording,
        channel_index: usize,
    ) -> Result<Self::Recording, ProcessorError>;

    fn extract_epoch(
        &self,
        recording: &Self::Recording,
        label: &str,
        window: EpochWindow,
        baseline: f64,
    ) -> Result<Epoch, ProcessorError>;
}

// EPOCH WINDOW COMPONENT ------------------------------------------------------

/// Seconds relative to the event onset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochWindow {
    pub start_s: f64,
    pub end_s: f64,
}

impl EpochWindow {
    pub fn new(start_s: f64, end_s: f64) -> Self {
        Self { start_s, end_s }
    }

    pub fn duration_s(&self) -> f64 {
        self.end_s - self.start_s
    }

    pub fn samples_at(&self, sampling_rate: f64) -> usize {
        (self.duration_s() * sampling_rate).round() as usize
    }
}

// EPOCH COMPONENT -------------------------------------------------------------

/// An event-aligned segment, stored `channels x samples`.
#[derive(Debug, Clone, PartialEq)]
pub struct Epoch {
    pub label: String,
    pub data: Array2<f64>,
}

impl Epoch {
    pub fn new(label: impl Into<String>, data: Array2<f64>) -> Self {
        Self {
            label: label.into(),
            data,
        }
    }

    pub fn n_channels(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_samples(&self) -> usize {
        self.data.ncols()
    }

    pub fn channel(&self, channel: usize) -> ArrayView1<'_, f64> {
        self.data.row(channel)
    }
}
