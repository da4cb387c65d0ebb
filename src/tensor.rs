use ndarray::{s, Array4, ArrayView1, Axis};

use crate::error::{ExtractError, Result};
use crate::processing::Epoch;

/// `(channel, sample, frequency, block)` buffer filled by the extraction driver.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionTensor {
    data: Array4<f64>,
}

impl ExtractionTensor {
    pub fn new(shape: (usize, usize, usize, usize), fill: f64) -> Self {
        Self {
            data: Array4::from_elem(shape, fill),
        }
    }

    pub fn from_array(data: Array4<f64>) -> Self {
        Self { data }
    }

    pub fn shape(&self) -> (usize, usize, usize, usize) {
        self.data.dim()
    }

    pub fn channels(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn samples(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn frequencies(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    pub fn blocks(&self) -> usize {
        self.data.len_of(Axis(3))
    }

    /// 0-based indices.
    pub fn slice(&self, channel: usize, freq: usize, block: usize) -> ArrayView1<'_, f64> {
        self.data.slice(s![channel, .., freq, block])
    }

    /// Copy the leading `channels x samples` window of `epoch` into the
    /// (freq, block) slot. Indices are 0-based; errors report them 1-based.
    pub fn assign_epoch(&mut self, freq: usize, block: usize, epoch: &Epoch) -> Result<()> {
        let (channels, samples, _, _) = self.shape();

        if epoch.n_channels() < channels {
            return Err(ExtractError::MissingChannels {
                block: block + 1,
                freq: freq + 1,
                available: epoch.n_channels(),
                required: channels,
            });
        }
        if epoch.n_samples() < samples {
            return Err(ExtractError::OutOfRange {
                block: block + 1,
                freq: freq + 1,
                channel: 1,
                available: epoch.n_samples(),
                required: samples,
            });
        }

        for chan in 0..channels {
            self.data
                .slice_mut(s![chan, .., freq, block])
                .assign(&epoch.channel(chan).slice(s![..samples]));
        }
        Ok(())
    }

    /// Copy laid out `(block, frequency, channel, sample)`, one trial per
    /// (block, frequency) pair, the order downstream SSVEP classifiers read.
    pub fn to_trials(&self) -> Array4<f64> {
        self.data.view().permuted_axes([3, 2, 0, 1]).to_owned()
    }

    pub fn as_array(&self) -> &Array4<f64> {
        &self.data
    }

    pub fn as_array_mut(&mut self) -> &mut Array4<f64> {
        &mut self.data
    }

    pub fn into_inner(self) -> Array4<f64> {
        self.data
    }

    /// Mean of every value recorded for a 0-based block.
    pub fn block_mean(&self, block: usize) -> Option<f64> {
        self.data.index_axis(Axis(3), block).mean()
    }
}
