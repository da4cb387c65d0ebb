use log::{debug, info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::{block_path, event_label};
use crate::config::ExtractionConfig;
use crate::error::{ExtractError, Result, Stage};
use crate::processing::{Epoch, EpochWindow, SignalProcessor};
use crate::tensor::ExtractionTensor;
use crate::utils::log::{log_csv, log_with_header};

const RUN_LOG: &str = "extraction.log";
const BLOCK_LOG: &str = "blocks.csv";
const BLOCK_LOG_HEADERS: [&str; 4] = ["block", "path", "epochs", "elapsed_ms"];

// -----------------------------------------------------------------------------
// EXTRACTION DRIVER
// -----------------------------------------------------------------------------

/// Resolved inputs of one block, 1-based.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockPlan {
    pub block: usize,
    pub path: PathBuf,
    pub labels: Vec<String>,
}

/// Walks blocks x frequencies x channels, conditioning each block's recording
/// through the processor and copying its epochs into a fresh tensor.
pub struct ExtractionDriver<P> {
    processor: P,
    config: ExtractionConfig,
}

impl<P: SignalProcessor> ExtractionDriver<P> {
    pub fn new(processor: P, config: ExtractionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { processor, config })
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    fn labels(&self) -> Vec<String> {
        (1..=self.config.frequencies)
            .map(|freq_idx| {
                event_label(freq_idx, self.config.label_offset, &self.config.label_suffix)
            })
            .collect()
    }

    pub fn plan(&self) -> Vec<BlockPlan> {
        let labels = self.labels();
        (1..=self.config.blocks)
            .map(|block| BlockPlan {
                block,
                path: block_path(&self.config.file_template, block),
                labels: labels.clone(),
            })
            .collect()
    }

    fn window(&self) -> EpochWindow {
        EpochWindow::new(self.config.epoch.start_s, self.config.epoch.end_s)
    }

    /// load -> band-pass -> notch -> re-reference, yielding the block's base recording.
    fn condition_block(&self, block: usize, path: &Path) -> Result<P::Recording> {
        let cfg = &self.config;
        let p = &self.processor;

        let recording = p
            .load(path)
            .map_err(|e| ExtractError::processor(block, Stage::Load, e))?;
        let recording = p
            .bandpass(recording, cfg.bandpass.f_low, cfg.bandpass.f_high)
            .map_err(|e| ExtractError::processor(block, Stage::Bandpass, e))?;
        let recording = p
            .notch_reject(recording, cfg.notch.f_low, cfg.notch.f_high)
            .map_err(|e| ExtractError::processor(block, Stage::Notch, e))?;
        p.rereference(recording, cfg.reference_channel)
            .map_err(|e| ExtractError::processor(block, Stage::Rereference, e))
    }

    /// Cut one labelled epoch from the block's base recording, never from a
    /// previously extracted epoch.
    fn extract_epoch(&self, block: usize, recording: &P::Recording, label: &str) -> Result<Epoch> {
        debug!("block {}: extracting epoch '{}'", block, label);
        self.processor
            .extract_epoch(recording, label, self.window(), self.config.baseline)
            .map_err(|e| ExtractError::processor(block, Stage::Epoch, e))
    }

    /// Every epoch of a block, in frequency order.
    fn extract_block(&self, block: usize, path: &Path, labels: &[String]) -> Result<Vec<Epoch>> {
        let recording = self.condition_block(block, path)?;
        labels
            .iter()
            .map(|label| self.extract_epoch(block, &recording, label))
            .collect()
    }

    /// Sequential run in block order. Each epoch is copied into the tensor as
    /// soon as it is extracted; the first failure aborts the run.
    pub fn run(&self) -> Result<ExtractionTensor> {
        let mut tensor = ExtractionTensor::new(self.config.shape(), self.config.fill_value);
        self.log_start("sequential");

        for plan in self.plan() {
            let start = Instant::now();
            info!(
                "block {}/{}: {}",
                plan.block,
                self.config.blocks,
                plan.path.display()
            );

            let recording = self.condition_block(plan.block, &plan.path)?;
            for (freq, label) in plan.labels.iter().enumerate() {
                let epoch = self.extract_epoch(plan.block, &recording, label)?;
                tensor.assign_epoch(freq, plan.block - 1, &epoch)?;
            }
            drop(recording);

            self.log_block(&plan, plan.labels.len(), start.elapsed().as_millis());
        }

        Ok(tensor)
    }

    fn log_start(&self, mode: &str) {
        let Some(dir) = &self.config.run_log_dir else {
            return;
        };
        let message = format!(
            "mode: {}\ntemplate: {}\nshape: {:?}\nreference channel: {}\nbandpass: {:?}\nnotch: {:?}",
            mode,
            self.config.file_template,
            self.config.shape(),
            self.config.reference_channel,
            self.config.bandpass,
            self.config.notch
        );
        if let Err(e) = log_with_header(dir, RUN_LOG, "extraction started", &message) {
            warn!("could not write run log in {}: {}", dir.display(), e);
        }
    }

    fn log_block(&self, plan: &BlockPlan, epochs: usize, elapsed_ms: u128) {
        let Some(dir) = &self.config.run_log_dir else {
            return;
        };
        let row = [
            plan.block.to_string(),
            plan.path.display().to_string(),
            epochs.to_string(),
            elapsed_ms.to_string(),
        ];
        let row: Vec<&str> = row.iter().map(String::as_str).collect();
        if let Err(e) = log_csv(dir, BLOCK_LOG, &BLOCK_LOG_HEADERS, &row) {
            warn!("could not write block log in {}: {}", dir.display(), e);
        }
    }
}

impl<P> ExtractionDriver<P>
where
    P: SignalProcessor + Sync,
{
    /// Blocks fan out over the rayon pool. Every slice is still written exactly
    /// once, so the tensor equals the one `run` produces.
    pub fn run_parallel(&self) -> Result<ExtractionTensor> {
        let mut tensor = ExtractionTensor::new(self.config.shape(), self.config.fill_value);
        self.log_start("parallel");

        let extracted: Vec<(BlockPlan, Vec<Epoch>, u128)> = self
            .plan()
            .into_par_iter()
            .map(|plan| -> Result<(BlockPlan, Vec<Epoch>, u128)> {
                let start = Instant::now();
                let epochs = self.extract_block(plan.block, &plan.path, &plan.labels)?;
                Ok((plan, epochs, start.elapsed().as_millis()))
            })
            .collect::<Result<_>>()?;

        for (plan, epochs, elapsed_ms) in &extracted {
            for (freq, epoch) in epochs.iter().enumerate() {
                tensor.assign_epoch(freq, plan.block - 1, epoch)?;
            }
            self.log_block(plan, epochs.len(), *elapsed_ms);
        }

        Ok(tensor)
    }
}
