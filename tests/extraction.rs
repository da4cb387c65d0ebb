use ndarray::Array2;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ssvep_extract::{
    Epoch, EpochWindow, ExtractError, ExtractionConfig, ExtractionDriver, ProcessorError,
    SignalProcessor, Stage,
};

// =============================================================================
// MOCK PROCESSOR
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Load(PathBuf),
    Bandpass(f64, f64),
    Notch(f64, f64),
    Rereference(usize),
    Epoch {
        block: usize,
        label: String,
        steps: usize,
        window: EpochWindow,
        baseline: f64,
    },
}

struct MockRecording {
    block: usize,
    steps: usize,
}

struct MockProcessor {
    channels: usize,
    samples: usize,
    fail_load_on: Option<usize>,
    short_code: Option<usize>,
    missing_code: Option<usize>,
    calls: Mutex<Vec<Call>>,
}

impl MockProcessor {
    fn new(channels: usize, samples: usize) -> Self {
        Self {
            channels,
            samples,
            fail_load_on: None,
            short_code: None,
            missing_code: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing_on(mut self, block: usize) -> Self {
        self.fail_load_on = Some(block);
        self
    }

    /// Epochs of `code` come back one sample short.
    fn short_for(mut self, code: usize) -> Self {
        self.short_code = Some(code);
        self
    }

    /// Recordings carry no event with `code`.
    fn without_event(mut self, code: usize) -> Self {
        self.missing_code = Some(code);
        self
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

/// Unique, exactly representable value for every (block, event code, channel, sample).
fn value(block: usize, code: usize, chan: usize, sample: usize) -> f64 {
    (((block * 100 + code) * 100 + chan) as f64) * 1e5 + sample as f64
}

fn block_of(path: &Path) -> usize {
    let digits: String = path
        .to_string_lossy()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap()
}

fn code_of(label: &str) -> usize {
    label.split(',').next().unwrap().parse().unwrap()
}

impl SignalProcessor for MockProcessor {
    type Recording = MockRecording;

    fn load(&self, path: &Path) -> Result<MockRecording, ProcessorError> {
        self.record(Call::Load(path.to_path_buf()));
        let block = block_of(path);
        if self.fail_load_on == Some(block) {
            return Err(ProcessorError::FileNotFound(path.to_path_buf()));
        }
        Ok(MockRecording { block, steps: 0 })
    }

    fn bandpass(&self, mut rec: MockRecording, lo: f64, hi: f64) -> Result<MockRecording, ProcessorError> {
        self.record(Call::Bandpass(lo, hi));
        rec.steps += 1;
        Ok(rec)
    }

    fn notch_reject(&self, mut rec: MockRecording, lo: f64, hi: f64) -> Result<MockRecording, ProcessorError> {
        self.record(Call::Notch(lo, hi));
        rec.steps += 1;
        Ok(rec)
    }

    fn rereference(&self, mut rec: MockRecording, channel: usize) -> Result<MockRecording, ProcessorError> {
        self.record(Call::Rereference(channel));
        rec.steps += 1;
        Ok(rec)
    }

    fn extract_epoch(
        &self,
        rec: &MockRecording,
        label: &str,
        window: EpochWindow,
        baseline: f64,
    ) -> Result<Epoch, ProcessorError> {
        self.record(Call::Epoch {
            block: rec.block,
            label: label.to_string(),
            steps: rec.steps,
            window,
            baseline,
        });
        let code = code_of(label);
        if self.missing_code == Some(code) {
            return Err(ProcessorError::EventNotFound(label.to_string()));
        }
        let samples = if self.short_code == Some(code) {
            self.samples - 1
        } else {
            self.samples
        };
        let data = Array2::from_shape_fn((self.channels, samples), |(chan, sample)| {
            value(rec.block, code, chan, sample)
        });
        Ok(Epoch::new(label, data))
    }
}

fn small_config() -> ExtractionConfig {
    ExtractionConfig {
        file_template: "block{block}.edf".to_string(),
        channels: 3,
        samples: 20,
        ..Default::default()
    }
}

// =============================================================================
// EXTRACTION PROPERTIES
// =============================================================================

#[test]
fn every_slice_matches_its_epoch() {
    let driver = ExtractionDriver::new(MockProcessor::new(3, 20), small_config()).unwrap();
    let tensor = driver.run().unwrap();

    for block in 1..=5 {
        for freq_idx in 1..=8 {
            for chan in 1..=3 {
                let expected: Vec<f64> = (0..20)
                    .map(|s| value(block, freq_idx + 7, chan - 1, s))
                    .collect();
                assert_eq!(
                    tensor.slice(chan - 1, freq_idx - 1, block - 1).to_vec(),
                    expected,
                    "block {} freq {} chan {}",
                    block,
                    freq_idx,
                    chan
                );
            }
        }
    }
}

#[test]
fn default_run_has_fixed_shape_and_drops_extra_samples() {
    let processor = MockProcessor::new(31, 10005);
    let driver = ExtractionDriver::new(processor, ExtractionConfig::default()).unwrap();
    let tensor = driver.run().unwrap();

    assert_eq!(tensor.shape(), (31, 10000, 8, 5));
    let last = tensor.slice(30, 7, 4);
    assert_eq!(last[0], value(5, 15, 30, 0));
    assert_eq!(last[9999], value(5, 15, 30, 9999));
}

#[test]
fn labels_reference_and_conditioning_per_block() {
    let driver = ExtractionDriver::new(MockProcessor::new(3, 20), small_config()).unwrap();
    driver.run().unwrap();
    let calls = driver.processor().calls();

    // load, band-pass, notch, re-reference, 8 epochs
    assert_eq!(calls.len(), 5 * 12);
    for (i, block_calls) in calls.chunks(12).enumerate() {
        let block = i + 1;
        assert_eq!(block_calls[0], Call::Load(PathBuf::from(format!("block{}.edf", block))));
        assert_eq!(block_calls[1], Call::Bandpass(1.0, 200.0));
        assert_eq!(block_calls[2], Call::Notch(40.0, 60.0));
        assert_eq!(block_calls[3], Call::Rereference(22));

        let labels: Vec<&str> = block_calls[4..]
            .iter()
            .map(|c| match c {
                Call::Epoch {
                    label,
                    steps,
                    window,
                    baseline,
                    ..
                } => {
                    // always cut from the conditioned base recording
                    assert_eq!(*steps, 3);
                    assert_eq!(*window, EpochWindow::new(0.0, 20.0));
                    assert_eq!(*baseline, 0.0);
                    label.as_str()
                }
                other => panic!("unexpected call {:?}", other),
            })
            .collect();
        assert_eq!(labels.first(), Some(&"8, Expr 20s"));
        assert_eq!(labels.last(), Some(&"15, Expr 20s"));
        assert_eq!(labels.len(), 8);
    }
}

#[test]
fn failure_on_block_three_stops_the_run() {
    let processor = MockProcessor::new(3, 20).failing_on(3);
    let driver = ExtractionDriver::new(processor, small_config()).unwrap();

    let err = driver.run().unwrap_err();
    assert!(matches!(
        err,
        ExtractError::Processor {
            block: 3,
            stage: Stage::Load,
            source: ProcessorError::FileNotFound(_),
        }
    ));

    let loads: Vec<PathBuf> = driver
        .processor()
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Load(p) => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(
        loads,
        vec![
            PathBuf::from("block1.edf"),
            PathBuf::from("block2.edf"),
            PathBuf::from("block3.edf"),
        ]
    );
}

#[test]
fn repeated_runs_are_bit_identical() {
    let driver =
        ExtractionDriver::new(MockProcessor::new(31, 10000), ExtractionConfig::default()).unwrap();
    let first = driver.run().unwrap();
    let second = driver.run().unwrap();

    assert!(first
        .as_array()
        .iter()
        .zip(second.as_array().iter())
        .all(|(a, b)| a.to_bits() == b.to_bits()));
}

#[test]
fn short_epoch_fails_out_of_range() {
    let driver = ExtractionDriver::new(MockProcessor::new(3, 19), small_config()).unwrap();
    let err = driver.run().unwrap_err();
    assert!(matches!(
        err,
        ExtractError::OutOfRange {
            block: 1,
            freq: 1,
            available: 19,
            required: 20,
            ..
        }
    ));
}

#[test]
fn short_epoch_is_reported_before_later_labels_are_requested() {
    let processor = MockProcessor::new(3, 20).short_for(8).without_event(12);
    let driver = ExtractionDriver::new(processor, small_config()).unwrap();

    assert!(matches!(
        driver.run(),
        Err(ExtractError::OutOfRange {
            block: 1,
            freq: 1,
            available: 19,
            required: 20,
            ..
        })
    ));

    let epochs = driver
        .processor()
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Epoch { .. }))
        .count();
    assert_eq!(epochs, 1);
}

#[test]
fn missing_event_label_aborts() {
    let processor = MockProcessor::new(3, 20).without_event(12);
    let driver = ExtractionDriver::new(processor, small_config()).unwrap();

    match driver.run() {
        Err(ExtractError::Processor {
            block: 1,
            stage: Stage::Epoch,
            source: ProcessorError::EventNotFound(label),
        }) => assert_eq!(label, "12, Expr 20s"),
        other => panic!("unexpected result {:?}", other.map(|t| t.shape())),
    }
}

#[test]
fn epoch_with_too_few_channels_fails() {
    let driver = ExtractionDriver::new(MockProcessor::new(2, 20), small_config()).unwrap();
    assert!(matches!(
        driver.run(),
        Err(ExtractError::MissingChannels { available: 2, required: 3, .. })
    ));
}

#[test]
fn parallel_run_matches_sequential() {
    let driver = ExtractionDriver::new(MockProcessor::new(3, 25), small_config()).unwrap();
    assert_eq!(driver.run_parallel().unwrap(), driver.run().unwrap());
}

#[test]
fn parallel_run_reports_failure() {
    let processor = MockProcessor::new(3, 20).failing_on(4);
    let driver = ExtractionDriver::new(processor, small_config()).unwrap();
    assert!(matches!(
        driver.run_parallel(),
        Err(ExtractError::Processor { block: 4, stage: Stage::Load, .. })
    ));
}
