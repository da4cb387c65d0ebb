pub mod signal_processor;
pub mod synthetic;

pub use signal_processor::{Epoch, EpochWindow, SignalProcessor};
pub use synthetic::{ConditioningStep, SyntheticProcessor, SyntheticRecording};
