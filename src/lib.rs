pub mod config;
pub mod dataset;
pub mod error;
pub mod extraction;
pub mod local;
pub mod processing;
pub mod tensor;
pub mod utils;

pub use config::{load_config, save_config, ExtractionConfig};
pub use dataset::DatasetInfo;
pub use error::{ExtractError, ProcessorError, Result, Stage};
pub use extraction::{BlockPlan, ExtractionDriver};
pub use processing::{Epoch, EpochWindow, SignalProcessor, SyntheticProcessor};
pub use tensor::ExtractionTensor;
