use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Failures reported by a [`SignalProcessor`](crate::processing::SignalProcessor).
#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("recording not found: {0}")]
    FileNotFound(PathBuf),

    #[error("undecodable recording: {0}")]
    Decode(String),

    #[error("{0}")]
    Filter(String),

    #[error("{0}")]
    Rereference(String),

    #[error("no event labelled '{0}'")]
    EventNotFound(String),
}

/// Processing step during which a collaborator call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Bandpass,
    Notch,
    Rereference,
    Epoch,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Bandpass => "band-pass",
            Stage::Notch => "notch",
            Stage::Rereference => "re-reference",
            Stage::Epoch => "epoch extraction",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("block {block}: {stage} failed: {source}")]
    Processor {
        block: usize,
        stage: Stage,
        #[source]
        source: ProcessorError,
    },

    #[error(
        "block {block}, frequency {freq}: channel {channel} has {available} samples, {required} required"
    )]
    OutOfRange {
        block: usize,
        freq: usize,
        channel: usize,
        available: usize,
        required: usize,
    },

    #[error("block {block}, frequency {freq}: epoch has {available} channels, {required} required")]
    MissingChannels {
        block: usize,
        freq: usize,
        available: usize,
        required: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed tensor file: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ExtractError {
    pub(crate) fn processor(block: usize, stage: Stage, source: ProcessorError) -> Self {
        ExtractError::Processor {
            block,
            stage,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtractError>;
