pub mod driver;

pub use driver::{BlockPlan, ExtractionDriver};

use std::path::PathBuf;

use crate::config::BLOCK_PLACEHOLDER;

/// Event label of a 1-based frequency index: the event code `freq_idx + offset`
/// followed by the suffix, e.g. `"8, Expr 20s"`.
pub fn event_label(freq_idx: usize, offset: usize, suffix: &str) -> String {
    format!("{}{}", freq_idx + offset, suffix)
}

/// Recording path of a 1-based block.
pub fn block_path(template: &str, block: usize) -> PathBuf {
    PathBuf::from(template.replace(BLOCK_PLACEHOLDER, &block.to_string()))
}
