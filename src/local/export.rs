use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ExtractionConfig;
use crate::dataset::DatasetInfo;
use crate::error::{ExtractError, Result};
use crate::tensor::ExtractionTensor;

const INDEX_COLUMNS: [&str; 3] = ["block", "frequency", "channel"];

/// Upper bound on the element count of a tensor rebuilt from CSV (2 GiB of f64).
pub const MAX_TENSOR_ELEMENTS: usize = 1 << 28;

// -----------------------------------------------------------------------------
// TENSOR CSV
// -----------------------------------------------------------------------------

/// One row per `[channel, :, frequency, block]` slice, indices 1-based,
/// ordered block -> frequency -> channel.
pub fn write_tensor_csv<P: AsRef<Path>>(path: P, tensor: &ExtractionTensor) -> Result<()> {
    let (channels, samples, frequencies, blocks) = tensor.shape();
    let mut writer = csv::Writer::from_path(path.as_ref())?;

    let mut header: Vec<String> = INDEX_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.extend((0..samples).map(|s| format!("s{}", s)));
    writer.write_record(&header)?;

    let mut row: Vec<String> = Vec::with_capacity(samples + INDEX_COLUMNS.len());
    for block in 0..blocks {
        for freq in 0..frequencies {
            for chan in 0..channels {
                row.clear();
                row.push((block + 1).to_string());
                row.push((freq + 1).to_string());
                row.push((chan + 1).to_string());
                row.extend(tensor.slice(chan, freq, block).iter().map(|v| v.to_string()));
                writer.write_record(&row)?;
            }
        }
    }

    writer.flush()?;
    info!(
        "wrote {} slices to {}",
        channels * frequencies * blocks,
        path.as_ref().display()
    );
    Ok(())
}

fn parse_index(field: Option<&str>, column: &str, line: u64) -> Result<usize> {
    let field = field.ok_or_else(|| ExtractError::Parse(format!("line {}: missing {}", line, column)))?;
    match field.trim().parse::<usize>() {
        Ok(idx) if idx >= 1 => Ok(idx),
        _ => Err(ExtractError::Parse(format!(
            "line {}: {} '{}' is not a 1-based index",
            line, column, field
        ))),
    }
}

/// Rebuilds a tensor written by [`write_tensor_csv`]. The shape is the largest
/// index seen on each axis; slices absent from the file keep the fill value 1.0.
pub fn read_tensor_csv<P: AsRef<Path>>(path: P) -> Result<ExtractionTensor> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;

    let header = reader.headers()?.clone();
    let index_ok = header
        .iter()
        .take(INDEX_COLUMNS.len())
        .eq(INDEX_COLUMNS.iter().copied());
    if !index_ok || header.len() <= INDEX_COLUMNS.len() {
        return Err(ExtractError::Parse(format!(
            "header must start with {} followed by sample columns",
            INDEX_COLUMNS.join(",")
        )));
    }
    let samples = header.len() - INDEX_COLUMNS.len();

    let mut slices: Vec<(usize, usize, usize, Vec<f64>)> = Vec::new();
    let mut seen = HashSet::new();
    let (mut channels, mut frequencies, mut blocks) = (0, 0, 0);

    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let block = parse_index(record.get(0), "block", line)?;
        let freq = parse_index(record.get(1), "frequency", line)?;
        let chan = parse_index(record.get(2), "channel", line)?;
        if !seen.insert((block, freq, chan)) {
            return Err(ExtractError::Parse(format!(
                "line {}: duplicate slice block {} frequency {} channel {}",
                line, block, freq, chan
            )));
        }

        let values = record
            .iter()
            .skip(INDEX_COLUMNS.len())
            .map(|v| {
                v.trim().parse::<f64>().map_err(|_| {
                    ExtractError::Parse(format!("line {}: '{}' is not a number", line, v))
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        channels = channels.max(chan);
        frequencies = frequencies.max(freq);
        blocks = blocks.max(block);
        slices.push((block - 1, freq - 1, chan - 1, values));
    }

    if slices.is_empty() {
        return Err(ExtractError::Parse("no tensor rows".to_string()));
    }

    let elements = channels
        .checked_mul(samples)
        .and_then(|n| n.checked_mul(frequencies))
        .and_then(|n| n.checked_mul(blocks))
        .filter(|&n| n <= MAX_TENSOR_ELEMENTS)
        .ok_or_else(|| {
            ExtractError::Parse(format!(
                "indices imply shape ({}, {}, {}, {}), above {} elements",
                channels, samples, frequencies, blocks, MAX_TENSOR_ELEMENTS
            ))
        })?;
    debug!("rebuilding tensor of {} elements", elements);

    let mut tensor = ExtractionTensor::new((channels, samples, frequencies, blocks), 1.0);
    for (block, freq, chan, values) in slices {
        tensor
            .as_array_mut()
            .slice_mut(ndarray::s![chan, .., freq, block])
            .assign(&ndarray::ArrayView1::from(&values[..]));
    }
    Ok(tensor)
}

// -----------------------------------------------------------------------------
// METADATA SIDECAR
// -----------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TensorMetadata {
    pub created_at: DateTime<Utc>,
    /// `[channels, samples, frequencies, blocks]`
    pub shape: [usize; 4],
    pub dataset: DatasetInfo,
    pub config: ExtractionConfig,
}

impl TensorMetadata {
    pub fn new(tensor: &ExtractionTensor, config: &ExtractionConfig) -> Self {
        let (c, s, f, b) = tensor.shape();
        Self {
            created_at: Utc::now(),
            shape: [c, s, f, b],
            dataset: DatasetInfo::from_config(config),
            config: config.clone(),
        }
    }
}

/// `out.csv` -> `out.meta.yaml`
pub fn metadata_path(csv_path: &Path) -> PathBuf {
    csv_path.with_extension("meta.yaml")
}

pub fn write_metadata<P: AsRef<Path>>(path: P, metadata: &TensorMetadata) -> Result<()> {
    let yaml = serde_yaml::to_string(metadata)?;
    fs::write(path, yaml)?;
    Ok(())
}

pub fn read_metadata<P: AsRef<Path>>(path: P) -> Result<TensorMetadata> {
    let yaml = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&yaml)?)
}
