//! Transaction sequences for the fraud model.
//!
//! The input is a preprocessed, fully numeric CSV file with a header row. Every
//! column except the label column is a feature. Samples are sliding windows of
//! `seq_length` consecutive rows; a window is labelled with its last row.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::info;
use ndarray::{Array2, Array3, s};

use crate::data::InMemorySource;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Transactions {
    pub feature_names: Vec<String>,
    pub features: Array2<f32>,
    pub labels: Vec<i64>,
}

impl Transactions {
    pub fn feature_count(&self) -> usize {
        self.features.ncols()
    }

    /// Stacks every window of `seq_length` rows into `[windows, seq_length, features]`.
    pub fn windows(&self, seq_length: usize) -> Result<(Array3<f32>, Vec<i64>)> {
        if seq_length == 0 {
            return Err(Error::DataFormat("sequence length must be positive".into()));
        }
        let rows = self.features.nrows();
        let count = (rows + 1).saturating_sub(seq_length);
        let mut windows = Array3::<f32>::zeros((count, seq_length, self.feature_count()));
        for i in 0..count {
            windows
                .slice_mut(s![i, .., ..])
                .assign(&self.features.slice(s![i..i + seq_length, ..]));
        }
        let labels = self.labels.iter().skip(seq_length - 1).take(count).copied().collect();
        Ok((windows, labels))
    }

    /// Batches of `batch_size` windows; a trailing partial batch is dropped.
    pub fn into_source(self, batch_size: usize, seq_length: usize) -> Result<InMemorySource> {
        let (windows, labels) = self.windows(seq_length)?;
        InMemorySource::new(windows.into_dyn(), labels, batch_size, true)
    }
}

pub fn parse_transactions<R: BufRead>(reader: R, label_column: &str) -> Result<Transactions> {
    let mut lines = reader.lines();
    let header = match lines.next() {
        Some(line) => line?,
        None => return Err(Error::DataFormat("transaction file is empty".into())),
    };
    let columns: Vec<String> = header.split(',').map(|c| c.trim().to_string()).collect();
    let label_idx = columns
        .iter()
        .position(|c| c == label_column)
        .ok_or_else(|| Error::DataFormat(format!("no \"{}\" column in header", label_column)))?;

    let feature_names: Vec<String> = columns
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != label_idx)
        .map(|(_, name)| name.clone())
        .collect();

    let mut values = Vec::new();
    let mut labels = Vec::new();
    for (line_no, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != columns.len() {
            return Err(Error::DataFormat(format!(
                "line {}: expected {} fields, found {}",
                line_no + 2,
                columns.len(),
                fields.len()
            )));
        }
        for (i, field) in fields.iter().enumerate() {
            let value: f32 = field.parse().map_err(|_| {
                Error::DataFormat(format!("line {}: \"{}\" is not numeric", line_no + 2, field))
            })?;
            if i == label_idx {
                labels.push(value.round() as i64);
            } else {
                values.push(value);
            }
        }
    }

    let features = Array2::from_shape_vec((labels.len(), feature_names.len()), values)?;
    Ok(Transactions {
        feature_names,
        features,
        labels,
    })
}

pub fn load_transactions(path: &Path, label_column: &str) -> Result<Transactions> {
    let file = File::open(path)?;
    let transactions = parse_transactions(BufReader::new(file), label_column)?;
    info!(
        "loaded {} transactions with {} features from {}",
        transactions.labels.len(),
        transactions.feature_count(),
        path.display()
    );
    Ok(transactions)
}

/// Loads `path` and cuts it into batches of `[batch_size, seq_length, features]`.
pub fn inference_source(
    path: &Path,
    label_column: &str,
    batch_size: usize,
    seq_length: usize,
) -> Result<InMemorySource> {
    load_transactions(path, label_column)?.into_source(batch_size, seq_length)
}
