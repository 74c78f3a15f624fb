//! Batch sources feeding the export step and the inference clients.

pub mod fashion_mnist;
pub mod fraud;

use ndarray::{ArrayD, Axis, Slice};

/// A group of input samples and the labels at the same positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub inputs: ArrayD<f32>,
    pub labels: Vec<i64>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// A finite sequence of batches. Each call to `batches` starts over from the
/// first batch.
pub trait BatchSource {
    fn batches(&self) -> Box<dyn Iterator<Item = Batch> + '_>;
}

/// Samples held in memory, cut along axis 0 into batches of `batch_size`.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    inputs: ArrayD<f32>,
    labels: Vec<i64>,
    batch_size: usize,
    drop_remainder: bool,
}

impl InMemorySource {
    /// `inputs` must have one row per label along axis 0, and `batch_size`
    /// must be non-zero.
    pub fn new(
        inputs: ArrayD<f32>,
        labels: Vec<i64>,
        batch_size: usize,
        drop_remainder: bool,
    ) -> crate::Result<Self> {
        if batch_size == 0 {
            return Err(crate::Error::DataFormat("batch size must be positive".into()));
        }
        let rows = inputs.shape().first().copied().unwrap_or(0);
        if rows != labels.len() {
            return Err(crate::Error::DataFormat(format!(
                "{} input rows but {} labels",
                rows,
                labels.len()
            )));
        }
        Ok(Self {
            inputs,
            labels,
            batch_size,
            drop_remainder,
        })
    }

    pub fn num_samples(&self) -> usize {
        self.labels.len()
    }

    pub fn num_batches(&self) -> usize {
        if self.drop_remainder {
            self.labels.len() / self.batch_size
        } else {
            self.labels.len().div_ceil(self.batch_size)
        }
    }

    /// Shape of one sample, without the batch axis.
    pub fn sample_shape(&self) -> &[usize] {
        &self.inputs.shape()[1..]
    }
}

impl BatchSource for InMemorySource {
    fn batches(&self) -> Box<dyn Iterator<Item = Batch> + '_> {
        let total = self.labels.len();
        Box::new((0..self.num_batches()).map(move |i| {
            let start = i * self.batch_size;
            let end = (start + self.batch_size).min(total);
            Batch {
                inputs: self
                    .inputs
                    .slice_axis(Axis(0), Slice::from(start..end))
                    .to_owned(),
                labels: self.labels[start..end].to_vec(),
            }
        }))
    }
}
