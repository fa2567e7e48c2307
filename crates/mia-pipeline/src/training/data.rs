//! Index subsets and mini-batch iteration over pre-loaded tensors.

use candle_core::{DType, Device, Tensor};
use mia_core::{AttackSplit, Result};
use mia_models::CandleResultExt;
use rand::seq::SliceRandom;
use rand::Rng;

/// Rows of a dataset selected by index, with their `i64` labels.
#[derive(Debug, Clone)]
pub struct Subset {
    pub inputs: Tensor,
    pub labels: Tensor,
}

impl Subset {
    /// Gather `indices` (in order) from `inputs` / `labels`.
    pub fn from_indices(inputs: &Tensor, labels: &Tensor, indices: &[usize]) -> Result<Self> {
        let device = inputs.device().clone();
        Ok(Self {
            inputs: gather_rows(inputs, indices, &device)?,
            labels: gather_labels(labels, indices, &device)?,
        })
    }

    /// Attack-model inputs: confidence vectors labelled by membership.
    pub fn from_attack_split(split: &AttackSplit, device: &Device) -> Result<Self> {
        let inputs = Tensor::from_vec(
            split.features.clone(),
            (split.len(), split.feature_dim),
            device,
        )
        .model_ctx("attack feature tensor")?;
        let labels: Vec<i64> = split.labels.iter().map(|&l| i64::from(l)).collect();
        let labels = Tensor::from_vec(labels, split.len(), device).model_ctx("attack label tensor")?;
        Ok(Self { inputs, labels })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.inputs.dim(0).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Labels as a host vector.
    pub fn label_vec(&self) -> Result<Vec<i64>> {
        self.labels.to_vec1().model_ctx("labels to vec")
    }
}

/// Mini-batch iterator over pre-loaded tensors.
///
/// Rows are visited in index order until [`BatchIterator::reshuffle`] is
/// called. With `drop_last` the trailing partial batch is skipped so every
/// yielded batch has exactly `batch_size` rows.
pub struct BatchIterator {
    inputs: Tensor,
    labels: Tensor,
    indices: Vec<usize>,
    batch_size: usize,
    drop_last: bool,
    pos: usize,
}

impl BatchIterator {
    pub fn new(inputs: Tensor, labels: Tensor, batch_size: usize) -> Self {
        let n = inputs.dim(0).unwrap_or(0);
        Self {
            inputs,
            labels,
            indices: (0..n).collect(),
            batch_size: batch_size.max(1),
            drop_last: false,
            pos: 0,
        }
    }

    /// Iterate over a [`Subset`].
    pub fn over(subset: &Subset, batch_size: usize) -> Self {
        Self::new(subset.inputs.clone(), subset.labels.clone(), batch_size)
    }

    /// Skip the trailing partial batch.
    pub fn drop_last(mut self, drop_last: bool) -> Self {
        self.drop_last = drop_last;
        self
    }

    /// Shuffle row order for a new epoch and restart.
    pub fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.indices.shuffle(rng);
        self.pos = 0;
    }

    /// Number of batches one pass will yield.
    pub fn num_batches(&self) -> usize {
        let n = self.indices.len();
        if self.drop_last {
            n / self.batch_size
        } else {
            n.div_ceil(self.batch_size)
        }
    }

    /// Number of rows one pass will yield.
    pub fn num_rows(&self) -> usize {
        if self.drop_last {
            self.num_batches() * self.batch_size
        } else {
            self.indices.len()
        }
    }

    /// Returns the next mini-batch, or `None` if the epoch is exhausted.
    pub fn next_batch(&mut self) -> Result<Option<(Tensor, Tensor)>> {
        let n = self.indices.len();
        if self.pos >= n {
            return Ok(None);
        }

        let end = (self.pos + self.batch_size).min(n);
        if self.drop_last && end - self.pos < self.batch_size {
            self.pos = n;
            return Ok(None);
        }
        let batch_idx: Vec<u32> = self.indices[self.pos..end]
            .iter()
            .map(|&i| i as u32)
            .collect();
        self.pos = end;

        let device = self.inputs.device().clone();
        let idx_tensor = Tensor::new(batch_idx.as_slice(), &device).model_ctx("batch index")?;
        let batch_inputs = self
            .inputs
            .index_select(&idx_tensor, 0)
            .model_ctx("batch inputs")?;
        let batch_labels = self
            .labels
            .index_select(&idx_tensor, 0)
            .model_ctx("batch labels")?;

        Ok(Some((batch_inputs, batch_labels)))
    }
}

/// Select rows of a 2-D tensor; an empty selection keeps the column count.
pub fn gather_rows(tensor: &Tensor, indices: &[usize], device: &Device) -> Result<Tensor> {
    if indices.is_empty() {
        let cols = tensor.dim(1).model_ctx("dim error")?;
        return Tensor::zeros((0, cols), tensor.dtype(), device).model_ctx("empty tensor");
    }
    let idx: Vec<u32> = indices.iter().map(|&i| i as u32).collect();
    let idx_tensor = Tensor::new(idx.as_slice(), device).model_ctx("idx tensor")?;
    tensor.index_select(&idx_tensor, 0).model_ctx("index_select")
}

fn gather_labels(labels: &Tensor, indices: &[usize], device: &Device) -> Result<Tensor> {
    if indices.is_empty() {
        return Tensor::zeros(0, DType::I64, device).model_ctx("empty labels");
    }
    let idx: Vec<u32> = indices.iter().map(|&i| i as u32).collect();
    let idx_tensor = Tensor::new(idx.as_slice(), device).model_ctx("idx tensor")?;
    labels.index_select(&idx_tensor, 0).model_ctx("index_select labels")
}
