//! Image dataset loading for target and shadow model training.
//!
//! Raw file parsing is delegated to `candle-datasets`:
//!
//! - MNIST and Fashion-MNIST: the four IDX files
//!   (`train-images-idx3-ubyte`, `train-labels-idx1-ubyte`,
//!   `t10k-images-idx3-ubyte`, `t10k-labels-idx1-ubyte`) in `data_dir`
//! - CIFAR-10: the binary batches (`data_batch_{1..5}.bin`, `test_batch.bin`)
//!   in `data_dir`
//!
//! Images are flattened to `[N, C*H*W]` and normalised to `[-1, 1]` with
//! `(x - 0.5) / 0.5`. Labels are `i64` class indices.

use candle_core::{DType, Device, Tensor};
use mia_core::{DatasetKind, InputShape, MiaError, Result};
use mia_models::CandleResultExt;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::Path;

/// Training examples in the built-in synthetic dataset.
pub const SYNTHETIC_TRAIN_SIZE: usize = 2000;

/// Test examples in the built-in synthetic dataset.
pub const SYNTHETIC_TEST_SIZE: usize = 500;

/// An image-classification dataset resident on a compute device.
#[derive(Debug, Clone)]
pub struct ImageDataset {
    pub kind: DatasetKind,
    pub train_images: Tensor,
    pub train_labels: Tensor,
    pub test_images: Tensor,
    pub test_labels: Tensor,
    pub input_shape: InputShape,
    pub num_classes: usize,
}

impl ImageDataset {
    /// Number of training examples available for partitioning.
    pub fn train_len(&self) -> usize {
        self.train_images.dim(0).unwrap_or(0)
    }

    /// Number of test examples available for partitioning.
    pub fn test_len(&self) -> usize {
        self.test_images.dim(0).unwrap_or(0)
    }
}

/// Load `kind` from `data_dir` onto `device`.
///
/// The synthetic dataset ignores `data_dir` and is generated from `seed`.
pub fn load_dataset(
    kind: DatasetKind,
    data_dir: &Path,
    device: &Device,
    seed: u64,
) -> Result<ImageDataset> {
    if kind != DatasetKind::Synthetic && !data_dir.is_dir() {
        return Err(MiaError::NotFound(data_dir.to_path_buf()));
    }

    tracing::info!(dataset = %kind, dir = %data_dir.display(), "Loading dataset");
    let raw = match kind {
        DatasetKind::Synthetic => {
            return synthetic(
                SYNTHETIC_TRAIN_SIZE,
                SYNTHETIC_TEST_SIZE,
                kind.input_shape(),
                kind.num_classes(),
                seed,
                device,
            );
        }
        DatasetKind::Mnist | DatasetKind::FashionMnist => {
            candle_datasets::vision::mnist::load_dir(data_dir)
        }
        DatasetKind::Cifar10 => candle_datasets::vision::cifar::load_dir(data_dir),
    }
    .model_ctx(&format!("Failed to load {kind} from {}", data_dir.display()))?;

    let dataset = ImageDataset {
        kind,
        train_images: normalise(&raw.train_images, device)?,
        train_labels: to_labels(&raw.train_labels, device)?,
        test_images: normalise(&raw.test_images, device)?,
        test_labels: to_labels(&raw.test_labels, device)?,
        input_shape: kind.input_shape(),
        num_classes: kind.num_classes(),
    };

    let dim = dataset.train_images.dim(1).model_ctx("image dim")?;
    if dim != dataset.input_shape.flat_dim() {
        return Err(MiaError::Data(format!(
            "{kind} images have {dim} values, expected {}",
            dataset.input_shape.flat_dim()
        )));
    }

    tracing::info!(
        dataset = %kind,
        train = dataset.train_len(),
        test = dataset.test_len(),
        "Dataset loaded"
    );
    Ok(dataset)
}

fn normalise(images: &Tensor, device: &Device) -> Result<Tensor> {
    images
        .to_dtype(DType::F32)
        .and_then(|t| t.flatten_from(1))
        .and_then(|t| t.affine(2.0, -1.0))
        .and_then(|t| t.to_device(device))
        .model_ctx("Failed to normalise images")
}

fn to_labels(labels: &Tensor, device: &Device) -> Result<Tensor> {
    labels
        .to_dtype(DType::I64)
        .and_then(|t| t.to_device(device))
        .model_ctx("Failed to convert labels")
}

/// Generate a seeded dataset of noisy class clusters.
///
/// Each class gets a random centroid in `[-1, 1]^d`; examples are the centroid
/// plus uniform noise in `[-0.75, 0.75]`, so classes overlap a little and a
/// model can overfit its training subset.
pub fn synthetic(
    n_train: usize,
    n_test: usize,
    input_shape: InputShape,
    num_classes: usize,
    seed: u64,
    device: &Device,
) -> Result<ImageDataset> {
    if num_classes == 0 {
        return Err(MiaError::Config("synthetic dataset needs classes".to_string()));
    }
    let dim = input_shape.flat_dim();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let centroids: Vec<Vec<f32>> = (0..num_classes)
        .map(|_| (0..dim).map(|_| rng.gen_range(-1.0..1.0)).collect())
        .collect();

    let mut sample = |n: usize| -> Result<(Tensor, Tensor)> {
        let mut values = Vec::with_capacity(n * dim);
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let class = i % num_classes;
            values.extend(
                centroids[class]
                    .iter()
                    .map(|&c| c + rng.gen_range(-0.75f32..0.75)),
            );
            labels.push(class as i64);
        }
        let images = Tensor::from_vec(values, (n, dim), device).model_ctx("synthetic images")?;
        let labels = Tensor::from_vec(labels, n, device).model_ctx("synthetic labels")?;
        Ok((images, labels))
    };

    let (train_images, train_labels) = sample(n_train)?;
    let (test_images, test_labels) = sample(n_test)?;

    Ok(ImageDataset {
        kind: DatasetKind::Synthetic,
        train_images,
        train_labels,
        test_images,
        test_labels,
        input_shape,
        num_classes,
    })
}
