//! Persistence of attack splits as safetensors files.
//!
//! Each file holds three tensors: `features` (F32, `[N, C]`), `labels`
//! (I32, `[N]`), and `classes` (I32, `[N]`).

use mia_core::{AttackDataset, AttackSplit, MiaError, Result};
use safetensors::tensor::TensorView;
use safetensors::{Dtype, SafeTensors};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Attack training records (from shadow models).
pub const ATTACK_TRAIN_FILE: &str = "attack_train_data.safetensors";

/// Attack test records (from the target model).
pub const ATTACK_TEST_FILE: &str = "attack_test_data.safetensors";

/// Paths of the train and test split files under `dir`.
pub fn split_paths(dir: &Path) -> (PathBuf, PathBuf) {
    (dir.join(ATTACK_TRAIN_FILE), dir.join(ATTACK_TEST_FILE))
}

/// Write both splits of `data` into `dir`.
pub fn save_attack_dataset(dir: &Path, data: &AttackDataset) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let (train, test) = split_paths(dir);
    save_split(&train, &data.train)?;
    save_split(&test, &data.test)?;
    tracing::info!(dir = %dir.display(), train = data.train.len(), test = data.test.len(), "Saved attack data");
    Ok(())
}

/// Read both splits from `dir`.
pub fn load_attack_dataset(dir: &Path) -> Result<AttackDataset> {
    let (train, test) = split_paths(dir);
    Ok(AttackDataset {
        train: load_split(&train)?,
        test: load_split(&test)?,
    })
}

/// Write one split to `path`.
pub fn save_split(path: &Path, split: &AttackSplit) -> Result<()> {
    let n = split.len();
    let feature_bytes: Vec<u8> = split.features.iter().flat_map(|f| f.to_le_bytes()).collect();
    let label_bytes: Vec<u8> = split.labels.iter().flat_map(|v| v.to_le_bytes()).collect();
    let class_bytes: Vec<u8> = split.classes.iter().flat_map(|v| v.to_le_bytes()).collect();

    let mut tensors = HashMap::new();
    tensors.insert(
        "features".to_string(),
        view(Dtype::F32, vec![n, split.feature_dim], &feature_bytes)?,
    );
    tensors.insert("labels".to_string(), view(Dtype::I32, vec![n], &label_bytes)?);
    tensors.insert("classes".to_string(), view(Dtype::I32, vec![n], &class_bytes)?);

    let serialized = safetensors::tensor::serialize(&tensors, &None)
        .map_err(|e| MiaError::Data(format!("serialize: {e}")))?;
    std::fs::write(path, serialized)?;
    Ok(())
}

fn view(dtype: Dtype, shape: Vec<usize>, data: &[u8]) -> Result<TensorView<'_>> {
    TensorView::new(dtype, shape, data)
        .map_err(|e| MiaError::Data(format!("TensorView create failed: {e}")))
}

/// Read one split from `path`.
///
/// # Errors
///
/// [`MiaError::NotFound`] if the file is missing; [`MiaError::Data`] if a
/// tensor is absent, has the wrong dtype, or the row counts disagree.
pub fn load_split(path: &Path) -> Result<AttackSplit> {
    if !path.exists() {
        return Err(MiaError::NotFound(path.to_path_buf()));
    }
    let data = std::fs::read(path)?;
    let tensors = SafeTensors::deserialize(&data)
        .map_err(|e| MiaError::Data(format!("Failed to parse safetensor {}: {e}", path.display())))?;

    let (features, shape) = read_tensor(&tensors, "features", Dtype::F32, path, |b| {
        f32::from_le_bytes([b[0], b[1], b[2], b[3]])
    })?;
    let (labels, _) = read_tensor(&tensors, "labels", Dtype::I32, path, |b| {
        i32::from_le_bytes([b[0], b[1], b[2], b[3]])
    })?;
    let (classes, _) = read_tensor(&tensors, "classes", Dtype::I32, path, |b| {
        i32::from_le_bytes([b[0], b[1], b[2], b[3]])
    })?;

    if shape.len() != 2 {
        return Err(MiaError::Data(format!(
            "features in {} must be 2-D, got shape {shape:?}",
            path.display()
        )));
    }
    AttackSplit::from_parts(features, shape[1], labels, classes)
}

fn read_tensor<T>(
    tensors: &SafeTensors<'_>,
    name: &str,
    dtype: Dtype,
    path: &Path,
    decode: fn(&[u8]) -> T,
) -> Result<(Vec<T>, Vec<usize>)> {
    let view = tensors.tensor(name).map_err(|e| {
        MiaError::Data(format!(
            "Tensor '{}' not found in {}: {e}",
            name,
            path.display()
        ))
    })?;
    if view.dtype() != dtype {
        return Err(MiaError::Data(format!(
            "Tensor '{name}' in {} has dtype {:?}, expected {dtype:?}",
            path.display(),
            view.dtype()
        )));
    }
    let values = view.data().chunks_exact(4).map(decode).collect();
    Ok((values, view.shape().to_vec()))
}
