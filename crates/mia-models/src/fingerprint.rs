//! Parameter fingerprints for trained classifiers.
//!
//! All parameters are flattened in variable-name order and projected onto a
//! seeded uniform random vector. The SHA-256 of the projection's decimal
//! rendering identifies the weights: identical weights and seed always give
//! the same hash, and any weight change almost surely alters it.

use candle_core::{DType, Tensor};
use mia_core::{MiaError, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

use crate::network::Classifier;
use crate::CandleResultExt;

/// Hex-encoded fingerprint of `model`'s parameters under projection `seed`.
pub fn model_fingerprint(model: &Classifier, seed: u64) -> Result<String> {
    let params = flatten_parameters(model)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let dot: f64 = params
        .iter()
        .map(|&p| rng.gen::<f64>() * f64::from(p))
        .sum();
    let digest = Sha256::digest(dot.to_string().as_bytes());
    Ok(hex::encode(digest))
}

fn flatten_parameters(model: &Classifier) -> Result<Vec<f32>> {
    let vars = model
        .varmap()
        .data()
        .lock()
        .map_err(|e| MiaError::Model(format!("varmap lock poisoned: {e}")))?;
    let mut named: Vec<(&String, Tensor)> = vars
        .iter()
        .map(|(name, var)| (name, var.as_tensor().clone()))
        .collect();
    named.sort_by(|a, b| a.0.cmp(b.0));

    let mut flat = Vec::new();
    for (name, tensor) in named {
        let values: Vec<f32> = tensor
            .to_dtype(DType::F32)
            .and_then(|t| t.flatten_all())
            .and_then(|t| t.to_vec1())
            .model_ctx(&format!("Failed to read parameter {name}"))?;
        flat.extend(values);
    }
    Ok(flat)
}
