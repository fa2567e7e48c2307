//! Classifier architectures and their checkpoint format.
//!
//! Every network consumes a flat `[batch, input_dim]` tensor and produces
//! `[batch, num_classes]` logits. The CNN reshapes its input back to
//! `[batch, channels, height, width]` internally.
//!
//! # Architectures
//!
//! ```text
//! mlp      Input → Linear(hidden) → ReLU → Linear(classes)
//! softmax  Input → Linear(classes)
//! cnn      Input → Conv5x5(16) → ReLU → MaxPool2 → Conv5x5(32) → ReLU → MaxPool2
//!                → Linear(hidden) → ReLU → Linear(classes)
//! ```

use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{Conv2dConfig, VarBuilder, VarMap};
use mia_core::{Architecture, InputShape, MiaError, Result, TrainParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::CandleResultExt;

const CONV1_CHANNELS: usize = 16;
const CONV2_CHANNELS: usize = 32;
const KERNEL: usize = 5;

/// Everything needed to rebuild a network's variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub architecture: Architecture,
    pub input_shape: InputShape,
    pub hidden_dim: usize,
    pub num_classes: usize,
}

impl ModelSpec {
    /// Spec for a target/shadow model over dataset images.
    pub fn for_images(params: &TrainParams, input_shape: InputShape, num_classes: usize) -> Self {
        Self {
            architecture: params.architecture,
            input_shape,
            hidden_dim: params.hidden_dim,
            num_classes,
        }
    }

    /// Spec for a binary attack model over confidence vectors.
    pub fn for_attack(params: &TrainParams, feature_dim: usize) -> Self {
        Self {
            architecture: params.architecture,
            input_shape: InputShape::flat(feature_dim),
            hidden_dim: params.hidden_dim,
            num_classes: 2,
        }
    }

    fn check(&self) -> Result<()> {
        if self.num_classes < 2 {
            return Err(MiaError::Config(format!(
                "a classifier needs at least 2 classes, got {}",
                self.num_classes
            )));
        }
        if self.input_shape.flat_dim() == 0 {
            return Err(MiaError::Config("input dimension must be > 0".to_string()));
        }
        if self.architecture == Architecture::Cnn
            && (!self.input_shape.is_spatial()
                || self.input_shape.height < 4
                || self.input_shape.width < 4)
        {
            return Err(MiaError::Config(format!(
                "cnn needs image input of at least 4x4, got {}x{}",
                self.input_shape.height, self.input_shape.width
            )));
        }
        Ok(())
    }
}

/// Hyperparameters persisted next to a checkpoint's weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub spec: ModelSpec,
    pub params: TrainParams,
}

/// Concrete layers for each [`Architecture`].
enum Network {
    Mlp {
        fc1: candle_nn::Linear,
        fc2: candle_nn::Linear,
    },
    Softmax {
        fc: candle_nn::Linear,
    },
    Cnn {
        conv1: candle_nn::Conv2d,
        conv2: candle_nn::Conv2d,
        fc1: candle_nn::Linear,
        fc2: candle_nn::Linear,
        shape: InputShape,
    },
}

impl Network {
    fn build(spec: &ModelSpec, vb: VarBuilder) -> candle_core::Result<Self> {
        let input_dim = spec.input_shape.flat_dim();
        match spec.architecture {
            Architecture::Mlp => Ok(Self::Mlp {
                fc1: candle_nn::linear(input_dim, spec.hidden_dim, vb.pp("fc1"))?,
                fc2: candle_nn::linear(spec.hidden_dim, spec.num_classes, vb.pp("fc2"))?,
            }),
            Architecture::Softmax => Ok(Self::Softmax {
                fc: candle_nn::linear(input_dim, spec.num_classes, vb.pp("fc"))?,
            }),
            Architecture::Cnn => {
                let shape = spec.input_shape;
                let cfg = Conv2dConfig {
                    padding: KERNEL / 2,
                    ..Default::default()
                };
                let conv1 =
                    candle_nn::conv2d(shape.channels, CONV1_CHANNELS, KERNEL, cfg, vb.pp("conv1"))?;
                let conv2 =
                    candle_nn::conv2d(CONV1_CHANNELS, CONV2_CHANNELS, KERNEL, cfg, vb.pp("conv2"))?;
                // Two 2x2 pools with same-padding convs.
                let flat = CONV2_CHANNELS * (shape.height / 4) * (shape.width / 4);
                Ok(Self::Cnn {
                    conv1,
                    conv2,
                    fc1: candle_nn::linear(flat, spec.hidden_dim, vb.pp("fc1"))?,
                    fc2: candle_nn::linear(spec.hidden_dim, spec.num_classes, vb.pp("fc2"))?,
                    shape,
                })
            }
        }
    }
}

impl Module for Network {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        match self {
            Self::Mlp { fc1, fc2 } => fc1.forward(xs)?.relu()?.apply(fc2),
            Self::Softmax { fc } => fc.forward(xs),
            Self::Cnn {
                conv1,
                conv2,
                fc1,
                fc2,
                shape,
            } => {
                let batch = xs.dim(0)?;
                xs.reshape((batch, shape.channels, shape.height, shape.width))?
                    .apply(conv1)?
                    .relu()?
                    .max_pool2d(2)?
                    .apply(conv2)?
                    .relu()?
                    .max_pool2d(2)?
                    .flatten_from(1)?
                    .apply(fc1)?
                    .relu()?
                    .apply(fc2)
            }
        }
    }
}

/// A trainable classifier: layers plus the variables backing them.
pub struct Classifier {
    network: Network,
    varmap: VarMap,
    spec: ModelSpec,
}

impl Classifier {
    /// Create a classifier with freshly initialised weights.
    pub fn new_trainable(spec: ModelSpec, device: &Device) -> Result<Self> {
        spec.check()?;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let network = Network::build(&spec, vb)
            .model_ctx(&format!("Failed to create {} network", spec.architecture))?;
        Ok(Self {
            network,
            varmap,
            spec,
        })
    }

    /// Load a checkpoint written by [`Classifier::save`].
    ///
    /// Returns [`MiaError::NotFound`] when either the weights or the
    /// hyperparameter sidecar is missing.
    pub fn load(path: &Path, device: &Device) -> Result<(Self, CheckpointMeta)> {
        let meta_path = meta_path(path);
        for p in [path, meta_path.as_path()] {
            if !p.exists() {
                return Err(MiaError::NotFound(p.to_path_buf()));
            }
        }
        let meta: CheckpointMeta = serde_json::from_str(&std::fs::read_to_string(&meta_path)?)?;
        let mut model = Self::new_trainable(meta.spec.clone(), device)?;
        model
            .varmap
            .load(path)
            .model_ctx(&format!("Failed to load weights from {}", path.display()))?;
        Ok((model, meta))
    }

    /// Persist weights as safetensors and hyperparameters as a JSON sidecar.
    pub fn save(&self, path: &Path, params: &TrainParams) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        self.varmap
            .save(path)
            .model_ctx(&format!("Failed to save model to {}", path.display()))?;
        let meta = CheckpointMeta {
            spec: self.spec.clone(),
            params: params.clone(),
        };
        std::fs::write(meta_path(path), serde_json::to_string_pretty(&meta)?)?;
        Ok(())
    }

    /// Raw logits for a `[batch, input_dim]` input.
    pub fn forward_logits(&self, xs: &Tensor) -> Result<Tensor> {
        self.network
            .forward(xs)
            .model_ctx(&format!("{} forward failed", self.spec.architecture))
    }

    /// Softmax confidence vectors for a `[batch, input_dim]` input.
    pub fn predict_proba(&self, xs: &Tensor) -> Result<Tensor> {
        let logits = self.forward_logits(xs)?;
        candle_nn::ops::softmax(&logits, candle_core::D::Minus1).model_ctx("softmax failed")
    }

    /// Arg-max class for every row of a `[batch, input_dim]` input.
    pub fn predict_classes(&self, xs: &Tensor) -> Result<Vec<i64>> {
        let preds: Vec<u32> = self
            .forward_logits(xs)?
            .argmax(candle_core::D::Minus1)
            .and_then(|t| t.to_vec1())
            .model_ctx("argmax failed")?;
        Ok(preds.into_iter().map(i64::from).collect())
    }

    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }
}

/// Sidecar path holding the [`CheckpointMeta`] for a weights file.
pub fn meta_path(weights: &Path) -> PathBuf {
    weights.with_extension("json")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn params(architecture: Architecture) -> TrainParams {
        TrainParams {
            architecture,
            hidden_dim: 8,
            ..TrainParams::target_default()
        }
    }

    #[test]
    fn test_mlp_output_shape() {
        let device = Device::Cpu;
        let spec = ModelSpec::for_images(&params(Architecture::Mlp), InputShape::flat(12), 5);
        let model = Classifier::new_trainable(spec, &device).unwrap();
        let xs = Tensor::zeros((3, 12), DType::F32, &device).unwrap();
        let logits = model.forward_logits(&xs).unwrap();
        assert_eq!(logits.dims(), &[3, 5]);
    }

    #[test]
    fn test_cnn_output_shape() {
        let device = Device::Cpu;
        let shape = InputShape {
            channels: 3,
            height: 8,
            width: 8,
        };
        let spec = ModelSpec::for_images(&params(Architecture::Cnn), shape, 10);
        let model = Classifier::new_trainable(spec, &device).unwrap();
        let xs = Tensor::zeros((2, 192), DType::F32, &device).unwrap();
        let logits = model.forward_logits(&xs).unwrap();
        assert_eq!(logits.dims(), &[2, 10]);
    }

    #[test]
    fn test_cnn_rejects_flat_input() {
        let spec = ModelSpec::for_attack(&params(Architecture::Cnn), 10);
        assert!(matches!(
            Classifier::new_trainable(spec, &Device::Cpu),
            Err(MiaError::Config(_))
        ));
    }

    #[test]
    fn test_predict_proba_rows_sum_to_one() {
        let device = Device::Cpu;
        let spec = ModelSpec::for_attack(&params(Architecture::Softmax), 4);
        let model = Classifier::new_trainable(spec, &device).unwrap();
        let xs = Tensor::ones((3, 4), DType::F32, &device).unwrap();
        let probs: Vec<Vec<f32>> = model.predict_proba(&xs).unwrap().to_vec2().unwrap();
        for row in probs {
            assert_eq!(row.len(), 2);
            assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }
        let classes = model.predict_classes(&xs).unwrap();
        assert!(classes.iter().all(|&c| c == 0 || c == 1));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.safetensors");
        let device = Device::Cpu;
        let p = params(Architecture::Mlp);
        let spec = ModelSpec::for_images(&p, InputShape::flat(6), 3);
        let model = Classifier::new_trainable(spec.clone(), &device).unwrap();
        model.save(&path, &p).unwrap();
        assert!(meta_path(&path).exists());

        let (loaded, meta) = Classifier::load(&path, &device).unwrap();
        assert_eq!(meta.spec, spec);
        assert_eq!(meta.params, p);

        let xs = Tensor::ones((2, 6), DType::F32, &device).unwrap();
        let a: Vec<Vec<f32>> = model.forward_logits(&xs).unwrap().to_vec2().unwrap();
        let b: Vec<Vec<f32>> = loaded.forward_logits(&xs).unwrap().to_vec2().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_load_missing_checkpoint() {
        let result = Classifier::load(Path::new("/nonexistent/model.safetensors"), &Device::Cpu);
        assert!(matches!(result, Err(MiaError::NotFound(_))));
    }
}
