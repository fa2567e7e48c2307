//! Core types, configuration, and errors for shadow-model membership inference
//!
//! This crate holds the data model shared by the model and pipeline crates:
//! dataset and architecture selectors, confidence records and the attack
//! splits they aggregate into, experiment configuration, and the error type.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Membership labels
// ---------------------------------------------------------------------------

/// Label assigned to examples that were part of a model's training set.
pub const MEMBER: i32 = 1;

/// Label assigned to examples held out from a model's training set.
pub const NON_MEMBER: i32 = 0;

// ---------------------------------------------------------------------------
// Dataset & architecture selectors
// ---------------------------------------------------------------------------

/// Shape of a single input example before flattening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputShape {
    /// Number of colour channels.
    pub channels: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Image width in pixels.
    pub width: usize,
}

impl InputShape {
    /// A flat feature vector of `dim` values (no spatial structure).
    pub fn flat(dim: usize) -> Self {
        Self {
            channels: 1,
            height: 1,
            width: dim,
        }
    }

    /// Number of values per example once flattened.
    pub fn flat_dim(&self) -> usize {
        self.channels * self.height * self.width
    }

    /// Whether the shape carries real spatial structure (usable by a CNN).
    pub fn is_spatial(&self) -> bool {
        self.height > 1 && self.width > 1
    }
}

/// Image-classification datasets the pipeline can attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// MNIST handwritten digits (IDX files).
    Mnist,
    /// Fashion-MNIST clothing images (IDX files).
    FashionMnist,
    /// CIFAR-10 colour images (binary batches).
    Cifar10,
    /// Seeded, in-memory class clusters for smoke runs.
    Synthetic,
}

impl DatasetKind {
    /// Per-example input shape.
    pub fn input_shape(self) -> InputShape {
        match self {
            Self::Mnist | Self::FashionMnist => InputShape {
                channels: 1,
                height: 28,
                width: 28,
            },
            Self::Cifar10 => InputShape {
                channels: 3,
                height: 32,
                width: 32,
            },
            Self::Synthetic => InputShape {
                channels: 1,
                height: 4,
                width: 4,
            },
        }
    }

    /// Number of target classes.
    pub fn num_classes(self) -> usize {
        match self {
            Self::Synthetic => 4,
            _ => 10,
        }
    }
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mnist => write!(f, "mnist"),
            Self::FashionMnist => write!(f, "fashion_mnist"),
            Self::Cifar10 => write!(f, "cifar10"),
            Self::Synthetic => write!(f, "synthetic"),
        }
    }
}

impl std::str::FromStr for DatasetKind {
    type Err = MiaError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "mnist" => Ok(Self::Mnist),
            "fashion_mnist" | "fashionmnist" => Ok(Self::FashionMnist),
            "cifar10" | "cifar_10" => Ok(Self::Cifar10),
            "synthetic" => Ok(Self::Synthetic),
            _ => Err(MiaError::Config(format!("unsupported dataset: {s}"))),
        }
    }
}

/// Trainable model architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// One hidden fully-connected layer with ReLU.
    #[serde(alias = "rl", alias = "nn")]
    Mlp,
    /// Multinomial logistic regression (single linear layer).
    Softmax,
    /// Two conv/pool stages followed by a hidden fully-connected layer.
    Cnn,
}

impl std::fmt::Display for Architecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mlp => write!(f, "mlp"),
            Self::Softmax => write!(f, "softmax"),
            Self::Cnn => write!(f, "cnn"),
        }
    }
}

impl std::str::FromStr for Architecture {
    type Err = MiaError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mlp" | "rl" | "nn" => Ok(Self::Mlp),
            "softmax" => Ok(Self::Softmax),
            "cnn" => Ok(Self::Cnn),
            _ => Err(MiaError::Config(format!("unsupported architecture: {s}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Confidence records & attack splits
// ---------------------------------------------------------------------------

/// One model output observed during a membership-labelled inference pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceRecord {
    /// Softmax confidence vector over the target classes.
    pub confidences: Vec<f32>,
    /// [`MEMBER`] or [`NON_MEMBER`].
    pub membership: i32,
    /// Ground-truth class of the example.
    pub true_class: i32,
}

/// Column-oriented collection of [`ConfidenceRecord`]s.
///
/// `features` is row-major with `feature_dim` values per row; `labels` and
/// `classes` hold one entry per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttackSplit {
    pub features: Vec<f32>,
    pub feature_dim: usize,
    pub labels: Vec<i32>,
    pub classes: Vec<i32>,
}

impl AttackSplit {
    /// Create an empty split whose rows will have `feature_dim` values.
    pub fn new(feature_dim: usize) -> Self {
        Self {
            features: Vec::new(),
            feature_dim,
            labels: Vec::new(),
            classes: Vec::new(),
        }
    }

    /// Build a split from raw columns, checking that they agree on row count.
    pub fn from_parts(
        features: Vec<f32>,
        feature_dim: usize,
        labels: Vec<i32>,
        classes: Vec<i32>,
    ) -> Result<Self> {
        if labels.len() != classes.len() {
            return Err(MiaError::Data(format!(
                "label/class length mismatch: {} vs {}",
                labels.len(),
                classes.len()
            )));
        }
        if features.len() != labels.len() * feature_dim {
            return Err(MiaError::Data(format!(
                "feature buffer holds {} values, expected {} rows x {} dims",
                features.len(),
                labels.len(),
                feature_dim
            )));
        }
        Ok(Self {
            features,
            feature_dim,
            labels,
            classes,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the split holds no rows.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Append one record.
    pub fn push(&mut self, record: &ConfidenceRecord) -> Result<()> {
        if record.confidences.len() != self.feature_dim {
            return Err(MiaError::Data(format!(
                "record has {} confidences, split expects {}",
                record.confidences.len(),
                self.feature_dim
            )));
        }
        self.features.extend_from_slice(&record.confidences);
        self.labels.push(record.membership);
        self.classes.push(record.true_class);
        Ok(())
    }

    /// Append every row of `other`.
    pub fn extend(&mut self, other: &AttackSplit) -> Result<()> {
        if other.is_empty() {
            return Ok(());
        }
        if self.is_empty() && self.feature_dim == 0 {
            self.feature_dim = other.feature_dim;
        }
        if other.feature_dim != self.feature_dim {
            return Err(MiaError::Data(format!(
                "cannot concatenate splits of width {} and {}",
                self.feature_dim, other.feature_dim
            )));
        }
        self.features.extend_from_slice(&other.features);
        self.labels.extend_from_slice(&other.labels);
        self.classes.extend_from_slice(&other.classes);
        Ok(())
    }

    /// Feature row `i`.
    pub fn row(&self, i: usize) -> &[f32] {
        &self.features[i * self.feature_dim..(i + 1) * self.feature_dim]
    }

    /// New split containing the given rows, in order (duplicates allowed).
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut features = Vec::with_capacity(indices.len() * self.feature_dim);
        let mut labels = Vec::with_capacity(indices.len());
        let mut classes = Vec::with_capacity(indices.len());
        for &i in indices {
            features.extend_from_slice(self.row(i));
            labels.push(self.labels[i]);
            classes.push(self.classes[i]);
        }
        Self {
            features,
            feature_dim: self.feature_dim,
            labels,
            classes,
        }
    }

    /// Row indices whose true class equals `class`.
    pub fn indices_of_class(&self, class: i32) -> Vec<usize> {
        self.classes
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == class)
            .map(|(i, _)| i)
            .collect()
    }

    /// Row indices whose membership label equals `label`.
    pub fn indices_of_label(&self, label: i32) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, &l)| l == label)
            .map(|(i, _)| i)
            .collect()
    }

    /// Number of rows carrying membership label `label`.
    pub fn count_label(&self, label: i32) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }

    /// Distinct true classes, ascending.
    pub fn unique_classes(&self) -> Vec<i32> {
        self.classes
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Attack training data (from shadow models) and test data (from the target).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttackDataset {
    pub train: AttackSplit,
    pub test: AttackSplit,
}

impl AttackDataset {
    /// Whether both splits hold at least one row.
    pub fn is_populated(&self) -> bool {
        !self.train.is_empty() && !self.test.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Configuration types
// ---------------------------------------------------------------------------

/// Hyperparameters for training one classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainParams {
    /// Number of passes over the training subset.
    pub epochs: usize,
    /// Mini-batch size.
    pub batch_size: usize,
    /// AdamW learning rate.
    pub learning_rate: f64,
    /// AdamW weight decay.
    #[serde(default = "default_weight_decay")]
    pub weight_decay: f64,
    /// Width of the hidden fully-connected layer.
    pub hidden_dim: usize,
    /// Model architecture.
    pub architecture: Architecture,
}

/// A `target:` / `attack:` block in which every field is optional.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TrainParamsPatch {
    epochs: Option<usize>,
    batch_size: Option<usize>,
    learning_rate: Option<f64>,
    weight_decay: Option<f64>,
    hidden_dim: Option<usize>,
    architecture: Option<Architecture>,
}

impl TrainParamsPatch {
    fn apply(self, base: TrainParams) -> TrainParams {
        TrainParams {
            epochs: self.epochs.unwrap_or(base.epochs),
            batch_size: self.batch_size.unwrap_or(base.batch_size),
            learning_rate: self.learning_rate.unwrap_or(base.learning_rate),
            weight_decay: self.weight_decay.unwrap_or(base.weight_decay),
            hidden_dim: self.hidden_dim.unwrap_or(base.hidden_dim),
            architecture: self.architecture.unwrap_or(base.architecture),
        }
    }
}

fn deserialize_target_params<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<TrainParams, D::Error> {
    Ok(TrainParamsPatch::deserialize(deserializer)?.apply(TrainParams::target_default()))
}

fn deserialize_attack_params<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<TrainParams, D::Error> {
    Ok(TrainParamsPatch::deserialize(deserializer)?.apply(TrainParams::attack_default()))
}

fn default_weight_decay() -> f64 {
    1e-4
}

impl TrainParams {
    /// Defaults used for target and shadow models.
    pub fn target_default() -> Self {
        Self {
            epochs: 100,
            batch_size: 10,
            learning_rate: 0.01,
            weight_decay: default_weight_decay(),
            hidden_dim: 50,
            architecture: Architecture::Mlp,
        }
    }

    /// Defaults used for the per-class attack models.
    pub fn attack_default() -> Self {
        Self {
            epochs: 5,
            ..Self::target_default()
        }
    }

    fn validate(&self, role: &str) -> Result<()> {
        if self.batch_size == 0 {
            return Err(MiaError::Config(format!("{role}.batch_size must be > 0")));
        }
        if self.hidden_dim == 0 {
            return Err(MiaError::Config(format!("{role}.hidden_dim must be > 0")));
        }
        if !(self.learning_rate > 0.0) {
            return Err(MiaError::Config(format!(
                "{role}.learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.weight_decay < 0.0 {
            return Err(MiaError::Config(format!(
                "{role}.weight_decay must be non-negative"
            )));
        }
        Ok(())
    }
}

/// Full configuration of one attack experiment.
///
/// Fields missing from a config file take their [`Default`] values; a
/// partial `target` or `attack` block fills its missing fields from
/// [`TrainParams::target_default`] or [`TrainParams::attack_default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Dataset the target and shadow models are trained on.
    pub dataset: DatasetKind,
    /// Directory holding the raw dataset files.
    pub data_dir: PathBuf,
    /// Directory for attack data and model checkpoints.
    pub output_dir: PathBuf,
    /// Seed for every sampling decision in the run.
    pub seed: u64,
    /// Training-set size of the target and of every shadow model.
    pub train_size: usize,
    /// Held-out set size of the target model.
    pub test_size: usize,
    /// Number of shadow models.
    pub n_shadow: usize,
    /// Shadow held-out size as a fraction of `train_size`.
    #[serde(default = "default_shadow_test_fraction")]
    pub shadow_test_fraction: f64,
    /// Members sampled per non-member when balancing attack data.
    #[serde(default = "default_balance_ratio")]
    pub balance_ratio: usize,
    /// Persist checkpoints and attack data.
    pub save_model: bool,
    /// Target and shadow model hyperparameters.
    #[serde(deserialize_with = "deserialize_target_params")]
    pub target: TrainParams,
    /// Attack model hyperparameters.
    #[serde(deserialize_with = "deserialize_attack_params")]
    pub attack: TrainParams,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_shadow_test_fraction() -> f64 {
    0.3
}

fn default_balance_ratio() -> usize {
    2
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetKind::Mnist,
            data_dir: PathBuf::from("data/mnist"),
            output_dir: PathBuf::from("attack_model"),
            seed: 171_717,
            train_size: 10_000,
            test_size: 500,
            n_shadow: 1,
            shadow_test_fraction: default_shadow_test_fraction(),
            balance_ratio: default_balance_ratio(),
            save_model: true,
            target: TrainParams::target_default(),
            attack: TrainParams::attack_default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ExperimentConfig {
    /// Number of held-out examples drawn for each shadow model.
    pub fn shadow_test_size(&self) -> usize {
        (self.train_size as f64 * self.shadow_test_fraction).round() as usize
    }

    /// Check the configuration for values that cannot produce a run.
    pub fn validate(&self) -> Result<()> {
        self.target.validate("target")?;
        self.attack.validate("attack")?;
        if self.attack.architecture == Architecture::Cnn {
            return Err(MiaError::Config(
                "attack models consume confidence vectors; cnn is not applicable".to_string(),
            ));
        }
        if self.train_size == 0 || self.test_size == 0 {
            return Err(MiaError::Config(
                "train_size and test_size must be > 0".to_string(),
            ));
        }
        if !(self.shadow_test_fraction > 0.0 && self.shadow_test_fraction <= 1.0) {
            return Err(MiaError::Config(format!(
                "shadow_test_fraction must be in (0, 1], got {}",
                self.shadow_test_fraction
            )));
        }
        if self.balance_ratio == 0 {
            return Err(MiaError::Config("balance_ratio must be >= 1".to_string()));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format: `text` (human-readable) or `json` (structured).
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Core error types.
#[derive(thiserror::Error, Debug)]
pub enum MiaError {
    /// Invalid or unsupported configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A sample or partition asked for more indices than the pool holds.
    #[error("Bounds error: requested {requested} items from a pool of {available}")]
    Bounds {
        /// Number of items requested.
        requested: usize,
        /// Number of items available.
        available: usize,
    },

    /// A required file does not exist.
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Tensor runtime or model construction failure.
    #[error("Model error: {0}")]
    Model(String),

    /// Malformed or inconsistent data.
    #[error("Data error: {0}")]
    Data(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization / deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias for `std::result::Result<T, MiaError>`.
pub type Result<T> = std::result::Result<T, MiaError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn record(conf: [f32; 2], membership: i32, class: i32) -> ConfidenceRecord {
        ConfidenceRecord {
            confidences: conf.to_vec(),
            membership,
            true_class: class,
        }
    }

    #[test]
    fn test_dataset_kind_parse() {
        assert_eq!("mnist".parse::<DatasetKind>().unwrap(), DatasetKind::Mnist);
        assert_eq!(
            "Fashion-MNIST".parse::<DatasetKind>().unwrap(),
            DatasetKind::FashionMnist
        );
        assert_eq!("cifar10".parse::<DatasetKind>().unwrap(), DatasetKind::Cifar10);
    }

    #[test]
    fn test_unsupported_dataset_is_config_error() {
        let err = "imagenet".parse::<DatasetKind>().unwrap_err();
        assert!(matches!(err, MiaError::Config(_)));
    }

    #[test]
    fn test_architecture_aliases() {
        assert_eq!("rl".parse::<Architecture>().unwrap(), Architecture::Mlp);
        assert_eq!("MLP".parse::<Architecture>().unwrap(), Architecture::Mlp);
        assert_eq!(
            "softmax".parse::<Architecture>().unwrap(),
            Architecture::Softmax
        );
        assert!("transformer".parse::<Architecture>().is_err());
    }

    #[test]
    fn test_input_shapes() {
        assert_eq!(DatasetKind::Mnist.input_shape().flat_dim(), 784);
        assert_eq!(DatasetKind::Cifar10.input_shape().flat_dim(), 3072);
        assert!(DatasetKind::Cifar10.input_shape().is_spatial());
        assert!(!InputShape::flat(10).is_spatial());
    }

    #[test]
    fn test_split_push_and_select() {
        let mut split = AttackSplit::new(2);
        split.push(&record([0.9, 0.1], MEMBER, 0)).unwrap();
        split.push(&record([0.2, 0.8], NON_MEMBER, 1)).unwrap();
        split.push(&record([0.6, 0.4], MEMBER, 1)).unwrap();

        assert_eq!(split.len(), 3);
        assert_eq!(split.count_label(MEMBER), 2);
        assert_eq!(split.unique_classes(), vec![0, 1]);
        assert_eq!(split.indices_of_class(1), vec![1, 2]);

        let picked = split.select(&[2, 2, 0]);
        assert_eq!(picked.len(), 3);
        assert_eq!(picked.row(0), &[0.6, 0.4]);
        assert_eq!(picked.row(2), &[0.9, 0.1]);
        assert_eq!((picked.labels[2], picked.classes[2]), (MEMBER, 0));
    }

    #[test]
    fn test_split_rejects_wrong_width() {
        let mut split = AttackSplit::new(3);
        assert!(split.push(&record([0.5, 0.5], MEMBER, 0)).is_err());
    }

    #[test]
    fn test_split_extend_adopts_width() {
        let mut acc = AttackSplit::default();
        let mut other = AttackSplit::new(2);
        other.push(&record([0.5, 0.5], NON_MEMBER, 3)).unwrap();
        acc.extend(&other).unwrap();
        acc.extend(&other).unwrap();
        assert_eq!(acc.feature_dim, 2);
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn test_from_parts_checks_lengths() {
        assert!(AttackSplit::from_parts(vec![0.0; 4], 2, vec![1, 0], vec![0, 0]).is_ok());
        assert!(AttackSplit::from_parts(vec![0.0; 5], 2, vec![1, 0], vec![0, 0]).is_err());
        assert!(AttackSplit::from_parts(vec![0.0; 4], 2, vec![1, 0], vec![0]).is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ExperimentConfig::default();
        config.validate().unwrap();
        assert_eq!(config.shadow_test_size(), 3000);
        assert_eq!(config.balance_ratio, 2);
    }

    #[test]
    fn test_config_rejects_cnn_attack() {
        let mut config = ExperimentConfig::default();
        config.attack.architecture = Architecture::Cnn;
        assert!(matches!(config.validate(), Err(MiaError::Config(_))));
    }

    #[test]
    fn test_config_rejects_zero_batch() {
        let mut config = ExperimentConfig::default();
        config.target.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_yaml_defaults_optional_fields() {
        let yaml = r#"
dataset: fashion_mnist
data_dir: data/fashion
output_dir: out
seed: 7
train_size: 100
test_size: 20
n_shadow: 2
save_model: false
target:
  epochs: 3
  batch_size: 10
  learning_rate: 0.01
  hidden_dim: 32
  architecture: rl
attack:
  epochs: 2
  batch_size: 10
  learning_rate: 0.01
  hidden_dim: 16
  architecture: softmax
"#;
        let config: ExperimentConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.dataset, DatasetKind::FashionMnist);
        assert_eq!(config.target.architecture, Architecture::Mlp);
        assert_eq!(config.attack.architecture, Architecture::Softmax);
        assert!((config.shadow_test_fraction - 0.3).abs() < 1e-12);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.shadow_test_size(), 30);
    }

    #[test]
    fn test_config_yaml_partial_param_blocks() {
        let yaml = "target:\n  epochs: 3\nattack:\n  architecture: softmax\n";
        let config: ExperimentConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.target.epochs, 3);
        assert_eq!(config.target.batch_size, 10);
        assert_eq!(config.target.hidden_dim, 50);
        assert_eq!(config.attack.architecture, Architecture::Softmax);
        assert_eq!(config.attack.epochs, 5);
        assert_eq!(config.dataset, DatasetKind::Mnist);
        config.validate().unwrap();
    }

    #[test]
    fn test_config_yaml_rejects_unknown_param() {
        let yaml = "target:\n  epoch: 3\n";
        assert!(serde_yaml::from_str::<ExperimentConfig>(yaml).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = MiaError::Bounds {
            requested: 10,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "Bounds error: requested 10 items from a pool of 3"
        );
        let err = MiaError::NotFound(PathBuf::from("/tmp/x.safetensors"));
        assert!(err.to_string().contains("/tmp/x.safetensors"));
    }
}
