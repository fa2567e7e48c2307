//! CLI entry point for the membership inference pipeline.
//!
//! Subcommands:
//!   run     -- Train target + shadow models, build attack data, train attack models
//!   attack  -- Train attack models on attack data saved by a previous `run`
//!   train   -- Train a single classifier with a validation hold-out
//!
//! Usage:
//!   mia run --dataset mnist --data-dir data/mnist --n-shadow 10
//!   mia run --config experiments/cifar.yaml --target-epochs 50
//!   mia attack --output-dir attack_model --attack-epochs 20
//!   mia train --dataset fashion_mnist --data-dir data/fashion --epochs 20

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use mia_core::{Architecture, DatasetKind, ExperimentConfig, LoggingConfig, TrainParams};
use mia_pipeline::attack::pipeline::{run_attack_only, run_full_attack};
use mia_pipeline::config::load_or_default;
use mia_pipeline::datasets::load_dataset;
use mia_pipeline::training::standalone::train_standalone;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mia", about = "Shadow-model membership inference attack")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Full attack: target model, shadow models, then attack models.
    Run(ExperimentArgs),

    /// Attack models only, from attack data saved in the output directory.
    Attack(ExperimentArgs),

    /// Train one classifier with a validation split and report test accuracy.
    Train(TrainArgs),
}

/// Experiment flags. Each one overrides the matching field of the YAML
/// config (or of the defaults when no config is given).
#[derive(Args)]
struct ExperimentArgs {
    /// YAML experiment configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dataset: mnist, fashion_mnist, cifar10, or synthetic.
    #[arg(long)]
    dataset: Option<DatasetKind>,

    /// Directory holding the raw dataset files.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory for attack data and checkpoints.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Random seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Training-set size of the target and each shadow model.
    #[arg(long)]
    train_size: Option<usize>,

    /// Held-out size of the target model.
    #[arg(long)]
    test_size: Option<usize>,

    /// Number of shadow models.
    #[arg(long)]
    n_shadow: Option<usize>,

    /// Members kept per non-member when balancing attack data.
    #[arg(long)]
    balance_ratio: Option<usize>,

    /// Persist checkpoints and attack data (true/false).
    #[arg(long)]
    save_model: Option<bool>,

    #[arg(long)]
    target_epochs: Option<usize>,
    #[arg(long)]
    target_batch_size: Option<usize>,
    #[arg(long)]
    target_learning_rate: Option<f64>,
    #[arg(long, alias = "target-fc-dim-hidden")]
    target_hidden_dim: Option<usize>,
    /// Target/shadow architecture: mlp (alias rl), softmax, or cnn.
    #[arg(long, alias = "target-model")]
    target_architecture: Option<Architecture>,

    #[arg(long)]
    attack_epochs: Option<usize>,
    #[arg(long)]
    attack_batch_size: Option<usize>,
    #[arg(long)]
    attack_learning_rate: Option<f64>,
    #[arg(long, alias = "attack-fc-dim-hidden")]
    attack_hidden_dim: Option<usize>,
    /// Attack architecture: mlp (alias rl) or softmax.
    #[arg(long, alias = "attack-model")]
    attack_architecture: Option<Architecture>,
}

impl ExperimentArgs {
    fn into_config(self) -> anyhow::Result<ExperimentConfig> {
        let mut config = load_or_default(self.config.as_deref())?;
        macro_rules! set {
            ($($field:expr => $value:expr),* $(,)?) => {
                $(if let Some(v) = $value { $field = v; })*
            };
        }
        set! {
            config.dataset => self.dataset,
            config.data_dir => self.data_dir,
            config.output_dir => self.output_dir,
            config.seed => self.seed,
            config.train_size => self.train_size,
            config.test_size => self.test_size,
            config.n_shadow => self.n_shadow,
            config.balance_ratio => self.balance_ratio,
            config.save_model => self.save_model,
            config.target.epochs => self.target_epochs,
            config.target.batch_size => self.target_batch_size,
            config.target.learning_rate => self.target_learning_rate,
            config.target.hidden_dim => self.target_hidden_dim,
            config.target.architecture => self.target_architecture,
            config.attack.epochs => self.attack_epochs,
            config.attack.batch_size => self.attack_batch_size,
            config.attack.learning_rate => self.attack_learning_rate,
            config.attack.hidden_dim => self.attack_hidden_dim,
            config.attack.architecture => self.attack_architecture,
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args)]
struct TrainArgs {
    /// Dataset: mnist, fashion_mnist, cifar10, or synthetic.
    #[arg(long, default_value = "mnist")]
    dataset: DatasetKind,

    /// Directory holding the raw dataset files.
    #[arg(long, default_value = "data/mnist")]
    data_dir: PathBuf,

    /// Directory for the best-validation checkpoint.
    #[arg(long, default_value = "save_model")]
    output_dir: PathBuf,

    #[arg(long, default_value = "20")]
    epochs: usize,

    #[arg(long, default_value = "128")]
    batch_size: usize,

    #[arg(long, default_value = "0.001")]
    learning_rate: f64,

    #[arg(long, default_value = "256")]
    hidden_dim: usize,

    /// mlp (alias rl), softmax, or cnn.
    #[arg(long, default_value = "mlp")]
    architecture: Architecture,

    /// Fraction of training rows held out for validation.
    #[arg(long, default_value = "0.1")]
    val_ratio: f64,

    #[arg(long, default_value = "171717")]
    seed: u64,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => {
            let config = args.into_config()?;
            init_tracing(&config.logging);
            let device = mia_models::select_device();
            let dataset = load_dataset(config.dataset, &config.data_dir, &device, config.seed)
                .with_context(|| format!("loading {}", config.dataset))?;
            let run = run_full_attack(&config, &dataset)?;
            println!("{}", run.report);
        }
        Command::Attack(args) => {
            let config = args.into_config()?;
            init_tracing(&config.logging);
            let device = mia_models::select_device();
            let run = run_attack_only(&config, &device)?;
            println!("{}", run.report);
        }
        Command::Train(args) => {
            init_tracing(&LoggingConfig::default());
            let params = TrainParams {
                epochs: args.epochs,
                batch_size: args.batch_size,
                learning_rate: args.learning_rate,
                weight_decay: 1e-4,
                hidden_dim: args.hidden_dim,
                architecture: args.architecture,
            };
            let device = mia_models::select_seeded_device(args.seed);
            let dataset = load_dataset(args.dataset, &args.data_dir, &device, args.seed)
                .with_context(|| format!("loading {}", args.dataset))?;
            let report = train_standalone(
                &dataset,
                &params,
                args.val_ratio,
                &args.output_dir,
                args.seed,
            )?;
            for m in &report.history {
                println!(
                    "  epoch {:3} | train_loss={} val_acc={}",
                    m.epoch,
                    m.train_loss
                        .map(|l| format!("{l:.4}"))
                        .unwrap_or_else(|| "-".to_string()),
                    m.heldout_accuracy
                        .map(|a| format!("{a:.4}"))
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
            println!("Test Accuracy: {:.4}", report.test_accuracy);
            println!("Best model saved to: {}", report.checkpoint.display());
            println!("Model Hash: {}", report.fingerprint);
        }
    }

    Ok(())
}
