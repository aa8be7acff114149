//! Train the heart disease classifier from a labelled CSV and write the
//! artifacts the server loads.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use heartrisk::classifier::TrainingParams;
use heartrisk::training::{self, Dataset, TrainOptions};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Labelled CSV dataset
    #[arg(long, default_value = "heart.csv")]
    data: PathBuf,

    /// Directory for model.json and metadata.json
    #[arg(long, default_value = "artifacts")]
    out_dir: PathBuf,

    /// Target column (0/1)
    #[arg(long, default_value = "HeartDisease")]
    target: String,

    /// Fraction of rows held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    test_size: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[arg(long, default_value_t = TrainingParams::default().epochs)]
    epochs: usize,

    #[arg(long, default_value_t = TrainingParams::default().learning_rate)]
    learning_rate: f64,

    /// L2 penalty on the weights
    #[arg(long, default_value_t = TrainingParams::default().l2)]
    l2: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "heartrisk=info".into()),
        )
        .init();

    let args = Args::parse();

    tracing::info!("Loading dataset from {}", args.data.display());
    let dataset = Dataset::from_path(&args.data, &args.target)
        .with_context(|| format!("failed to load {}", args.data.display()))?;
    tracing::info!(
        rows = dataset.len(),
        features = dataset.feature_names.len(),
        "Features: {:?}",
        dataset.feature_names
    );

    let options = TrainOptions {
        test_size: args.test_size,
        seed: args.seed,
        params: TrainingParams {
            epochs: args.epochs,
            learning_rate: args.learning_rate,
            l2: args.l2,
        },
    };
    let outcome = training::train(&dataset, &options).context("training failed")?;

    tracing::info!(
        train = outcome.train_rows,
        test = outcome.test_rows,
        "Accuracy: {:.4}",
        outcome.accuracy()
    );
    tracing::info!("Classification report:\n{}", outcome.report);

    let paths = training::write_artifacts(&args.out_dir, &dataset, &outcome)
        .context("failed to write artifacts")?;
    tracing::info!("Model saved to {}", paths.model.display());
    tracing::info!("Metadata saved to {}", paths.metadata.display());

    Ok(())
}
