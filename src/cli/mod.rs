// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap, builds the data source and the
// object store client, and hands off to Layer 2.
//
//   1. `train`   - fit, evaluate and publish the model
//   2. `predict` - score a table with a saved model
//
// Status lines go to stderr through tracing; prediction CSV goes
// to stdout.

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, PredictArgs, TrainArgs};

use crate::application::train_use_case::{StorageBackend, TrainConfig};
use crate::domain::traits::ObjectStore;
use crate::infra::publisher::UploadStatus;
use crate::infra::storage::{GcsBucket, LocalBucket};

#[derive(Parser, Debug)]
#[command(
    name = "bike-demand",
    version = "0.1.0",
    about = "Train a random forest on hourly bike-share counts and publish the model."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
        }
    }
}

/// The upload client for this run, or `None` when uploads are skipped
pub fn build_object_store(cfg: &TrainConfig) -> Option<Box<dyn ObjectStore>> {
    if cfg.skip_upload {
        return None;
    }
    let store: Box<dyn ObjectStore> = match cfg.storage {
        StorageBackend::Gcs => {
            Box::new(GcsBucket::new(&cfg.bucket).with_bearer_token(cfg.gcs_token.clone()))
        }
        StorageBackend::Local => Box::new(LocalBucket::new(&cfg.local_bucket_dir, &cfg.bucket)),
    };
    Some(store)
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;
    use crate::data::loader::CsvLoader;

    let cfg: TrainConfig = args.into();
    tracing::info!("Starting training on data at: {}", cfg.data);

    let source = CsvLoader::new(&cfg.data).with_bearer_token(cfg.gcs_token.clone());
    let remote = build_object_store(&cfg);

    let use_case = TrainUseCase::new(cfg);
    let model    = use_case.fit_and_evaluate(&source)?;
    // RMSE goes out before publish, whatever the upload outcome
    eprintln!("RMSE: {}", model.report().rmse);

    let summary = use_case.publish(model, remote.as_deref())?;

    match &summary.published.upload {
        UploadStatus::Uploaded { uri } => tracing::info!("Published {}", uri),
        UploadStatus::Skipped => tracing::info!(
            "Upload skipped (--skip-upload); model at '{}'",
            summary.published.local_path.display()
        ),
    }
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;
    use crate::data::loader::CsvLoader;

    let use_case = PredictUseCase::new(&args.model)?;
    let source   = CsvLoader::new(&args.data).with_bearer_token(args.gcs_token);

    let stdout = std::io::stdout();
    use_case.run(&source, stdout.lock())?;
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_upload_builds_no_store() {
        let cfg = TrainConfig { skip_upload: true, ..TrainConfig::default() };
        assert!(build_object_store(&cfg).is_none());
    }

    #[test]
    fn test_store_follows_backend() {
        let gcs = build_object_store(&TrainConfig::default()).unwrap();
        assert_eq!(gcs.bucket(), "sid-vertex-mlops");

        let cfg   = TrainConfig { storage: StorageBackend::Local, ..TrainConfig::default() };
        let local = build_object_store(&cfg).unwrap();
        assert_eq!(local.bucket(), "sid-vertex-mlops");
    }
}
