// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `predict`, and their
// flags. Every default is the value the training job was first
// run with.

use clap::{Args, Subcommand};

use crate::application::train_use_case::{
    StorageBackend, TrainConfig, DEFAULT_BUCKET, DEFAULT_DATA, DEFAULT_MODEL, DEFAULT_PREFIX,
};
use crate::ml::forest::MaxFeatures;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the model, report RMSE and publish model.joblib
    Train(TrainArgs),

    /// Predict hourly counts for a table with a saved model
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Input CSV: local path, gs://bucket/object or http(s) URL
    #[arg(long, default_value = DEFAULT_DATA)]
    pub data: String,

    /// Model identifier; only random_forest_regressor is supported
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Directory for model.joblib, train_config.json and metrics.csv
    #[arg(long, default_value = "artifacts")]
    pub output_dir: String,

    /// Destination bucket
    #[arg(long, default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    /// Object prefix inside the bucket
    #[arg(long, default_value = DEFAULT_PREFIX)]
    pub artifact_prefix: String,

    /// Storage backend: gcs or local
    #[arg(long, default_value = "gcs")]
    pub storage: StorageBackend,

    /// Root directory for the local backend
    #[arg(long, default_value = "buckets")]
    pub local_bucket_dir: String,

    /// Keep the model on local disk only
    #[arg(long)]
    pub skip_upload: bool,

    /// OAuth bearer token for GCS reads and uploads
    #[arg(long, env = "GCS_ACCESS_TOKEN", hide_env_values = true)]
    pub gcs_token: Option<String>,

    /// Fraction of rows held out for evaluation
    #[arg(long, default_value_t = 0.25)]
    pub test_size: f64,

    /// Seed for the split and the forest
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, default_value_t = 100)]
    pub n_estimators: usize,

    /// Unlimited when omitted
    #[arg(long)]
    pub max_depth: Option<usize>,

    #[arg(long, default_value_t = 2)]
    pub min_samples_split: usize,

    #[arg(long, default_value_t = 1)]
    pub min_samples_leaf: usize,

    /// Features tried per split: all, sqrt or a fraction in (0, 1]
    #[arg(long, default_value = "all")]
    pub max_features: MaxFeatures,

    /// Fit every tree on the full training set
    #[arg(long)]
    pub no_bootstrap: bool,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data:              a.data,
            model_name:        a.model,
            output_dir:        a.output_dir,
            bucket:            a.bucket,
            artifact_prefix:   a.artifact_prefix,
            storage:           a.storage,
            local_bucket_dir:  a.local_bucket_dir,
            skip_upload:       a.skip_upload,
            test_size:         a.test_size,
            seed:              a.seed,
            n_estimators:      a.n_estimators,
            max_depth:         a.max_depth,
            min_samples_split: a.min_samples_split,
            min_samples_leaf:  a.min_samples_leaf,
            max_features:      a.max_features,
            bootstrap:         !a.no_bootstrap,
            gcs_token:         a.gcs_token,
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Saved model artifact
    #[arg(long, default_value = "artifacts/model.joblib")]
    pub model: String,

    /// Table to score, same locations as `train --data`
    #[arg(long)]
    pub data: String,

    #[arg(long, env = "GCS_ACCESS_TOKEN", hide_env_values = true)]
    pub gcs_token: Option<String>,
}
