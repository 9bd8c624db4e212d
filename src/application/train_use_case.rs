// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training run:
//
//   Step 1: Load the raw table          (Layer 4 - data)
//   Step 2: Preprocess into (X, ln y)   (Layer 4 - data)
//   Step 3: Seeded train/test split     (Layer 4 - data)
//   Step 4: Fit the named model         (Layer 5 - ml)
//   Step 5: Predict + evaluate          (Layer 5 - ml)
//   ── fit_and_evaluate returns here; the caller reports RMSE ──
//   Step 6: Save config, publish model  (Layer 6 - infra)
//   Step 7: Append run metrics          (Layer 6 - infra)
//
// The table source and object store are passed in by the caller.
// `execute` runs both halves back to back.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{preprocessor::preprocess_data, splitter::train_test_split};
use crate::domain::traits::{ObjectStore, TableSource};
use crate::infra::{
    artifact::{ArtifactStore, ModelArtifact},
    metrics::{MetricsLogger, RunMetrics},
    publisher::{ArtifactPublisher, PublishReport},
};
use crate::ml::{
    evaluator::{evaluate, RegressionReport},
    forest::{ForestParams, MaxFeatures},
    trainer::train_model,
};

pub const DEFAULT_DATA: &str = "gs://sid-vertex-mlops/bike-share/hour.csv";
pub const DEFAULT_MODEL: &str = "random_forest_regressor";
pub const DEFAULT_BUCKET: &str = "sid-vertex-mlops";
pub const DEFAULT_PREFIX: &str = "bike-share-rf-regression-artifact";

/// Where `model.joblib` is uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Google Cloud Storage JSON API
    Gcs,
    /// A local directory standing in for the bucket
    Local,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gcs"   => Ok(Self::Gcs),
            "local" => Ok(Self::Local),
            other   => Err(format!("unknown storage backend '{other}', expected 'gcs' or 'local'")),
        }
    }
}

// ─── Training Configuration ──────────────────────────────────────────────────
// Saved next to the artifact as train_config.json. The access token
// is never written out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data:              String,
    pub model_name:        String,
    pub output_dir:        String,
    pub bucket:            String,
    pub artifact_prefix:   String,
    pub storage:           StorageBackend,
    pub local_bucket_dir:  String,
    pub skip_upload:       bool,
    pub test_size:         f64,
    pub seed:              u64,
    pub n_estimators:      usize,
    pub max_depth:         Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf:  usize,
    pub max_features:      MaxFeatures,
    pub bootstrap:         bool,
    #[serde(skip)]
    pub gcs_token:         Option<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        let forest = ForestParams::default();
        Self {
            data:              DEFAULT_DATA.to_string(),
            model_name:        DEFAULT_MODEL.to_string(),
            output_dir:        "artifacts".to_string(),
            bucket:            DEFAULT_BUCKET.to_string(),
            artifact_prefix:   DEFAULT_PREFIX.to_string(),
            storage:           StorageBackend::Gcs,
            local_bucket_dir:  "buckets".to_string(),
            skip_upload:       false,
            test_size:         0.25,
            seed:              42,
            n_estimators:      forest.n_estimators,
            max_depth:         forest.max_depth,
            min_samples_split: forest.min_samples_split,
            min_samples_leaf:  forest.min_samples_leaf,
            max_features:      forest.max_features,
            bootstrap:         forest.bootstrap,
            gcs_token:         None,
        }
    }
}

impl TrainConfig {
    /// Forest hyper-parameters; the forest shares the split seed
    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_estimators:      self.n_estimators,
            max_depth:         self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf:  self.min_samples_leaf,
            max_features:      self.max_features,
            bootstrap:         self.bootstrap,
            seed:              self.seed,
        }
    }
}

/// A fitted model and its test-set report, not yet persisted
#[derive(Debug, Clone)]
pub struct EvaluatedModel {
    pub artifact: ModelArtifact,
    pub n_train:  usize,
}

impl EvaluatedModel {
    pub fn report(&self) -> &RegressionReport {
        &self.artifact.evaluation
    }
}

/// What a finished run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub n_train:    usize,
    pub n_test:     usize,
    pub n_features: usize,
    pub report:     RegressionReport,
    pub published:  PublishReport,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Run the pipeline end to end. `remote` is ignored when
    /// `skip_upload` is set and required otherwise.
    pub fn execute(
        &self,
        source: &dyn TableSource,
        remote: Option<&dyn ObjectStore>,
    ) -> Result<RunSummary> {
        let remote = self.resolve_remote(remote)?;
        let model  = self.fit_and_evaluate(source)?;
        self.publish(model, remote)
    }

    /// Steps 1-5: everything up to a scored model. Nothing is
    /// written to disk.
    pub fn fit_and_evaluate(&self, source: &dyn TableSource) -> Result<EvaluatedModel> {
        let cfg = &self.config;

        // ── Step 1: Load ─────────────────────────────────────────────────────
        tracing::info!("Loading data from '{}'", source.describe());
        let raw = source.load()?;

        // ── Step 2: Preprocess ───────────────────────────────────────────────
        let pre = preprocess_data(raw).context("Preprocessing failed")?;

        // ── Step 3: Split ────────────────────────────────────────────────────
        let split = train_test_split(&pre.x.values, &pre.y, cfg.test_size, cfg.seed)?;
        tracing::info!(
            "Split: {} train, {} test",
            split.y_train.len(),
            split.y_test.len()
        );

        // ── Step 4: Train ────────────────────────────────────────────────────
        let pipeline =
            train_model(&cfg.model_name, &cfg.forest_params(), &split.x_train, &split.y_train)?;

        // ── Step 5: Evaluate ─────────────────────────────────────────────────
        let y_pred = pipeline.predict(split.x_test.view())?;
        let report = evaluate(&split.y_test, &y_pred)?;
        match report.r2 {
            Some(r2) => tracing::info!("MAE: {:.4}, R²: {:.4}", report.mae, r2),
            None     => tracing::info!("MAE: {:.4}, R² undefined", report.mae),
        }

        Ok(EvaluatedModel {
            artifact: ModelArtifact::new(pre.encoder, pipeline, report),
            n_train:  split.y_train.len(),
        })
    }

    /// Steps 6-7: persist, upload and log a scored model.
    pub fn publish(
        &self,
        model:  EvaluatedModel,
        remote: Option<&dyn ObjectStore>,
    ) -> Result<RunSummary> {
        let cfg    = &self.config;
        let remote = self.resolve_remote(remote)?;

        // ── Step 6: Persist and publish ──────────────────────────────────────
        let store = ArtifactStore::new(&cfg.output_dir)?;
        store.save_config(cfg)?;

        let EvaluatedModel { artifact, n_train } = model;
        let published = ArtifactPublisher::new(&store, remote, &cfg.artifact_prefix)
            .publish(&artifact)?;

        // ── Step 7: Run log ──────────────────────────────────────────────────
        let n_features = artifact.encoder.n_features_out();
        let report     = artifact.evaluation;
        MetricsLogger::new(store.dir())?
            .log(&RunMetrics::new(&cfg.model_name, n_train, n_features, &report))?;

        Ok(RunSummary { n_train, n_test: report.n_samples, n_features, report, published })
    }

    fn resolve_remote<'a>(
        &self,
        remote: Option<&'a dyn ObjectStore>,
    ) -> Result<Option<&'a dyn ObjectStore>> {
        if self.config.skip_upload {
            return Ok(None);
        }
        remote
            .context("No object store configured; pass --skip-upload to train offline")
            .map(Some)
    }
}
