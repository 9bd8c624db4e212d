// ============================================================
// Layer 6 — Model Artifact Store
// ============================================================
// Writes and reads the trained model on local disk.
//
// What gets saved per run:
//   1. model.joblib       - ModelArtifact as JSON: encoder state,
//                           target transform, fitted pipeline,
//                           evaluation report
//   2. train_config.json  - the configuration of the run
//
// File layout:
//   artifacts/
//     model.joblib
//     train_config.json
//     metrics.csv         ← written by MetricsLogger

use anyhow::{bail, Context, Result};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::data::encoder::{FeatureMatrix, FittedEncoder};
use crate::data::preprocessor::TargetTransform;
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::traits::Persistable;
use crate::ml::evaluator::RegressionReport;
use crate::ml::pipeline::TrainedPipeline;

pub const ARTIFACT_FILE: &str = "model.joblib";
pub const CONFIG_FILE: &str = "train_config.json";

/// Bumped whenever the serialized layout changes
pub const FORMAT_VERSION: u32 = 1;

/// Everything needed to score new rows the way training did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version:   u32,
    pub model_name:       String,
    pub feature_names:    Vec<String>,
    pub encoder:          FittedEncoder,
    pub target_transform: TargetTransform,
    pub pipeline:         TrainedPipeline,
    pub evaluation:       RegressionReport,
}

impl ModelArtifact {
    pub fn new(
        encoder:    FittedEncoder,
        pipeline:   TrainedPipeline,
        evaluation: RegressionReport,
    ) -> Self {
        Self {
            format_version:   FORMAT_VERSION,
            model_name:       pipeline.model_kind().to_string(),
            feature_names:    encoder.feature_names(),
            encoder,
            target_transform: TargetTransform::Log,
            pipeline,
            evaluation,
        }
    }

    /// Encode a prepared feature table with the stored encoder
    pub fn encode(&self, features: &DataFrame) -> Result<FeatureMatrix> {
        Ok(self.encoder.transform(features)?)
    }

    /// The encoder and the model must agree on the feature layout,
    /// and the trees must be safe to walk.
    pub fn validate(&self) -> PipelineResult<()> {
        self.pipeline.validate()?;
        let produced = self.encoder.n_features_out();
        let expected = self.pipeline.estimator().n_features();
        if produced != expected || self.feature_names.len() != expected {
            return Err(PipelineError::CorruptModel(format!(
                "encoder yields {produced} features and {} names, model expects {expected}",
                self.feature_names.len()
            )));
        }
        Ok(())
    }
}

impl Persistable for ModelArtifact {
    fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec(self).context("Cannot serialize model artifact")?;
        fs::write(path, json)
            .with_context(|| format!("Cannot write model artifact to '{}'", path.display()))?;
        Ok(())
    }

    fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| {
            format!(
                "Cannot read model artifact '{}'. Have you run 'train' first?",
                path.display()
            )
        })?;
        let artifact: ModelArtifact = serde_json::from_slice(&bytes)
            .with_context(|| format!("'{}' is not a valid model artifact", path.display()))?;

        if artifact.format_version != FORMAT_VERSION {
            bail!(
                "Artifact '{}' has format version {}, expected {}",
                path.display(),
                artifact.format_version,
                FORMAT_VERSION
            );
        }
        artifact
            .validate()
            .with_context(|| format!("'{}' is not a valid model artifact", path.display()))?;
        Ok(artifact)
    }
}

/// Local directory holding the artifact and run configuration.
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Create the store, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create artifact directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.dir.join(ARTIFACT_FILE)
    }

    /// Write `model.joblib` and return its path
    pub fn save_artifact(&self, artifact: &ModelArtifact) -> Result<PathBuf> {
        let path = self.artifact_path();
        artifact.save(&path)?;
        tracing::info!("Local model file '{}' created successfully", path.display());
        Ok(path)
    }

    pub fn load_artifact(&self) -> Result<ModelArtifact> {
        ModelArtifact::load(&self.artifact_path())
    }

    /// Save the run configuration next to the artifact.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::preprocessor::preprocess_data;
    use crate::ml::forest::ForestParams;
    use crate::ml::trainer::train_model;
    use crate::testing::raw_frame;

    fn small_artifact() -> ModelArtifact {
        let seasons: Vec<f64> = (0..24).map(|i| (i % 2 + 1) as f64).collect();
        let pre = preprocess_data(raw_frame(&seasons, &vec![0.0; 24])).unwrap();
        let params = ForestParams { n_estimators: 3, ..ForestParams::default() };
        let pipeline = train_model("random_forest_regressor", &params, &pre.x.values, &pre.y).unwrap();
        let report = RegressionReport { n_samples: 6, rmse: 0.1, mae: 0.05, r2: Some(0.9) };
        ModelArtifact::new(pre.encoder, pipeline, report)
    }

    #[test]
    fn test_artifact_survives_disk() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let artifact = small_artifact();

        let path = store.save_artifact(&artifact).unwrap();
        assert!(path.ends_with(ARTIFACT_FILE));
        assert_eq!(store.load_artifact().unwrap(), artifact);
    }

    #[test]
    fn test_artifact_records_model_and_features() {
        let artifact = small_artifact();
        assert_eq!(artifact.model_name, "random_forest_regressor");
        assert_eq!(artifact.feature_names, artifact.encoder.feature_names());
        assert_eq!(artifact.target_transform, TargetTransform::Log);
    }

    #[test]
    fn test_load_missing_artifact_mentions_train() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let err   = store.load_artifact().unwrap_err();
        assert!(err.to_string().contains("Have you run 'train' first?"));
    }

    /// Save the artifact, apply `edit` to the first split node of the
    /// first tree that has one, and write it back.
    fn corrupt_first_split(store: &ArtifactStore, edit: impl Fn(&mut serde_json::Value)) {
        let path = store.save_artifact(&small_artifact()).unwrap();
        let mut json: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();

        let trees = json["pipeline"]["steps"][0]["estimator"]["trees"].as_array_mut().unwrap();
        let split = trees
            .iter_mut()
            .flat_map(|t| t["nodes"].as_array_mut().unwrap().iter_mut())
            .find_map(|n| n.get_mut("Split"))
            .expect("a fitted forest has at least one split");
        edit(split);

        fs::write(&path, serde_json::to_vec(&json).unwrap()).unwrap();
    }

    fn corrupt_model_error(store: &ArtifactStore) -> Option<PipelineError> {
        let err = store.load_artifact().unwrap_err();
        err.downcast_ref::<PipelineError>().cloned()
    }

    #[test]
    fn test_out_of_range_child_is_rejected() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        corrupt_first_split(&store, |split| split["left"] = 100_000.into());

        assert!(matches!(corrupt_model_error(&store), Some(PipelineError::CorruptModel(_))));
    }

    #[test]
    fn test_backward_child_is_rejected() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        // a child at or before its parent would make prediction loop
        corrupt_first_split(&store, |split| split["right"] = 0.into());

        assert!(matches!(corrupt_model_error(&store), Some(PipelineError::CorruptModel(_))));
    }

    #[test]
    fn test_unknown_split_feature_is_rejected() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        corrupt_first_split(&store, |split| split["feature"] = 9_999.into());

        assert!(matches!(corrupt_model_error(&store), Some(PipelineError::CorruptModel(_))));
    }

    #[test]
    fn test_encoder_model_width_mismatch_is_rejected() {
        let mut artifact = small_artifact();
        artifact.feature_names.pop();
        assert!(matches!(artifact.validate(), Err(PipelineError::CorruptModel(_))));
        assert_eq!(small_artifact().validate(), Ok(()));
    }

    #[test]
    fn test_config_round_trip() {
        let dir   = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        let cfg   = TrainConfig::default();
        store.save_config(&cfg).unwrap();
        assert_eq!(store.load_config().unwrap(), cfg);
    }
}
