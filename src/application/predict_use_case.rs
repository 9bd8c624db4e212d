// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Scores a table with a saved model:
//
//   1. Load model.joblib                 (Layer 6 - infra)
//   2. Load the table                    (Layer 4 - data)
//   3. Prepare features, encode with the stored encoder
//   4. Predict in log space, map back to counts
//   5. Write `row,prediction` CSV to the given writer

use anyhow::{Context, Result};
use ndarray::Array1;
use serde::Serialize;
use std::{io::Write, path::Path};

use crate::data::preprocessor::prepare_features;
use crate::domain::traits::{Persistable, TableSource};
use crate::infra::artifact::ModelArtifact;

#[derive(Debug, Serialize)]
struct PredictionRow {
    row:        usize,
    prediction: f64,
}

pub struct PredictUseCase {
    artifact: ModelArtifact,
}

impl PredictUseCase {
    /// Load the artifact at `model_path`.
    pub fn new(model_path: impl AsRef<Path>) -> Result<Self> {
        let artifact = ModelArtifact::load(model_path.as_ref())?;
        tracing::info!(
            "Loaded {} with {} features",
            artifact.model_name,
            artifact.feature_names.len()
        );
        Ok(Self { artifact })
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        Self { artifact }
    }

    /// Predicted counts, one per input row
    pub fn predict(&self, source: &dyn TableSource) -> Result<Array1<f64>> {
        let raw      = source.load()?;
        let features = prepare_features(raw).context("Cannot prepare features")?;
        let x        = self.artifact.encode(&features)?;

        let log_pred = self.artifact.pipeline.predict(x.values.view())?;
        Ok(self.artifact.target_transform.inverse(&log_pred))
    }

    /// Predict and write the results as CSV.
    pub fn run<W: Write>(&self, source: &dyn TableSource, out: W) -> Result<usize> {
        let predictions = self.predict(source)?;

        let mut writer = csv::Writer::from_writer(out);
        for (row, &prediction) in predictions.iter().enumerate() {
            writer.serialize(PredictionRow { row, prediction })?;
        }
        writer.flush()?;

        tracing::info!("Wrote {} predictions", predictions.len());
        Ok(predictions.len())
    }
}
