// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one row per training run to a CSV file so runs can be
// compared over time.
//
// Output file: {output_dir}/metrics.csv
//
//   model,n_train,n_test,n_features,rmse,mae,r2
//   random_forest_regressor,13034,4345,57,0.301,0.204,0.954
//
// The header is written only when the file is missing or empty.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
};

use crate::ml::evaluator::RegressionReport;

pub const METRICS_FILE: &str = "metrics.csv";

/// One row of the run log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub model:      String,
    pub n_train:    usize,
    pub n_test:     usize,
    pub n_features: usize,
    pub rmse:       f64,
    pub mae:        f64,
    /// Empty cell when undefined
    pub r2:         Option<f64>,
}

impl RunMetrics {
    pub fn new(
        model:      impl Into<String>,
        n_train:    usize,
        n_features: usize,
        report:     &RegressionReport,
    ) -> Self {
        Self {
            model: model.into(),
            n_train,
            n_test: report.n_samples,
            n_features,
            rmse: report.rmse,
            mae: report.mae,
            r2: report.r2,
        }
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;
        Ok(Self { csv_path: dir.join(METRICS_FILE) })
    }

    /// Append one run to the CSV
    pub fn log(&self, m: &RunMetrics) -> Result<()> {
        let needs_header = fs::metadata(&self.csv_path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        let mut writer = csv::WriterBuilder::new().has_headers(needs_header).from_writer(file);
        writer.serialize(m)?;
        writer.flush()?;

        tracing::debug!("Logged run metrics to '{}': rmse={:.4}", self.csv_path.display(), m.rmse);
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<RunMetrics>> {
        let mut reader = csv::Reader::from_path(&self.csv_path)
            .with_context(|| format!("Cannot read '{}'", self.csv_path.display()))?;
        let rows = reader.deserialize().collect::<Result<Vec<RunMetrics>, _>>()?;
        Ok(rows)
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
