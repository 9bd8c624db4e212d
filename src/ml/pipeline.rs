// ============================================================
// Layer 5 — Estimator Pipeline
// ============================================================
// A named sequence of stages fitted and applied as one unit.
// Today the sequence is a single estimator stage; the wrapper
// gives every model the same fit/predict surface and a stable
// shape inside the serialized artifact.

use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::domain::error::{PipelineError, PipelineResult};
use crate::ml::forest::RandomForestRegressor;

/// Supported model identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    RandomForestRegressor,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::RandomForestRegressor => "random_forest_regressor",
        }
    }

    /// Step name used inside the pipeline (lowercased type name)
    pub fn step_name(&self) -> &'static str {
        match self {
            ModelKind::RandomForestRegressor => "randomforestregressor",
        }
    }
}

impl FromStr for ModelKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random_forest_regressor" => Ok(ModelKind::RandomForestRegressor),
            other => Err(PipelineError::InvalidModel(other.to_string())),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fitted estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    RandomForestRegressor(RandomForestRegressor),
}

impl Estimator {
    pub fn kind(&self) -> ModelKind {
        match self {
            Estimator::RandomForestRegressor(_) => ModelKind::RandomForestRegressor,
        }
    }

    pub fn predict(&self, x: ArrayView2<'_, f64>) -> PipelineResult<Array1<f64>> {
        match self {
            Estimator::RandomForestRegressor(m) => m.predict(x),
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Estimator::RandomForestRegressor(m) => m.n_features(),
        }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        match self {
            Estimator::RandomForestRegressor(m) => m.validate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineStep {
    pub name:      String,
    pub estimator: Estimator,
}

/// Fitted pipeline; immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedPipeline {
    steps: Vec<PipelineStep>,
}

impl TrainedPipeline {
    /// Wrap a single fitted estimator
    pub fn single(estimator: Estimator) -> Self {
        let name = estimator.kind().step_name().to_string();
        Self { steps: vec![PipelineStep { name, estimator }] }
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    /// The final stage's estimator
    pub fn estimator(&self) -> &Estimator {
        &self.steps[self.steps.len() - 1].estimator
    }

    pub fn model_kind(&self) -> ModelKind {
        self.estimator().kind()
    }

    pub fn predict(&self, x: ArrayView2<'_, f64>) -> PipelineResult<Array1<f64>> {
        self.estimator().predict(x)
    }

    /// Reject deserialized pipelines that could not have been built
    /// by `single`.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.steps.is_empty() {
            return Err(PipelineError::CorruptModel("pipeline has no steps".into()));
        }
        self.steps.iter().try_for_each(|step| step.estimator.validate())
    }
}
