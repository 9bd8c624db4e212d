// ============================================================
// Layer 5 — Trainer
// ============================================================
// Resolves a model identifier to an estimator, fits it on the
// training partition and wraps it in a single-stage pipeline.
//
// Only "random_forest_regressor" is supported. Any other name is
// rejected before any training work starts.

use ndarray::{Array1, Array2};

use crate::domain::error::PipelineResult;
use crate::ml::forest::{ForestParams, RandomForestRegressor};
use crate::ml::pipeline::{Estimator, ModelKind, TrainedPipeline};

/// Fit the model named `model_name` on `(x_train, y_train)`.
pub fn train_model(
    model_name: &str,
    params:     &ForestParams,
    x_train:    &Array2<f64>,
    y_train:    &Array1<f64>,
) -> PipelineResult<TrainedPipeline> {
    let kind: ModelKind = model_name.parse()?;

    tracing::info!(
        "Training {} on {} rows x {} features",
        kind,
        x_train.nrows(),
        x_train.ncols()
    );

    let estimator = match kind {
        ModelKind::RandomForestRegressor => {
            Estimator::RandomForestRegressor(RandomForestRegressor::fit(params, x_train.view(), y_train)?)
        }
    };

    Ok(TrainedPipeline::single(estimator))
}
