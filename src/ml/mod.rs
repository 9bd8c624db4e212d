// ============================================================
// Layer 5 — ML / Model Layer
// ============================================================
// Estimators, the pipeline wrapper and evaluation metrics.
// Works on ndarray matrices only; knows nothing about CSV,
// column names or storage.
//
//   tree.rs      - CART regression tree (squared error)
//   forest.rs    - bagged random forest regressor
//   pipeline.rs  - ModelKind, Estimator, single-stage pipeline
//   trainer.rs   - model-name dispatch + fit
//   evaluator.rs - RMSE / MAE / R²

pub mod tree;

pub mod forest;

pub mod pipeline;

/// Model identifier → fitted pipeline
pub mod trainer;

pub mod evaluator;
