// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: no model math, no printing, no
// direct file formats. Sources and stores arrive as trait objects
// built by the CLI.
//
//   train_use_case.rs   - load → preprocess → split → fit →
//                         evaluate → publish
//   predict_use_case.rs - score a table with a saved artifact

// The training workflow
pub mod train_use_case;

// Offline scoring with model.joblib
pub mod predict_use_case;
