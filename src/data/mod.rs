// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the raw CSV and the arrays the forest
// trains on:
//
//   hour.csv (path or gs:// URI)
//       │
//       ▼
//   CsvLoader        → reads the table into a DataFrame
//       │
//       ▼
//   preprocess_data  → rename, drop, ln(count)
//       │
//       ▼
//   FeatureEncoder   → drop-first one-hot → X, y
//       │
//       ▼
//   train_test_split → seeded 75/25 partition

/// Reads CSV from disk or over HTTP(S) into a DataFrame
pub mod loader;

/// Column lookups, renames and drops over polars frames
pub mod table;

/// Fitted drop-first one-hot encoder
pub mod encoder;

/// Bike-share column renames, drops and target transform
pub mod preprocessor;

/// Seeded train/test split
pub mod splitter;
