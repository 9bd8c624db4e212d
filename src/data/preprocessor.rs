// ============================================================
// Layer 4 — Feature Preprocessor
// ============================================================
// Turns the raw 17-column bike-share table into (X, y).
//
// Steps (applied in order):
//   1. Rename raw columns to canonical names
//   2. Drop identifier / date / redundant columns
//   3. Check the categorical columns are present
//   4. Replace `count` with ln(count)
//   5. Split off the target and the unused numeric columns
//   6. Fit the drop-first one-hot encoder and encode
//
// Inference uses `prepare_features`, the same steps without the
// target, followed by the encoder persisted at training time.

use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::encoder::{FeatureEncoder, FeatureMatrix, FittedEncoder};
use crate::data::table::{column, drop_columns, drop_existing, numeric_values, rename_columns};
use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::schema::{CATEGORICAL, DROPPED, RENAMES, TARGET, UNUSED_FEATURES};

/// Output of `preprocess_data`
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub x:       FeatureMatrix,
    /// ln(count), one entry per row of `x`
    pub y:       Array1<f64>,
    pub encoder: FittedEncoder,
}

/// Full training-time preprocessing of a raw table.
pub fn preprocess_data(df: DataFrame) -> PipelineResult<Preprocessed> {
    let df = drop_columns(rename_columns(df, &RENAMES)?, &DROPPED)?;
    require_categorical(&df)?;

    let df = log_transform_target(df)?;
    let y  = Array1::from(numeric_values(column(&df, TARGET)?)?);

    let features = drop_columns(df, &feature_exclusions())?;
    let encoder  = FeatureEncoder::new(&CATEGORICAL).fit(&features)?;
    let x        = encoder.transform(&features)?;

    tracing::info!(
        "Preprocessed {} rows into {} features",
        x.n_rows(),
        x.n_features()
    );
    Ok(Preprocessed { x, y, encoder })
}

/// Inference-time counterpart of `preprocess_data`: canonical
/// names, feature columns only, identifier and target columns
/// tolerated but not required.
pub fn prepare_features(df: DataFrame) -> PipelineResult<DataFrame> {
    let df = rename_columns(df, &RENAMES)?;
    let df = drop_existing(drop_existing(df, &DROPPED), &feature_exclusions());
    require_categorical(&df)?;
    Ok(df)
}

/// Replace the target column with its natural logarithm.
pub fn log_transform_target(mut df: DataFrame) -> PipelineResult<DataFrame> {
    let counts = numeric_values(column(&df, TARGET)?)?;
    if let Some((row, &value)) = counts
        .iter()
        .enumerate()
        .find(|(_, v)| !(**v > 0.0 && v.is_finite()))
    {
        return Err(PipelineError::NonPositiveTarget { row, value });
    }

    let logged: Vec<f64> = counts.iter().map(|v| v.ln()).collect();
    df.with_column(Series::new(TARGET.into(), logged))?;
    Ok(df)
}

/// Transform applied to the target before training; stored in
/// the artifact so predictions can be mapped back to counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetTransform {
    Log,
}

impl TargetTransform {
    pub fn inverse(&self, values: &Array1<f64>) -> Array1<f64> {
        match self {
            TargetTransform::Log => values.mapv(f64::exp),
        }
    }
}

fn require_categorical(df: &DataFrame) -> PipelineResult<()> {
    for name in CATEGORICAL {
        column(df, name)?;
    }
    Ok(())
}

fn feature_exclusions() -> Vec<&'static str> {
    let mut cols = UNUSED_FEATURES.to_vec();
    cols.push(TARGET);
    cols
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::has_column;
    use crate::testing::raw_frame;

    #[test]
    fn test_degenerate_seventeen_row_case() {
        // Two seasons, one holiday value
        let seasons: Vec<f64> = (0..17).map(|i| if i < 9 { 1.0 } else { 2.0 }).collect();
        let holidays = vec![0.0; 17];

        let out = preprocess_data(raw_frame(&seasons, &holidays)).unwrap();

        let season_cols: Vec<_> = out.x.names.iter().filter(|n| n.starts_with("season_")).collect();
        let holiday_cols: Vec<_> = out.x.names.iter().filter(|n| n.starts_with("holiday_")).collect();
        assert_eq!(season_cols, vec!["season_2"]);
        assert!(holiday_cols.is_empty());
        assert_eq!(out.x.n_rows(), 17);
        assert_eq!(out.y.len(), 17);
    }

    #[test]
    fn test_no_categorical_or_dropped_columns_remain() {
        let seasons: Vec<f64> = (0..20).map(|i| (i % 4 + 1) as f64).collect();
        let out = preprocess_data(raw_frame(&seasons, &vec![0.0; 20])).unwrap();

        let forbidden = CATEGORICAL
            .iter()
            .chain(UNUSED_FEATURES.iter())
            .chain(DROPPED.iter())
            .chain(std::iter::once(&TARGET));
        for name in forbidden {
            assert!(out.x.column_index(name).is_none(), "{name} should not be a feature");
        }
        assert_eq!(out.x.n_rows(), out.y.len());
        // temp and humidity pass through first
        assert_eq!(&out.x.names[..2], &["temp".to_string(), "humidity".to_string()]);
    }

    #[test]
    fn test_feature_order() {
        let seasons: Vec<f64> = (0..20).map(|i| (i % 4 + 1) as f64).collect();
        let out = preprocess_data(raw_frame(&seasons, &vec![0.0; 20])).unwrap();

        let expected = vec![
            "temp", "humidity",
            "season_2", "season_3", "season_4",
            "month_2", "month_3",
            "hour_1", "hour_2", "hour_3",
            "weekday_1", "weekday_2", "weekday_3", "weekday_4", "weekday_5", "weekday_6",
            "workingday_1",
            "weather_2", "weather_3",
        ];
        assert_eq!(out.x.names, expected);
    }

    #[test]
    fn test_log_target_round_trips() {
        let seasons: Vec<f64> = (0..10).map(|i| (i % 2 + 1) as f64).collect();
        let raw = raw_frame(&seasons, &vec![0.0; 10]);
        let counts = numeric_values(column(&raw, "cnt").unwrap()).unwrap();

        let out = preprocess_data(raw).unwrap();
        let back = TargetTransform::Log.inverse(&out.y);
        for (a, b) in counts.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-9 * a.max(1.0));
        }
    }

    #[test]
    fn test_non_positive_target_fails() {
        let mut raw = raw_frame(&[1.0, 2.0, 1.0], &[0.0; 3]);
        raw.with_column(Series::new("cnt".into(), vec![5i64, 16, 0])).unwrap();

        assert_eq!(
            preprocess_data(raw).unwrap_err(),
            PipelineError::NonPositiveTarget { row: 2, value: 0.0 }
        );
    }

    #[test]
    fn test_missing_column_fails() {
        let raw = drop_existing(raw_frame(&[1.0, 2.0], &[0.0; 2]), &["instant"]);
        assert_eq!(
            preprocess_data(raw).unwrap_err(),
            PipelineError::MissingColumn("instant".into())
        );
    }

    #[test]
    fn test_prepare_features_matches_training_encoding() {
        let seasons: Vec<f64> = (0..12).map(|i| (i % 3 + 1) as f64).collect();
        let raw = raw_frame(&seasons, &vec![0.0; 12]);
        let out = preprocess_data(raw.clone()).unwrap();

        // Inference input without the target columns
        let unlabeled = drop_existing(raw, &["cnt", "casual", "registered"]);
        let features  = prepare_features(unlabeled).unwrap();
        let x         = out.encoder.transform(&features).unwrap();

        assert_eq!(x, out.x);
    }

    #[test]
    fn test_log_transform_replaces_count_in_place() {
        let raw = rename_columns(raw_frame(&[1.0, 2.0], &[0.0; 2]), &RENAMES).unwrap();
        let width = raw.width();
        let df = log_transform_target(raw).unwrap();

        assert_eq!(df.width(), width);
        assert_eq!(df.column(TARGET).unwrap().dtype(), &DataType::Float64);
        let logged = numeric_values(column(&df, TARGET).unwrap()).unwrap();
        assert!((logged[0] - 5f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_prepare_features_drops_identifiers_and_target() {
        let raw = raw_frame(&[1.0, 2.0], &[0.0; 2]);
        let df  = prepare_features(raw).unwrap();
        for name in ["instant", "dteday", "cnt", "count", "casual", "weathersit"] {
            assert!(!has_column(&df, name), "{name} should be gone");
        }
        assert!(has_column(&df, "weather"));
    }
}
