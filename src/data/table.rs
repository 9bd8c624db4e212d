// ============================================================
// Layer 4 — Table Helpers (polars)
// ============================================================
// Thin wrappers over polars DataFrame operations that map polars
// failures onto PipelineError, so the preprocessing stages report
// which column or row was at fault.
//
//   column / has_column     → lookups by name
//   numeric_values          → Float64 view, nulls rejected
//   level_labels            → category labels for one column
//   rename_columns          → lenient (absent sources skipped)
//   drop_columns            → strict (every name must exist)
//   drop_existing           → lenient
//   require_complete        → first null cell becomes MissingValue

use polars::prelude::*;

use crate::domain::error::{PipelineError, PipelineResult};

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

pub fn column<'a>(df: &'a DataFrame, name: &str) -> PipelineResult<&'a Series> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| PipelineError::MissingColumn(name.to_string()))
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|n| n.to_string()).collect()
}

/// Values of a numeric column as f64. Text columns and null cells
/// are errors.
pub fn numeric_values(series: &Series) -> PipelineResult<Vec<f64>> {
    let name = series.name().to_string();
    if !series.dtype().is_primitive_numeric() {
        return Err(PipelineError::NotNumeric(name));
    }
    let cast = series.cast(&DataType::Float64)?;
    cast.f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| v.ok_or_else(|| PipelineError::MissingValue { column: name.clone(), row }))
        .collect()
}

/// Textual form of every cell, used as category labels.
/// Integral numbers print without a fractional part (2.0 → "2").
pub fn level_labels(series: &Series) -> PipelineResult<Vec<String>> {
    if series.dtype().is_primitive_numeric() {
        return Ok(numeric_values(series)?.into_iter().map(numeric_label).collect());
    }
    let name = series.name().to_string();
    let cast = series.cast(&DataType::String)?;
    cast.str()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.map(str::to_string)
                .ok_or_else(|| PipelineError::MissingValue { column: name.clone(), row })
        })
        .collect()
}

pub fn numeric_label(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Rename columns by `(from, to)` pairs. Pairs whose source
/// column is absent are skipped, like a pandas rename.
pub fn rename_columns(mut df: DataFrame, pairs: &[(&str, &str)]) -> PipelineResult<DataFrame> {
    for (from, to) in pairs {
        if from == to || !has_column(&df, from) {
            continue;
        }
        if has_column(&df, to) {
            return Err(PipelineError::DuplicateColumn(to.to_string()));
        }
        df.rename(from, (*to).into())?;
    }
    Ok(df)
}

/// Drop the named columns; every name must exist.
pub fn drop_columns(df: DataFrame, names: &[&str]) -> PipelineResult<DataFrame> {
    if let Some(missing) = names.iter().find(|n| !has_column(&df, n)) {
        return Err(PipelineError::MissingColumn(missing.to_string()));
    }
    Ok(df.drop_many(names.iter().copied()))
}

/// Drop whichever of the named columns are present.
pub fn drop_existing(df: DataFrame, names: &[&str]) -> DataFrame {
    df.drop_many(names.iter().copied().filter(|n| has_column(&df, n)))
}

pub fn require_complete(df: &DataFrame) -> PipelineResult<()> {
    for col in df.get_columns() {
        if col.null_count() == 0 {
            continue;
        }
        let mask = col.as_materialized_series().is_null();
        let row = (&mask).into_iter().position(|v| v == Some(true)).unwrap_or(0);
        return Err(PipelineError::MissingValue { column: col.name().to_string(), row });
    }
    Ok(())
}
