// ============================================================
// Layer 4 — One-hot Encoder (drop-first)
// ============================================================
// Turns a polars DataFrame with categorical columns into a dense
// ndarray feature matrix.
//
//   fit(df)       → FittedEncoder   (category domains, persisted)
//   transform(df) → FeatureMatrix   (Array2 + feature names)
//
// For a categorical column with k observed levels the output
// holds k−1 indicator columns named `{column}_{level}`; the
// first level is the reference and is omitted. The source
// column itself never appears in the output.
//
// Level order:
//   numeric column → ascending by value
//   text column    → lexicographic
//
// Output column order: passthrough (non-categorical) columns in
// table order, then each categorical column's indicators in the
// order the columns were declared.

use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::table::{column, level_labels, numeric_label, numeric_values};
use crate::domain::error::{PipelineError, PipelineResult};

/// Unfitted encoder: just the list of columns to treat as categorical
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    categorical: Vec<String>,
}

impl FeatureEncoder {
    pub fn new<S: AsRef<str>>(categorical: &[S]) -> Self {
        Self {
            categorical: categorical.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }

    /// Learn the category domain of every categorical column and
    /// record the remaining columns as numeric passthrough features.
    pub fn fit(&self, df: &DataFrame) -> PipelineResult<FittedEncoder> {
        if df.height() == 0 {
            return Err(PipelineError::EmptyInput("cannot fit encoder on an empty table"));
        }

        let domains = self
            .categorical
            .iter()
            .map(|name| CategoryDomain::observe(name, column(df, name)?))
            .collect::<PipelineResult<Vec<_>>>()?;

        let mut passthrough = Vec::new();
        for col in df.get_columns() {
            let name = col.name().as_str();
            if self.categorical.iter().any(|c| c == name) {
                continue;
            }
            // Passthrough features must be numeric
            if !col.dtype().is_primitive_numeric() {
                return Err(PipelineError::NotNumeric(name.to_string()));
            }
            passthrough.push(name.to_string());
        }

        for d in &domains {
            tracing::debug!(
                "Category domain '{}': {} levels → {} indicators",
                d.column,
                d.levels.len(),
                d.indicator_count()
            );
        }

        Ok(FittedEncoder { passthrough, domains })
    }
}

/// Ordered levels of one categorical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDomain {
    pub column: String,
    /// Sorted levels; `levels[0]` is the dropped reference level
    pub levels: Vec<String>,
}

impl CategoryDomain {
    fn observe(column: &str, series: &Series) -> PipelineResult<Self> {
        let levels = if series.dtype().is_primitive_numeric() {
            let mut distinct = numeric_values(series)?;
            distinct.sort_by(|a, b| a.total_cmp(b));
            distinct.dedup_by(|a, b| numeric_label(*a) == numeric_label(*b));
            distinct.into_iter().map(numeric_label).collect()
        } else {
            let mut distinct = level_labels(series)?;
            distinct.sort();
            distinct.dedup();
            distinct
        };

        if levels.is_empty() {
            return Err(PipelineError::EmptyInput("categorical column has no values"));
        }
        Ok(Self { column: column.to_string(), levels })
    }

    /// k − 1 under drop-first encoding
    pub fn indicator_count(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    pub fn indicator_names(&self) -> impl Iterator<Item = String> + '_ {
        self.levels
            .iter()
            .skip(1)
            .map(move |level| format!("{}_{}", self.column, level))
    }

    /// Position of `level` among the indicator columns, `None` for
    /// the reference level.
    fn indicator_index(&self, level: &str) -> PipelineResult<Option<usize>> {
        match self.levels.iter().position(|l| l == level) {
            Some(0) => Ok(None),
            Some(i) => Ok(Some(i - 1)),
            None => Err(PipelineError::UnseenCategory {
                column: self.column.clone(),
                level:  level.to_string(),
            }),
        }
    }
}

/// Encoder state learnt at training time; stored inside the model
/// artifact so inference encodes exactly like training did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedEncoder {
    pub passthrough: Vec<String>,
    pub domains:     Vec<CategoryDomain>,
}

impl FittedEncoder {
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = self.passthrough.clone();
        for d in &self.domains {
            names.extend(d.indicator_names());
        }
        names
    }

    pub fn n_features_out(&self) -> usize {
        self.passthrough.len() + self.domains.iter().map(|d| d.indicator_count()).sum::<usize>()
    }

    /// Encode `df`. Columns the encoder does not know about are
    /// ignored; a missing known column or an unseen level is an error.
    pub fn transform(&self, df: &DataFrame) -> PipelineResult<FeatureMatrix> {
        let n_rows = df.height();
        let mut values = Array2::<f64>::zeros((n_rows, self.n_features_out()));
        let mut offset = 0;

        for name in &self.passthrough {
            let col = numeric_values(column(df, name)?)?;
            for (row, v) in col.into_iter().enumerate() {
                values[[row, offset]] = v;
            }
            offset += 1;
        }

        for domain in &self.domains {
            let labels = level_labels(column(df, &domain.column)?)?;
            for (row, level) in labels.iter().enumerate() {
                if let Some(i) = domain.indicator_index(level)? {
                    values[[row, offset + i]] = 1.0;
                }
            }
            offset += domain.indicator_count();
        }

        Ok(FeatureMatrix { names: self.feature_names(), values })
    }
}

/// Dense feature matrix with named columns
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub names:  Vec<String>,
    pub values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}
