// ============================================================
// Layer 5 — Random Forest Regressor
// ============================================================
// Bagged ensemble of CART regression trees.
//
//   for each tree:
//     1. seed a tree RNG from the forest RNG
//     2. draw n rows with replacement (bootstrap)
//     3. grow a RegressionTree on those rows
//   predict = mean of the tree predictions
//
// Defaults follow scikit-learn's RandomForestRegressor:
// 100 trees, bootstrap on, unlimited depth, min_samples_split 2,
// min_samples_leaf 1, every feature considered at each split.
// Unlike scikit-learn the forest is always seeded.

use ndarray::{Array1, ArrayView2};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult};
use crate::ml::tree::{RegressionTree, TreeParams};

/// How many features each split may look at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    All,
    Sqrt,
    /// Fraction of the features, at least one
    Fraction(f64),
}

impl MaxFeatures {
    pub fn resolve(&self, n_features: usize) -> usize {
        let k = match self {
            MaxFeatures::All         => n_features,
            MaxFeatures::Sqrt        => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::Fraction(f) => ((n_features as f64) * f).floor() as usize,
        };
        k.clamp(1, n_features.max(1))
    }
}

impl std::str::FromStr for MaxFeatures {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" | "1.0" => Ok(MaxFeatures::All),
            "sqrt"        => Ok(MaxFeatures::Sqrt),
            other => match other.parse::<f64>() {
                Ok(f) if f > 0.0 && f <= 1.0 => Ok(MaxFeatures::Fraction(f)),
                _ => Err(PipelineError::InvalidParameter(format!(
                    "max_features must be 'all', 'sqrt' or a fraction in (0, 1], got '{other}'"
                ))),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators:      usize,
    pub max_depth:         Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf:  usize,
    pub max_features:      MaxFeatures,
    pub bootstrap:         bool,
    pub seed:              u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators:      100,
            max_depth:         None,
            min_samples_split: 2,
            min_samples_leaf:  1,
            max_features:      MaxFeatures::All,
            bootstrap:         true,
            seed:              42,
        }
    }
}

impl ForestParams {
    pub fn validate(&self) -> PipelineResult<()> {
        if self.n_estimators == 0 {
            return Err(PipelineError::InvalidParameter("n_estimators must be at least 1".into()));
        }
        if self.min_samples_split < 2 {
            return Err(PipelineError::InvalidParameter("min_samples_split must be at least 2".into()));
        }
        if self.min_samples_leaf < 1 {
            return Err(PipelineError::InvalidParameter("min_samples_leaf must be at least 1".into()));
        }
        if self.max_depth == Some(0) {
            return Err(PipelineError::InvalidParameter("max_depth must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    params:     ForestParams,
    trees:      Vec<RegressionTree>,
    n_features: usize,
}

impl RandomForestRegressor {
    pub fn fit(
        params: &ForestParams,
        x:      ArrayView2<'_, f64>,
        y:      &Array1<f64>,
    ) -> PipelineResult<Self> {
        params.validate()?;
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(PipelineError::EmptyInput("cannot fit a forest on an empty matrix"));
        }
        if x.nrows() != y.len() {
            return Err(PipelineError::LengthMismatch { left: x.nrows(), right: y.len() });
        }

        let n_rows = x.nrows();
        let tree_params = TreeParams {
            max_depth:         params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf:  params.min_samples_leaf,
            max_features:      params.max_features.resolve(x.ncols()),
        };

        let mut forest_rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_estimators);

        for i in 0..params.n_estimators {
            let mut rng = StdRng::seed_from_u64(forest_rng.gen());
            let rows: Vec<usize> = if params.bootstrap {
                (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect()
            } else {
                (0..n_rows).collect()
            };

            let tree = RegressionTree::fit(x, y.view(), rows, &tree_params, &mut rng);
            tracing::trace!(
                "Tree {}/{}: {} nodes, depth {}",
                i + 1,
                params.n_estimators,
                tree.node_count(),
                tree.depth()
            );
            trees.push(tree);
        }

        tracing::debug!("Fitted {} trees on {} rows x {} features", trees.len(), n_rows, x.ncols());
        Ok(Self { params: params.clone(), trees, n_features: x.ncols() })
    }

    pub fn predict(&self, x: ArrayView2<'_, f64>) -> PipelineResult<Array1<f64>> {
        if x.ncols() != self.n_features {
            return Err(PipelineError::FeatureMismatch {
                expected: self.n_features,
                found:    x.ncols(),
            });
        }

        let n_trees = self.trees.len() as f64;
        Ok(x.rows()
            .into_iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees)
            .collect())
    }

    /// Structural check for forests read back from disk
    pub fn validate(&self) -> PipelineResult<()> {
        if self.trees.is_empty() {
            return Err(PipelineError::CorruptModel("forest has no trees".into()));
        }
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.n_features() != self.n_features {
                return Err(PipelineError::CorruptModel(format!(
                    "tree {t} expects {} features, forest expects {}",
                    tree.n_features(),
                    self.n_features
                )));
            }
            tree.validate().map_err(|e| match e {
                PipelineError::CorruptModel(msg) => PipelineError::CorruptModel(format!("tree {t}: {msg}")),
                other => other,
            })?;
        }
        Ok(())
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}
