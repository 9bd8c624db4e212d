// ============================================================
// Layer 4 — Train/Test Splitter
// ============================================================
// Shuffles row indices with a seeded RNG and splits them into:
//   - Training partition: used to fit the forest
//   - Test partition:     held out for RMSE
//
// n_test = ceil(test_fraction * n_rows), the rest is training.
// The first n_test shuffled indices form the test partition.
//
// Fisher-Yates shuffle via rand::seq::SliceRandom on a StdRng
// seeded from the configured seed: same seed, same split.

use ndarray::{Array1, Array2, Axis};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::domain::error::{PipelineError, PipelineResult};

/// Row indices of each partition
#[derive(Debug, Clone, PartialEq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test:  Vec<usize>,
}

/// The four arrays produced by `train_test_split`
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub x_test:  Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test:  Array1<f64>,
}

/// Shuffle `0..n_rows` with `seed` and split off a test partition.
pub fn split_indices(n_rows: usize, test_fraction: f64, seed: u64) -> PipelineResult<SplitIndices> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::InvalidParameter(format!(
            "test fraction must be in (0, 1), got {test_fraction}"
        )));
    }

    let n_test = ((n_rows as f64) * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n_rows {
        return Err(PipelineError::InvalidParameter(format!(
            "test fraction {test_fraction} leaves an empty partition for {n_rows} rows"
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..n_rows).collect();
    indices.shuffle(&mut rng);

    // split_off(n) keeps [0..n] in `indices` and returns [n..]
    let train = indices.split_off(n_test);
    let test  = indices;

    tracing::debug!(
        "Dataset split: {} training, {} test (seed {})",
        train.len(),
        test.len(),
        seed
    );

    Ok(SplitIndices { train, test })
}

/// Split a feature matrix and target vector into train/test partitions.
pub fn train_test_split(
    x:             &Array2<f64>,
    y:             &Array1<f64>,
    test_fraction: f64,
    seed:          u64,
) -> PipelineResult<TrainTestSplit> {
    if x.nrows() != y.len() {
        return Err(PipelineError::LengthMismatch { left: x.nrows(), right: y.len() });
    }

    let idx = split_indices(x.nrows(), test_fraction, seed)?;

    Ok(TrainTestSplit {
        x_train: x.select(Axis(0), &idx.train),
        x_test:  x.select(Axis(0), &idx.test),
        y_train: y.select(Axis(0), &idx.train),
        y_test:  y.select(Axis(0), &idx.test),
    })
}
