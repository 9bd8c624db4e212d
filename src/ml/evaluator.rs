// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Regression metrics on the held-out partition.
//
//   RMSE = sqrt(mean((y_true − y_pred)²))
//   MAE  = mean(|y_true − y_pred|)
//   R²   = 1 − SS_res / SS_tot
//
// Metrics are computed in log space, the space the model was
// trained in.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionReport {
    pub n_samples: usize,
    pub rmse:      f64,
    pub mae:       f64,
    /// `None` when the targets have zero variance
    pub r2:        Option<f64>,
}

fn check(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> PipelineResult<()> {
    if y_true.len() != y_pred.len() {
        return Err(PipelineError::LengthMismatch { left: y_true.len(), right: y_pred.len() });
    }
    if y_true.is_empty() {
        return Err(PipelineError::EmptyInput("cannot compute metrics on zero samples"));
    }
    Ok(())
}

/// Root mean squared error
pub fn rmse(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> PipelineResult<f64> {
    check(y_true, y_pred)?;
    let mse = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p) * (t - p))
        .sum::<f64>()
        / y_true.len() as f64;
    Ok(mse.sqrt())
}

pub fn evaluate(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> PipelineResult<RegressionReport> {
    let rmse = rmse(y_true, y_pred)?;
    let n    = y_true.len() as f64;

    let mae = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / n;

    let mean   = y_true.sum() / n;
    let ss_tot = y_true.iter().map(|t| (t - mean) * (t - mean)).sum::<f64>();
    let ss_res = rmse * rmse * n;
    let r2     = (ss_tot > 0.0).then(|| 1.0 - ss_res / ss_tot);

    Ok(RegressionReport { n_samples: y_true.len(), rmse, mae, r2 })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_rmse_known_value() {
        // errors: 1, -1, 2, 0 → mse = 6/4
        let t = array![1.0, 2.0, 3.0, 4.0];
        let p = array![0.0, 3.0, 1.0, 4.0];
        assert!((rmse(&t, &p).unwrap() - 1.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_perfect_prediction() {
        let t = array![1.0, 2.0, 3.0];
        let r = evaluate(&t, &t).unwrap();
        assert_eq!(r.rmse, 0.0);
        assert_eq!(r.mae, 0.0);
        assert_eq!(r.r2, Some(1.0));
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let e = Array1::<f64>::zeros(0);
        assert!(matches!(rmse(&e, &e), Err(PipelineError::EmptyInput(_))));
    }

    #[test]
    fn test_length_mismatch() {
        assert_eq!(
            rmse(&array![1.0, 2.0], &array![1.0]).unwrap_err(),
            PipelineError::LengthMismatch { left: 2, right: 1 }
        );
    }

    #[test]
    fn test_constant_target_has_no_r2() {
        let t = array![2.0, 2.0];
        let p = array![1.0, 3.0];
        let r = evaluate(&t, &p).unwrap();
        assert_eq!(r.r2, None);
        assert_eq!(r.mae, 1.0);
    }
}
