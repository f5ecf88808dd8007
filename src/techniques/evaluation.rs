use anyhow::{Result, anyhow};
use itertools::Itertools;
use ndarray::Array1;

/// Norms at or below this are not normalised, and objective values at or below this are
/// treated as zero.
pub const NORM_TOLERANCE: f64 = 1e-9;

pub fn l2_norm(v: &Array1<f64>) -> f64 {
    v.dot(v).sqrt()
}

pub fn normalise(v: &Array1<f64>) -> Array1<f64> {
    let norm = l2_norm(v);
    if norm > NORM_TOLERANCE {
        v / norm
    } else {
        v.clone()
    }
}

/// Distance between the directions of the true and the estimated objective.
pub fn parameter_error(p_true: &Array1<f64>, p_hat: &Array1<f64>) -> Result<f64> {
    if p_true.len() != p_hat.len() {
        return Err(anyhow!(
            "cannot compare parameters of dimensions {} and {}",
            p_true.len(),
            p_hat.len()
        ));
    }
    Ok(l2_norm(&(normalise(p_true) - normalise(p_hat))))
}

pub fn decision_error(x_true: &Array1<f64>, x_pred: &Array1<f64>) -> Result<f64> {
    if x_true.len() != x_pred.len() {
        return Err(anyhow!(
            "cannot compare decisions of dimensions {} and {}",
            x_true.len(),
            x_pred.len()
        ));
    }
    Ok(l2_norm(&(x_true - x_pred)))
}

/// (p^T x_true - p^T x_pred) / |p^T x_true|, judged with the true objective.
pub fn relative_objective_gap(
    p_true: &Array1<f64>,
    x_true: &Array1<f64>,
    x_pred: &Array1<f64>,
) -> Result<f64> {
    if p_true.len() != x_true.len() || p_true.len() != x_pred.len() {
        return Err(anyhow!("objective and decisions have different dimensions"));
    }
    let obj_true = p_true.dot(x_true);
    let obj_pred = p_true.dot(x_pred);
    if obj_true.abs() > NORM_TOLERANCE {
        Ok((obj_true - obj_pred) / obj_true.abs())
    } else {
        Ok(0.0)
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// The q-th percentile (0 <= q <= 100), interpolating linearly between closest ranks.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=100.0).contains(&q) {
        return None;
    }
    let sorted = values.iter().copied().sorted_by(f64::total_cmp).collect_vec();

    let rank = q / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn parameter_error_ignores_scale() {
        let e = parameter_error(&array![2.0, 5.0, 8.0], &array![4.0, 10.0, 16.0]).unwrap();
        assert!(e.abs() < 1e-12);

        let e = parameter_error(&array![1.0, 0.0], &array![0.0, 1.0]).unwrap();
        assert!((e - 2f64.sqrt()).abs() < 1e-12);

        assert!(parameter_error(&array![1.0], &array![1.0, 2.0]).is_err());
    }

    #[test]
    fn zero_vector_is_not_normalised() {
        assert_eq!(normalise(&array![0.0, 0.0]), array![0.0, 0.0]);
    }

    #[test]
    fn decision_and_objective() {
        assert!((decision_error(&array![3.0, 0.0], &array![0.0, 4.0]).unwrap() - 5.0).abs() < 1e-12);

        let gap =
            relative_objective_gap(&array![1.0, 1.0], &array![2.0, 2.0], &array![1.0, 2.0]).unwrap();
        assert!((gap - 0.25).abs() < 1e-12);

        let gap =
            relative_objective_gap(&array![1.0, 1.0], &array![0.0, 0.0], &array![1.0, 2.0]).unwrap();
        assert_eq!(gap, 0.0);
    }

    #[test]
    fn percentiles_interpolate() {
        let values = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 50.0), Some(3.0));
        assert_eq!(percentile(&values, 100.0), Some(5.0));
        assert!((percentile(&values, 10.0).unwrap() - 1.4).abs() < 1e-12);
        assert!((percentile(&values, 90.0).unwrap() - 4.6).abs() < 1e-12);
        assert_eq!(percentile(&[], 50.0), None);
        assert_eq!(mean(&values), Some(3.0));
    }
}
