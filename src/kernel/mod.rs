// src/kernel/mod.rs

//! The numerical kernel of the solver.
//! Field storage types and the norms used to measure convergence.

use ndarray::{Array1, Array2, ArrayBase, Data, Dimension, Zip};

// Type aliases for clarity throughout the engine.
pub type Field2 = Array2<f64>;
pub type FieldVec = Array1<f64>;

/// Maximum absolute elementwise difference between two arrays of equal shape.
///
/// Returns `None` on a shape mismatch. A NaN anywhere in the difference is
/// propagated instead of being swallowed by the max fold, so callers can
/// detect numeric blow-ups.
pub fn max_abs_diff<S1, S2, D>(a: &ArrayBase<S1, D>, b: &ArrayBase<S2, D>) -> Option<f64>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    if a.shape() != b.shape() {
        return None;
    }
    let mut max = 0.0_f64;
    let mut nan = false;
    Zip::from(a).and(b).for_each(|&x, &y| {
        let d = (x - y).abs();
        if d.is_nan() {
            nan = true;
        } else if d > max {
            max = d;
        }
    });
    Some(if nan { f64::NAN } else { max })
}

/// L-infinity norm of a single array, with the same NaN propagation as
/// [`max_abs_diff`].
pub fn linf_norm<S, D>(a: &ArrayBase<S, D>) -> f64
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    a.iter().fold(0.0_f64, |acc, &v| {
        if acc.is_nan() || v.is_nan() {
            f64::NAN
        } else {
            acc.max(v.abs())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_max_abs_diff() {
        let a = array![1.0, -2.0, 3.0];
        let b = array![1.5, 2.0, 3.0];
        assert_eq!(max_abs_diff(&a, &b), Some(4.0));
    }

    #[test]
    fn test_max_abs_diff_mismatched_lengths() {
        let a = array![1.0, 2.0];
        let b = array![4.0, 5.0, 6.0];
        assert!(max_abs_diff(&a, &b).is_none());
    }

    #[test]
    fn test_max_abs_diff_propagates_nan() {
        let a = array![[0.0, f64::INFINITY], [1.0, 1.0]];
        let b = array![[0.0, f64::INFINITY], [1.0, 9.0]];
        assert!(max_abs_diff(&a, &b).unwrap().is_nan());
    }

    #[test]
    fn test_linf_norm() {
        let a = array![[0.5, -7.0], [2.0, 3.0]];
        assert_eq!(linf_norm(&a), 7.0);
        assert_eq!(linf_norm(&FieldVec::zeros(4)), 0.0);
        assert!(linf_norm(&array![1.0, f64::NAN, 2.0]).is_nan());
    }
}
