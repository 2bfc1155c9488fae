//! Weighted least squares solver.
//!
//! The harmonic (Fourier component) extractor solves small linear regression
//! problems of the form:
//!
//! ```text
//! minimize Σ w_i (y_i - x_i^T β)^2
//! ```
//!
//! where `x_i` holds a constant term plus one sine and one cosine column per
//! harmonic of the detected frequency.
//!
//! Implementation choices:
//! - Rows are scaled by `sqrt(w_i)` and an ordinary least squares problem is solved.
//! - SVD is used so tall design matrices (many observations, few columns) and
//!   nearly collinear columns (sparse phase coverage) are handled robustly.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Poorly sampled phases can make harmonic columns nearly collinear, so try
    // progressively looser singular value cutoffs before giving up.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve `minimize Σ w_i (y_i - x_i^T β)^2` by row scaling.
///
/// `rows` is the row-major design matrix with `cols` columns. Returns `None` on
/// shape mismatch, non-positive weights, or an unsolvable system.
pub fn solve_weighted_least_squares(
    rows: &[f64],
    cols: usize,
    y: &[f64],
    w: &[f64],
) -> Option<Vec<f64>> {
    let n = y.len();
    if cols == 0 || rows.len() != n * cols || w.len() != n {
        return None;
    }
    if w.iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return None;
    }

    let mut xw = DMatrix::<f64>::zeros(n, cols);
    let mut yw = DVector::<f64>::zeros(n);
    for i in 0..n {
        let sw = w[i].sqrt();
        for j in 0..cols {
            xw[(i, j)] = rows[i * cols + j] * sw;
        }
        yw[i] = y[i] * sw;
    }

    solve_least_squares(&xw, &yw).map(|beta| beta.iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn weighted_solve_ignores_heavily_downweighted_outlier() {
        // y = 1 + x with one corrupted point carrying a tiny weight.
        let rows = [1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0];
        let y = [1.0, 2.0, 3.0, 100.0];
        let w = [1.0, 1.0, 1.0, 1e-12];

        let beta = solve_weighted_least_squares(&rows, 2, &y, &w).unwrap();
        assert!((beta[0] - 1.0).abs() < 1e-4);
        assert!((beta[1] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn weighted_solve_rejects_bad_shapes() {
        assert!(solve_weighted_least_squares(&[1.0, 2.0], 2, &[1.0, 2.0], &[1.0, 1.0]).is_none());
        assert!(solve_weighted_least_squares(&[1.0, 1.0], 1, &[1.0, 2.0], &[1.0, 0.0]).is_none());
    }
}
