//! inference — asymptotic covariance, standard errors, and Wald intervals.
//!
//! Purpose
//! -------
//! Provide post-fit uncertainty quantification from the curvature of the
//! debiased Whittle objective. The asymptotic covariance of the estimate
//! is the eigenvalue-truncated pseudoinverse of the expected Hessian
//! `EH(theta_hat)`, standard errors are the square roots of its diagonal,
//! and two-sided Wald intervals scale those standard errors by a normal
//! quantile.
//!
//! Key behaviors
//! -------------
//! - Evaluate the expected Hessian at the estimate through
//!   [`DebiasedWhittleLikelihood::evaluate_into`] (no value, no gradient,
//!   one Hessian buffer) in [`calc_covariance`].
//! - Reject non-finite curvature before any linear algebra runs: an
//!   estimate outside the model's region poisons the expected Hessian
//!   with NaN, and that surfaces as
//!   [`InferenceError::HessianNotFinite`], never as garbage intervals.
//! - Invert through symmetric eigendecomposition with eigenvalue
//!   truncation at [`EIGEN_EPS`](crate::fit::transform::EIGEN_EPS); no
//!   explicit matrix inverse is formed.
//! - Derive standard errors from the covariance diagonal in
//!   [`calc_standard_errors`] and two-sided intervals
//!   `theta_hat_i ± z * se_i` in [`wald_intervals`], with the quantile
//!   from the statrs standard normal.
//!
//! Invariants & assumptions
//! ------------------------
//! - The expected Hessian is symmetric positive semi-definite by
//!   construction, so eigenvalue truncation keeps only strictly positive
//!   curvature; directions at or below the cutoff contribute zero
//!   variance instead of exploding.
//! - The covariance diagonal is a sum of squares over retained
//!   directions, so the square roots in [`calc_standard_errors`] never
//!   see a negative input.
//! - `theta_hat` is validated by the engine (length and finiteness); a
//!   length mismatch maps to [`InferenceError::DimensionMismatch`].
//! - All routines return [`InferenceResult`] on failure rather than
//!   panicking.
//!
//! Conventions
//! -----------
//! - The estimate lives in **model space**, the same space
//!   [`FitOutcome::theta_hat`](crate::fit::FitOutcome) reports; no
//!   transform chain rule is applied here. Under a nonlinear fit
//!   transform these are the plain (untransformed) asymptotics.
//! - Intervals are returned as an `n x 2` array, column 0 the lower
//!   bound, column 1 the upper bound.
//! - Confidence levels are coverage probabilities in `(0, 1)`; the
//!   half-width uses `z = Phi^-1((1 + level) / 2)`.
//!
//! Downstream usage
//! ----------------
//! - After [`fit_whittle`](crate::fit::fit_whittle) returns an outcome,
//!   callers pass the same (or a freshly built) debiased likelihood and
//!   `outcome.theta_hat` to [`calc_standard_errors`], then feed the
//!   result to [`wald_intervals`] with their chosen level.
//! - The standard variant has no expected Hessian, so inference always
//!   runs against [`DebiasedWhittleLikelihood`], even when the point
//!   estimate came from the standard objective.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the eigen-truncated pseudoinverse against analytic
//!   inverses, truncation of near-zero curvature, the
//!   standard-error/covariance diagonal relation on a real likelihood,
//!   quantile scaling and symmetry of the intervals, and every error
//!   path (bad level, length mismatch, out-of-region estimate).
//! - The integration test runs fit-then-infer end to end and checks the
//!   intervals cover the generating parameters.

use nalgebra::DMatrix;
use ndarray::{Array1, Array2};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::fit::transform::EIGEN_EPS;
use crate::likelihood::DebiasedWhittleLikelihood;
use crate::models::SpectralModel;

pub mod errors;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::errors::{InferenceError, InferenceResult};

/// Purpose
/// -------
/// Asymptotic covariance of the estimate from the curvature of the
/// debiased Whittle objective: the eigenvalue-truncated pseudoinverse of
/// the expected Hessian `EH(theta_hat)`.
///
/// Parameters
/// ----------
/// - `likelihood`: the debiased likelihood the estimate came from (or an
///   equivalent one built on the same data). Mutated: evaluation rewrites
///   its internal storage.
/// - `theta_hat`: the fitted parameter vector in model space.
///
/// Returns
/// -------
/// The `n x n` covariance matrix, `n = theta_hat.len()`. Directions whose
/// eigenvalue is at or below the truncation cutoff contribute nothing, so
/// a singular expected Hessian yields zero variance along its null
/// directions rather than an error.
///
/// Errors
/// ------
/// - [`InferenceError::DimensionMismatch`] when `theta_hat` does not
///   match the model's parameter count.
/// - [`InferenceError::HessianNotFinite`] when the expected Hessian has a
///   non-finite entry (the estimate lies outside the model's region).
/// - [`InferenceError::EngineError`] for any other engine failure (e.g.
///   a model without autocovariance gradients).
pub fn calc_covariance<M: SpectralModel>(
    likelihood: &mut DebiasedWhittleLikelihood<M>,
    theta_hat: &Array1<f64>,
) -> InferenceResult<Array2<f64>> {
    let n = theta_hat.len();
    let mut expected_info = Array2::<f64>::zeros((n, n));
    likelihood.evaluate_into(theta_hat.view(), false, None, Some(&mut expected_info))?;
    validate_curvature(&expected_info)?;

    let mut expected_info_nalg = DMatrix::<f64>::zeros(n, n);
    fill_dmatrix(&expected_info, &mut expected_info_nalg);
    Ok(solve_for_covariance(expected_info_nalg, n))
}

/// Purpose
/// -------
/// Standard errors of the estimate: the square roots of the diagonal of
/// [`calc_covariance`].
///
/// Parameters
/// ----------
/// Same as [`calc_covariance`].
///
/// Returns
/// -------
/// A length-`n` vector of standard errors. Entries are zero along
/// truncated (unidentified) directions and strictly positive elsewhere.
///
/// Errors
/// ------
/// Everything [`calc_covariance`] can return.
///
/// Examples
/// --------
/// ```rust
/// use ndarray::{array, Array1};
/// use whittle_inference::inference::calc_standard_errors;
/// use whittle_inference::likelihood::{DebiasedWhittleLikelihood, DebiasedWhittleOptions};
/// use whittle_inference::models::OrnsteinUhlenbeck;
/// use whittle_inference::series::TimeSeries;
///
/// let values = Array1::from_shape_fn(64, |t| (0.9 * t as f64).sin());
/// let series = TimeSeries::from_column(values, 0.5)?;
/// let mut likelihood = DebiasedWhittleLikelihood::<OrnsteinUhlenbeck>::new(
///     &series,
///     &DebiasedWhittleOptions::default(),
/// )?;
///
/// let se = calc_standard_errors(&mut likelihood, &array![1.0, 1.0])?;
/// assert_eq!(se.len(), 2);
/// assert!(se.iter().all(|s| s.is_finite()));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn calc_standard_errors<M: SpectralModel>(
    likelihood: &mut DebiasedWhittleLikelihood<M>,
    theta_hat: &Array1<f64>,
) -> InferenceResult<Array1<f64>> {
    let covariance = calc_covariance(likelihood, theta_hat)?;
    let n = covariance.nrows();
    let mut se = Array1::<f64>::zeros(n);
    for i in 0..n {
        se[i] = covariance[[i, i]].sqrt();
    }
    Ok(se)
}

/// Purpose
/// -------
/// Two-sided Wald confidence intervals
/// `theta_hat_i ± z_{(1 + level) / 2} * se_i`.
///
/// Parameters
/// ----------
/// - `theta_hat`: the fitted parameter vector.
/// - `se`: matching standard errors, typically from
///   [`calc_standard_errors`].
/// - `level`: coverage probability, strictly between 0 and 1 (0.95 gives
///   the familiar 95% intervals).
///
/// Returns
/// -------
/// An `n x 2` array; row `i` holds the lower and upper bound for
/// `theta_hat[i]`.
///
/// Errors
/// ------
/// - [`InferenceError::InvalidConfidenceLevel`] when `level` is not in
///   `(0, 1)` (NaN included).
/// - [`InferenceError::DimensionMismatch`] when `se` and `theta_hat`
///   disagree in length.
pub fn wald_intervals(
    theta_hat: &Array1<f64>,
    se: &Array1<f64>,
    level: f64,
) -> InferenceResult<Array2<f64>> {
    if !(level > 0.0 && level < 1.0) {
        return Err(InferenceError::InvalidConfidenceLevel { level });
    }
    if se.len() != theta_hat.len() {
        return Err(InferenceError::DimensionMismatch {
            expected: theta_hat.len(),
            actual: se.len(),
        });
    }
    let normal = Normal::new(0.0, 1.0).expect("unit normal");
    let z = normal.inverse_cdf(0.5 + 0.5 * level);

    let mut intervals = Array2::<f64>::zeros((theta_hat.len(), 2));
    for (i, (&estimate, &se_i)) in theta_hat.iter().zip(se.iter()).enumerate() {
        let half_width = z * se_i;
        intervals[[i, 0]] = estimate - half_width;
        intervals[[i, 1]] = estimate + half_width;
    }
    Ok(intervals)
}

// ---- Helper methods ----

/// First-offender finiteness check on the expected Hessian. An estimate
/// outside the model's region poisons the curvature with NaN, which must
/// not reach the eigendecomposition.
fn validate_curvature(expected_info: &Array2<f64>) -> InferenceResult<()> {
    for ((row, col), &value) in expected_info.indexed_iter() {
        if !value.is_finite() {
            return Err(InferenceError::HessianNotFinite { row, col, value });
        }
    }
    Ok(())
}

/// Copy an `ndarray` curvature matrix into a `nalgebra::DMatrix`, column
/// by column to match `DMatrix` storage. Symmetry is preserved, not
/// enforced.
fn fill_dmatrix(expected_info: &Array2<f64>, expected_info_nalg: &mut DMatrix<f64>) {
    let n = expected_info.ncols();
    for j in 0..n {
        for i in j..n {
            if j == i {
                expected_info_nalg[(i, i)] = expected_info[[i, i]];
            } else {
                expected_info_nalg[(i, j)] = expected_info[[i, j]];
                expected_info_nalg[(j, i)] = expected_info[[j, i]];
            }
        }
    }
}

/// Eigenvalue-truncated pseudoinverse of a symmetric curvature matrix.
///
/// With `EH = Q diag(lambda) Q^T`, the covariance is
/// `Cov[i, j] = sum over k with lambda_k > cutoff of
/// Q[i, k] Q[j, k] / lambda_k`. Directions at or below the cutoff are
/// dropped, which zeroes rather than explodes the variance along
/// unidentified directions.
fn solve_for_covariance(expected_info_nalg: DMatrix<f64>, n: usize) -> Array2<f64> {
    let eigen_decomp = expected_info_nalg.symmetric_eigen();
    let q = eigen_decomp.eigenvectors;
    let eigenvals = eigen_decomp.eigenvalues;
    let mut covariance = Array2::<f64>::zeros((n, n));
    for (k, &lambda) in eigenvals.iter().enumerate() {
        if lambda > EIGEN_EPS {
            for i in 0..n {
                let coeff = q[(i, k)] / lambda;
                for j in 0..n {
                    covariance[[i, j]] += coeff * q[(j, k)];
                }
            }
        }
    }
    covariance
}

// ---- Optional convenience prelude for downstream crates ------------------
//
// Downstream crates can `use whittle_inference::inference::prelude::*;` to
// import the primary inference surface in a single line.

pub mod prelude {
    pub use super::errors::{InferenceError, InferenceResult};
    pub use super::{calc_covariance, calc_standard_errors, wald_intervals};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::likelihood::DebiasedWhittleOptions;
    use crate::models::OrnsteinUhlenbeck;
    use crate::series::TimeSeries;
    use nalgebra::DVector;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The eigen-truncated pseudoinverse against analytic inverses, with
    //   and without truncated directions.
    // - The standard-error/covariance diagonal relation on a real debiased
    //   likelihood.
    // - Wald interval construction: quantile scaling, symmetry, and input
    //   rejection.
    // - Error paths: misshapen estimates and out-of-region estimates.
    //
    // They intentionally DO NOT cover:
    // - Fit-then-infer round trips on simulated data (the integration test
    //   does that).
    // -------------------------------------------------------------------------

    /// Deterministic univariate series used by the engine-backed tests.
    fn short_series() -> TimeSeries {
        let values = Array1::from_shape_fn(48, |t| {
            let time = t as f64;
            (0.9 * time).sin() + 0.5 * (2.3 * time).cos()
        });
        TimeSeries::from_column(values, 0.5).expect("synthetic series is valid")
    }

    #[test]
    // Purpose
    // -------
    // Verify that the pseudoinverse reconstruction matches the analytic
    // inverse of a well-conditioned diagonal curvature matrix.
    //
    // Given
    // -----
    // - EH = diag(4, 1), whose inverse is diag(0.25, 1).
    //
    // Expect
    // ------
    // - The covariance equals diag(0.25, 1) with vanishing off-diagonals.
    fn covariance_matches_the_analytic_inverse() {
        // Arrange
        let curvature = DMatrix::<f64>::from_diagonal(&DVector::from_vec(vec![4.0, 1.0]));

        // Act
        let covariance = solve_for_covariance(curvature, 2);

        // Assert
        assert!((covariance[[0, 0]] - 0.25).abs() < 1e-12);
        assert!((covariance[[1, 1]] - 1.0).abs() < 1e-12);
        assert!(covariance[[0, 1]].abs() < 1e-12);
        assert!(covariance[[1, 0]].abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Verify that curvature directions at or below the eigenvalue cutoff
    // are truncated instead of amplified.
    //
    // Given
    // -----
    // - EH = diag(4, 1e-12); the second eigenvalue sits below the cutoff.
    //
    // Expect
    // ------
    // - The identified direction inverts normally; the degenerate one
    //   contributes zero variance rather than 1e12.
    fn near_zero_curvature_is_truncated_not_amplified() {
        // Arrange
        let curvature = DMatrix::<f64>::from_diagonal(&DVector::from_vec(vec![4.0, 1e-12]));

        // Act
        let covariance = solve_for_covariance(curvature, 2);

        // Assert
        assert!((covariance[[0, 0]] - 0.25).abs() < 1e-12);
        assert!(covariance[[1, 1]].abs() < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Check the standard-error/covariance relation on a real debiased
    // likelihood: SEs are the square roots of the covariance diagonal and
    // are strictly positive at an identified interior point.
    //
    // Given
    // -----
    // - A debiased OU likelihood on the deterministic series, evaluated
    //   at [1.0, 1.0].
    //
    // Expect
    // ------
    // - se[i] == sqrt(cov[i, i]) for both parameters, all finite and
    //   positive.
    fn standard_errors_are_square_roots_of_the_covariance_diagonal() {
        // Arrange
        let series = short_series();
        let mut likelihood = DebiasedWhittleLikelihood::<OrnsteinUhlenbeck>::new(
            &series,
            &DebiasedWhittleOptions::default(),
        )
        .expect("series and options are valid");
        let theta_hat = array![1.0, 1.0];

        // Act
        let covariance =
            calc_covariance(&mut likelihood, &theta_hat).expect("curvature is finite");
        let se = calc_standard_errors(&mut likelihood, &theta_hat).expect("curvature is finite");

        // Assert
        assert_eq!(se.len(), 2);
        for i in 0..2 {
            assert!(se[i].is_finite() && se[i] > 0.0, "se[{i}] = {}", se[i]);
            assert!((se[i] - covariance[[i, i]].sqrt()).abs() < 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that interval half-widths scale the standard errors by the
    // normal quantile and sit symmetrically around the estimate.
    //
    // Given
    // -----
    // - theta_hat = [1, 2], se = [0.1, 0.2], level = 0.95.
    //
    // Expect
    // ------
    // - (upper - estimate) / se recovers z_{0.975} = 1.95996... for every
    //   row, and lower mirrors upper around the estimate.
    fn wald_intervals_scale_by_the_normal_quantile() {
        // Arrange
        let theta_hat = array![1.0, 2.0];
        let se = array![0.1, 0.2];

        // Act
        let intervals = wald_intervals(&theta_hat, &se, 0.95).expect("inputs are valid");

        // Assert
        let z = 1.959963984540054;
        for i in 0..2 {
            let upper_width = intervals[[i, 1]] - theta_hat[i];
            let lower_width = theta_hat[i] - intervals[[i, 0]];
            assert!((upper_width / se[i] - z).abs() < 1e-6, "row {i}");
            assert!((upper_width - lower_width).abs() < 1e-12, "row {i}");
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify the interval input checks: levels outside (0, 1) and
    // mismatched vector lengths are rejected with their own variants.
    //
    // Given
    // -----
    // - Levels 0, 1, -0.3, 1.7, and NaN; a standard-error vector one entry
    //   short.
    //
    // Expect
    // ------
    // - InvalidConfidenceLevel for every bad level; DimensionMismatch with
    //   the offending lengths for the short vector.
    fn wald_intervals_reject_bad_levels_and_mismatched_lengths() {
        // Arrange
        let theta_hat = array![1.0, 2.0];
        let se = array![0.1, 0.2];

        // Act / Assert
        for level in [0.0, 1.0, -0.3, 1.7, f64::NAN] {
            let result = wald_intervals(&theta_hat, &se, level);
            assert!(
                matches!(result, Err(InferenceError::InvalidConfidenceLevel { .. })),
                "level = {level}"
            );
        }
        let short_se = array![0.1];
        assert!(matches!(
            wald_intervals(&theta_hat, &short_se, 0.9),
            Err(InferenceError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Verify that a misshapen estimate surfaces as the inference-level
    // dimension mismatch rather than a generic engine string.
    //
    // Given
    // -----
    // - A three-entry estimate against the two-parameter OU family.
    //
    // Expect
    // ------
    // - DimensionMismatch { expected: 2, actual: 3 }.
    fn a_misshapen_estimate_maps_to_dimension_mismatch() {
        // Arrange
        let series = short_series();
        let mut likelihood = DebiasedWhittleLikelihood::<OrnsteinUhlenbeck>::new(
            &series,
            &DebiasedWhittleOptions::default(),
        )
        .expect("series and options are valid");
        let theta_hat = array![1.0, 1.0, 1.0];

        // Act
        let result = calc_covariance(&mut likelihood, &theta_hat);

        // Assert
        assert!(matches!(
            result,
            Err(InferenceError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Verify that an estimate outside the model's region is reported as
    // non-finite curvature instead of silently inverting NaN.
    //
    // Given
    // -----
    // - OU with a negative mean-reversion rate, whose synthesized spectrum
    //   fails positivity on the grid.
    //
    // Expect
    // ------
    // - HessianNotFinite from both the covariance and the standard-error
    //   entry points.
    fn an_out_of_region_estimate_reports_non_finite_curvature() {
        // Arrange
        let series = short_series();
        let mut likelihood = DebiasedWhittleLikelihood::<OrnsteinUhlenbeck>::new(
            &series,
            &DebiasedWhittleOptions::default(),
        )
        .expect("series and options are valid");
        let theta_hat = array![1.0, -1.0];

        // Act / Assert
        assert!(matches!(
            calc_covariance(&mut likelihood, &theta_hat),
            Err(InferenceError::HessianNotFinite { .. })
        ));
        assert!(matches!(
            calc_standard_errors(&mut likelihood, &theta_hat),
            Err(InferenceError::HessianNotFinite { .. })
        ));
    }
}
