//! Purpose
//! -------
//! The frequency walk that reduces populated storage plus an observed
//! periodogram into the Whittle quantities: the scalar value
//! `sum_omega log det S + tr(S^-1 I)`, its gradient, and either the
//! observed Hessian (second derivatives of the spectrum) or the expected
//! Hessian (Fisher information, first derivatives only).
//!
//! Key behaviors
//! -------------
//! - One pass per evaluation: the spectrum is factored once per frequency
//!   and every requested output reuses that factorization.
//! - Univariate data takes a scalar fast path with no matrix work at all.
//! - A spectrum that is not positive definite at some frequency makes the
//!   value infinite and fills the requested derivative buffers with NaN;
//!   it is never an error.
//!
//! Invariants & assumptions
//! ------------------------
//! - Storage was populated for the same frequency count as the
//!   periodogram and with the derivative buffers the request needs:
//!   gradients whenever a gradient or Hessian is wanted, second
//!   derivatives only for [`HessianKind::Observed`].
//! - Output buffers are zeroed here before accumulation; only the lower
//!   triangle of the Hessian is walked and the upper triangle is mirrored
//!   at the end.
//! - The complex Cholesky factorization does not fail on indefinite
//!   input; it produces pivots with non-positive real part instead, so
//!   pivots are checked explicitly.
//!
//! Conventions
//! -----------
//! - The value is the negated log-likelihood up to constants: fitting
//!   minimizes it.
//! - `Observed` reads the second-derivative buffers; `Expected` computes
//!   `sum_omega Re tr(S^-1 dS_j S^-1 dS_k)`, which is positive
//!   semi-definite by construction.
//!
//! Downstream usage
//! ----------------
//! - [`crate::likelihood::WhittleLikelihood`] pairs this walk with
//!   spectral population and [`HessianKind::Observed`];
//!   [`crate::likelihood::DebiasedWhittleLikelihood`] pairs it with
//!   expected-periodogram population and [`HessianKind::Expected`].
//!
//! Testing notes
//! -------------
//! - Gradients and Hessians are pinned against central finite differences
//!   of the walk itself, and the matrix path against a block-diagonal
//!   embedding of the scalar path.

use nalgebra::{Cholesky, DMatrix, Dyn};
use ndarray::{Array1, Array2};
use num_complex::Complex64;

use crate::likelihood::hermitian::{expand_hermitian, trace_prod3_re, trace_prod_re, trace_re};
use crate::likelihood::storage::{MatScratch, Storage};

/// Which second-derivative matrix a Hessian request means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HessianKind {
    /// Exact second derivative of the value; needs the model's
    /// second-derivative buffers.
    Observed,
    /// Fisher information; built from first derivatives alone.
    Expected,
}

/// Purpose
/// -------
/// Walk every frequency once and accumulate the requested likelihood
/// sums.
///
/// Parameters
/// ----------
/// - `storage`: populated buffers for the current parameter vector.
/// - `periodogram`: packed observed periodogram, `num_freqs` rows.
/// - `dim`, `nparams`: process dimension and parameter count.
/// - `kind`: which Hessian the buffer in `hessian` receives.
/// - `gradient`, `hessian`: optional output buffers, shape-checked by the
///   caller; zeroed and then accumulated in place.
///
/// Returns
/// -------
/// - The likelihood value. It falls out of the shared intermediates, so
///   it is computed even when the caller only wants derivatives.
///
/// Invariants
/// ----------
/// - `f64::INFINITY` with NaN-filled buffers when the spectrum fails to
///   factor at any frequency.
/// - The returned Hessian is symmetric: the lower triangle is computed
///   and mirrored.
pub(crate) fn likelihood_sums(
    storage: &mut Storage,
    periodogram: &Array2<Complex64>,
    dim: usize,
    nparams: usize,
    kind: HessianKind,
    mut gradient: Option<&mut Array1<f64>>,
    mut hessian: Option<&mut Array2<f64>>,
) -> f64 {
    if let Some(grad) = gradient.as_mut() {
        grad.fill(0.0);
    }
    if let Some(hess) = hessian.as_mut() {
        hess.fill(0.0);
    }

    let value = if dim == 1 {
        scalar_sums(
            storage,
            periodogram,
            nparams,
            kind,
            gradient.as_mut().map(|grad| &mut **grad),
            hessian.as_mut().map(|hess| &mut **hess),
        )
    } else {
        // Detach the matrix scratch so storage stays readable next to it.
        let mut mats = std::mem::take(&mut storage.mats);
        let value = matrix_sums(
            storage,
            &mut mats,
            periodogram,
            dim,
            nparams,
            kind,
            gradient.as_mut().map(|grad| &mut **grad),
            hessian.as_mut().map(|hess| &mut **hess),
        );
        storage.mats = mats;
        value
    };

    if let Some(hess) = hessian.as_mut() {
        for j in 0..nparams {
            for k in 0..j {
                hess[[k, j]] = hess[[j, k]];
            }
        }
    }
    value
}

/// Univariate walk on plain floats.
///
/// With `a_k = dS_k / S` and `b = I / S` the per-frequency terms are
/// `log S + b`, gradient `a_k (1 - b)`, observed Hessian
/// `(d2S_jk / S)(1 - b) - a_j a_k (1 - 2 b)`, expected Hessian
/// `a_j a_k`.
fn scalar_sums(
    storage: &Storage,
    periodogram: &Array2<Complex64>,
    nparams: usize,
    kind: HessianKind,
    mut gradient: Option<&mut Array1<f64>>,
    mut hessian: Option<&mut Array2<f64>>,
) -> f64 {
    let need_derivs = gradient.is_some() || hessian.is_some();
    let mut value = 0.0;
    for w in 0..periodogram.nrows() {
        let spectrum = storage.sdf_at(w)[0].re;
        if !(spectrum > 0.0) {
            poison(gradient, hessian);
            return f64::INFINITY;
        }
        let ratio = periodogram[[w, 0]].re / spectrum;
        value += spectrum.ln() + ratio;
        if !need_derivs {
            continue;
        }

        if let Some(grad) = gradient.as_mut() {
            for k in 0..nparams {
                let scaled = storage.sdf_grad_at(k, w)[0].re / spectrum;
                grad[k] += scaled * (1.0 - ratio);
            }
        }
        if let Some(hess) = hessian.as_mut() {
            for j in 0..nparams {
                let scaled_j = storage.sdf_grad_at(j, w)[0].re / spectrum;
                for k in 0..=j {
                    let scaled_k = storage.sdf_grad_at(k, w)[0].re / spectrum;
                    hess[[j, k]] += match kind {
                        HessianKind::Observed => {
                            let second = storage.sdf_hess_at(j, k, w)[0].re / spectrum;
                            second * (1.0 - ratio) - scaled_j * scaled_k * (1.0 - 2.0 * ratio)
                        }
                        HessianKind::Expected => scaled_j * scaled_k,
                    };
                }
            }
        }
    }
    value
}

/// Multivariate walk through one Cholesky factorization per frequency.
///
/// Writes `A_k = S^-1 dS_k` into the scratch and forms every trace from
/// those solves: value `log det S + tr B` with `B = S^-1 I`, gradient
/// `tr A_k - tr(A_k B)`, observed Hessian
/// `tr(H - H B) - tr(A_j A_k) + tr(A_j A_k B) + tr(A_k A_j B)` with
/// `H = S^-1 d2S_jk`, expected Hessian `tr(A_j A_k)`.
#[allow(clippy::too_many_arguments)]
fn matrix_sums(
    storage: &Storage,
    mats: &mut MatScratch,
    periodogram: &Array2<Complex64>,
    dim: usize,
    nparams: usize,
    kind: HessianKind,
    mut gradient: Option<&mut Array1<f64>>,
    mut hessian: Option<&mut Array2<f64>>,
) -> f64 {
    let need_derivs = gradient.is_some() || hessian.is_some();
    let mut value = 0.0;
    for w in 0..periodogram.nrows() {
        expand_hermitian(storage.sdf_at(w).into(), dim, &mut mats.s);
        let spectrum = std::mem::replace(&mut mats.s, DMatrix::zeros(0, 0));
        let chol = match Cholesky::new(spectrum) {
            Some(chol) => chol,
            None => {
                mats.s = DMatrix::zeros(dim, dim);
                poison(gradient, hessian);
                return f64::INFINITY;
            }
        };
        let log_det = match positive_log_det(&chol, dim) {
            Some(log_det) => log_det,
            None => {
                mats.s = chol.unpack_dirty();
                poison(gradient, hessian);
                return f64::INFINITY;
            }
        };

        expand_hermitian(periodogram.row(w), dim, &mut mats.b);
        chol.solve_mut(&mut mats.b);
        value += log_det + trace_re(&mats.b);

        if need_derivs {
            for k in 0..nparams {
                expand_hermitian(storage.sdf_grad_at(k, w).into(), dim, &mut mats.a_mats[k]);
                chol.solve_mut(&mut mats.a_mats[k]);
            }
            if let Some(grad) = gradient.as_mut() {
                for k in 0..nparams {
                    grad[k] +=
                        trace_re(&mats.a_mats[k]) - trace_prod_re(&mats.a_mats[k], &mats.b);
                }
            }
            if let Some(hess) = hessian.as_mut() {
                match kind {
                    HessianKind::Observed => {
                        for j in 0..nparams {
                            for k in 0..=j {
                                expand_hermitian(
                                    storage.sdf_hess_at(j, k, w).into(),
                                    dim,
                                    &mut mats.h,
                                );
                                chol.solve_mut(&mut mats.h);
                                let second = trace_re(&mats.h) - trace_prod_re(&mats.h, &mats.b);
                                let cross =
                                    trace_prod_re(&mats.a_mats[j], &mats.a_mats[k]);
                                let mixed =
                                    trace_prod3_re(&mats.a_mats[j], &mats.a_mats[k], &mats.b)
                                        + trace_prod3_re(
                                            &mats.a_mats[k],
                                            &mats.a_mats[j],
                                            &mats.b,
                                        );
                                hess[[j, k]] += second - cross + mixed;
                            }
                        }
                    }
                    HessianKind::Expected => {
                        for j in 0..nparams {
                            for k in 0..=j {
                                hess[[j, k]] +=
                                    trace_prod_re(&mats.a_mats[j], &mats.a_mats[k]);
                            }
                        }
                    }
                }
            }
        }

        // Hand the allocation back for the next frequency.
        mats.s = chol.unpack_dirty();
    }
    value
}

/// `log det S` from the Cholesky factor, or `None` when a pivot is not
/// strictly positive real.
fn positive_log_det(chol: &Cholesky<Complex64, Dyn>, dim: usize) -> Option<f64> {
    let factor = chol.l_dirty();
    let mut log_det = 0.0;
    for r in 0..dim {
        let pivot = factor[(r, r)].re;
        if !(pivot > 0.0) {
            return None;
        }
        log_det += pivot.ln();
    }
    Some(2.0 * log_det)
}

/// Partial sums are meaningless once the spectrum fails to factor; the
/// requested buffers report NaN throughout.
fn poison(gradient: Option<&mut Array1<f64>>, hessian: Option<&mut Array2<f64>>) {
    if let Some(grad) = gradient {
        grad.fill(f64::NAN);
    }
    if let Some(hess) = hessian {
        hess.fill(f64::NAN);
    }
}

#[cfg(test)]
mod tests {
    //! Scope
    //! -----
    //! Covers:
    //! - The scalar walk against a direct formula and central finite
    //!   differences of itself (gradient and observed Hessian).
    //! - The matrix walk against a block-diagonal embedding of the scalar
    //!   walk and against finite differences with complex cross terms.
    //! - The expected Hessian against explicit inverse products.
    //! - Positive-definiteness failures on both paths.
    //!
    //! Intentionally does NOT cover:
    //! - Validation and population requests (likelihood object tests).
    //! - Reference likelihood values on real data (integration tests).
    use super::*;
    use crate::likelihood::errors::WhittleResult;
    use crate::likelihood::storage::EvalRequest;
    use crate::models::{CorrelatedOrnsteinUhlenbeck, OrnsteinUhlenbeck, SpectralModel};
    use ndarray::ArrayView1;

    const TOL: f64 = 1e-10;
    const FD_STEP: f64 = 1e-6;
    const FD_TOL: f64 = 1e-5;

    /// Storage populated for `model` over `omega` with the given request.
    fn populated<M: SpectralModel>(
        model: &M,
        omega: &Array1<f64>,
        delta: f64,
        req: EvalRequest,
    ) -> Storage {
        let mut storage = Storage::spectral(M::DIM, M::NPARAMS, omega.len());
        storage
            .populate_spectral(model, omega.view(), delta, req)
            .expect("population succeeds when the model has the needed hooks");
        storage
    }

    /// Positive synthetic periodogram for univariate walks.
    fn scalar_periodogram(num_freqs: usize) -> Array2<Complex64> {
        Array2::from_shape_fn((num_freqs, 1), |(w, _)| {
            Complex64::new(0.35 + 0.06 * w as f64, 0.0)
        })
    }

    /// Hermitian synthetic periodogram with complex cross terms.
    fn bivariate_periodogram(num_freqs: usize) -> Array2<Complex64> {
        Array2::from_shape_fn((num_freqs, 3), |(w, entry)| match entry {
            0 => Complex64::new(0.5 + 0.04 * w as f64, 0.0),
            1 => Complex64::new(0.08 + 0.01 * w as f64, 0.05 - 0.007 * w as f64),
            _ => Complex64::new(0.4 + 0.03 * w as f64, 0.0),
        })
    }

    /// Value-only walk for an OU model, used as the FD target.
    fn ou_value(
        params: [f64; 2],
        omega: &Array1<f64>,
        delta: f64,
        periodogram: &Array2<Complex64>,
    ) -> f64 {
        let model = OrnsteinUhlenbeck::new(params[0], params[1]);
        let mut storage =
            populated(&model, omega, delta, EvalRequest { gradient: false, hessian: false });
        likelihood_sums(&mut storage, periodogram, 1, 2, HessianKind::Observed, None, None)
    }

    /// Value-and-gradient walk for an OU model, used as the Hessian FD
    /// target.
    fn ou_gradient(
        params: [f64; 2],
        omega: &Array1<f64>,
        delta: f64,
        periodogram: &Array2<Complex64>,
    ) -> Array1<f64> {
        let model = OrnsteinUhlenbeck::new(params[0], params[1]);
        let mut storage =
            populated(&model, omega, delta, EvalRequest { gradient: true, hessian: false });
        let mut grad = Array1::zeros(2);
        likelihood_sums(
            &mut storage,
            periodogram,
            1,
            2,
            HessianKind::Observed,
            Some(&mut grad),
            None,
        );
        grad
    }

    /// Value-only walk for a correlated OU model.
    fn correlated_value(
        params: [f64; 3],
        omega: &Array1<f64>,
        delta: f64,
        periodogram: &Array2<Complex64>,
    ) -> f64 {
        let model = CorrelatedOrnsteinUhlenbeck::new(params[0], params[1], params[2]);
        let mut storage =
            populated(&model, omega, delta, EvalRequest { gradient: false, hessian: false });
        likelihood_sums(&mut storage, periodogram, 2, 3, HessianKind::Expected, None, None)
    }

    /// Two independent OU components on the diagonal; parameters
    /// `[sigma_a, theta_a, sigma_b, theta_b]`. Embeds two scalar walks
    /// into one matrix walk.
    struct DiagonalPair {
        a: OrnsteinUhlenbeck,
        b: OrnsteinUhlenbeck,
    }

    impl SpectralModel for DiagonalPair {
        const DIM: usize = 2;
        const NPARAMS: usize = 4;
        const NAME: &'static str = "diagonal OU pair";

        fn from_params(theta: ArrayView1<'_, f64>) -> Self {
            DiagonalPair {
                a: OrnsteinUhlenbeck::new(theta[0], theta[1]),
                b: OrnsteinUhlenbeck::new(theta[2], theta[3]),
            }
        }

        fn add_sdf(&self, out: &mut [Complex64], omega: f64) {
            self.a.add_sdf(&mut out[0..1], omega);
            self.b.add_sdf(&mut out[2..3], omega);
        }

        fn add_acv(&self, _out: &mut [f64], _tau: f64) {}

        fn add_sdf_grad(&self, out: &mut [Complex64], k: usize, omega: f64) -> WhittleResult<()> {
            if k < 2 {
                self.a.add_sdf_grad(&mut out[0..1], k, omega)
            } else {
                self.b.add_sdf_grad(&mut out[2..3], k - 2, omega)
            }
        }

        fn add_sdf_hess(
            &self,
            out: &mut [Complex64],
            j: usize,
            k: usize,
            omega: f64,
        ) -> WhittleResult<()> {
            match (j < 2, k < 2) {
                (true, true) => self.a.add_sdf_hess(&mut out[0..1], j, k, omega),
                (false, false) => self.b.add_sdf_hess(&mut out[2..3], j - 2, k - 2, omega),
                // Pairs across the two components are zero.
                _ => Ok(()),
            }
        }
    }

    /// Identically zero spectrum: the factorization cannot start.
    struct ZeroSpectrum;

    impl SpectralModel for ZeroSpectrum {
        const DIM: usize = 2;
        const NPARAMS: usize = 1;
        const NAME: &'static str = "zero spectrum";

        fn from_params(_theta: ArrayView1<'_, f64>) -> Self {
            ZeroSpectrum
        }

        fn add_sdf(&self, _out: &mut [Complex64], _omega: f64) {}

        fn add_acv(&self, _out: &mut [f64], _tau: f64) {}

        fn add_sdf_grad(&self, _out: &mut [Complex64], _k: usize, _omega: f64) -> WhittleResult<()> {
            Ok(())
        }
    }

    /// Symmetric but indefinite spectrum `[[1, 2], [2, 1]]`: the complex
    /// factorization runs through and leaves a pivot with zero real part.
    struct IndefiniteSpectrum;

    impl SpectralModel for IndefiniteSpectrum {
        const DIM: usize = 2;
        const NPARAMS: usize = 1;
        const NAME: &'static str = "indefinite spectrum";

        fn from_params(_theta: ArrayView1<'_, f64>) -> Self {
            IndefiniteSpectrum
        }

        fn add_sdf(&self, out: &mut [Complex64], _omega: f64) {
            out[0].re += 1.0;
            out[1].re += 2.0;
            out[2].re += 1.0;
        }

        fn add_acv(&self, _out: &mut [f64], _tau: f64) {}

        fn add_sdf_grad(&self, _out: &mut [Complex64], _k: usize, _omega: f64) -> WhittleResult<()> {
            Ok(())
        }
    }

    /// Identity spectrum: the healthy counterpart with the same shape as
    /// the failing models above.
    struct IdentitySpectrum;

    impl SpectralModel for IdentitySpectrum {
        const DIM: usize = 2;
        const NPARAMS: usize = 1;
        const NAME: &'static str = "identity spectrum";

        fn from_params(_theta: ArrayView1<'_, f64>) -> Self {
            IdentitySpectrum
        }

        fn add_sdf(&self, out: &mut [Complex64], _omega: f64) {
            out[0].re += 1.0;
            out[2].re += 1.0;
        }

        fn add_acv(&self, _out: &mut [f64], _tau: f64) {}
    }

    /// Purpose: the scalar walk reproduces the direct per-frequency
    /// formula.
    /// Given: OU over six frequencies with a synthetic periodogram.
    /// Expect: value equals sum of log S + I / S over the populated sdf.
    #[test]
    fn scalar_value_matches_direct_sum() {
        // Arrange
        let model = OrnsteinUhlenbeck::new(1.2, 0.8);
        let omega = Array1::linspace(-2.0, 2.3, 6);
        let delta = 0.7;
        let periodogram = scalar_periodogram(6);
        let mut storage =
            populated(&model, &omega, delta, EvalRequest { gradient: false, hessian: false });
        let mut direct = 0.0;
        for w in 0..6 {
            let spectrum = storage.sdf_at(w)[0].re;
            direct += spectrum.ln() + periodogram[[w, 0]].re / spectrum;
        }

        // Act
        let value =
            likelihood_sums(&mut storage, &periodogram, 1, 2, HessianKind::Observed, None, None);

        // Assert
        assert!((value - direct).abs() < TOL, "{value} vs {direct}");
    }

    /// Purpose: the scalar gradient matches central finite differences of
    /// the walk itself.
    /// Given: OU at [1.2, 0.8] over eight frequencies.
    /// Expect: both components within FD tolerance.
    #[test]
    fn scalar_gradient_matches_finite_differences() {
        // Arrange
        let params = [1.2, 0.8];
        let omega = Array1::linspace(-2.4, 2.8, 8);
        let delta = 0.6;
        let periodogram = scalar_periodogram(8);
        let model = OrnsteinUhlenbeck::new(params[0], params[1]);
        let mut storage =
            populated(&model, &omega, delta, EvalRequest { gradient: true, hessian: false });
        let mut grad = Array1::zeros(2);

        // Act
        let value = likelihood_sums(
            &mut storage,
            &periodogram,
            1,
            2,
            HessianKind::Observed,
            Some(&mut grad),
            None,
        );

        // Assert: same value as the value-only walk, FD-matching gradient.
        assert!((value - ou_value(params, &omega, delta, &periodogram)).abs() < TOL);
        for k in 0..2 {
            let mut up = params;
            let mut down = params;
            up[k] += FD_STEP;
            down[k] -= FD_STEP;
            let fd = (ou_value(up, &omega, delta, &periodogram)
                - ou_value(down, &omega, delta, &periodogram))
                / (2.0 * FD_STEP);
            assert!((grad[k] - fd).abs() < FD_TOL, "k = {k}: {} vs {fd}", grad[k]);
        }
    }

    /// Purpose: the scalar observed Hessian matches central finite
    /// differences of the analytic gradient and comes back symmetric.
    /// Given: OU at [1.2, 0.8] over eight frequencies.
    /// Expect: all entries within FD tolerance; H[0,1] == H[1,0].
    #[test]
    fn scalar_observed_hessian_matches_finite_differences() {
        // Arrange
        let params = [1.2, 0.8];
        let omega = Array1::linspace(-2.4, 2.8, 8);
        let delta = 0.6;
        let periodogram = scalar_periodogram(8);
        let model = OrnsteinUhlenbeck::new(params[0], params[1]);
        let mut storage =
            populated(&model, &omega, delta, EvalRequest { gradient: true, hessian: true });
        let mut hess = Array2::zeros((2, 2));

        // Act
        likelihood_sums(
            &mut storage,
            &periodogram,
            1,
            2,
            HessianKind::Observed,
            None,
            Some(&mut hess),
        );

        // Assert
        assert_eq!(hess[[0, 1]], hess[[1, 0]]);
        for j in 0..2 {
            let mut up = params;
            let mut down = params;
            up[j] += FD_STEP;
            down[j] -= FD_STEP;
            let high = ou_gradient(up, &omega, delta, &periodogram);
            let low = ou_gradient(down, &omega, delta, &periodogram);
            for k in 0..2 {
                let fd = (high[k] - low[k]) / (2.0 * FD_STEP);
                assert!(
                    (hess[[j, k]] - fd).abs() < FD_TOL,
                    "pair ({j}, {k}): {} vs {fd}",
                    hess[[j, k]]
                );
            }
        }
    }

    /// Purpose: the scalar expected Hessian is the Fisher sum of scaled
    /// gradient products.
    /// Given: OU at [1.2, 0.8] over eight frequencies.
    /// Expect: each entry equals sum_w dS_j dS_k / S^2; the matrix is
    /// positive semi-definite.
    #[test]
    fn scalar_expected_hessian_matches_fisher_sum() {
        // Arrange
        let model = OrnsteinUhlenbeck::new(1.2, 0.8);
        let omega = Array1::linspace(-2.4, 2.8, 8);
        let periodogram = scalar_periodogram(8);
        let mut storage =
            populated(&model, &omega, 0.6, EvalRequest { gradient: true, hessian: false });
        let mut direct = Array2::<f64>::zeros((2, 2));
        for w in 0..8 {
            let spectrum = storage.sdf_at(w)[0].re;
            for j in 0..2 {
                for k in 0..2 {
                    direct[[j, k]] += storage.sdf_grad_at(j, w)[0].re
                        * storage.sdf_grad_at(k, w)[0].re
                        / (spectrum * spectrum);
                }
            }
        }
        let mut hess = Array2::zeros((2, 2));

        // Act
        likelihood_sums(
            &mut storage,
            &periodogram,
            1,
            2,
            HessianKind::Expected,
            None,
            Some(&mut hess),
        );

        // Assert
        for j in 0..2 {
            for k in 0..2 {
                assert!(
                    (hess[[j, k]] - direct[[j, k]]).abs() < TOL,
                    "pair ({j}, {k})"
                );
            }
        }
        assert!(hess[[0, 0]] >= 0.0 && hess[[1, 1]] >= 0.0);
        assert!(hess[[0, 0]] * hess[[1, 1]] - hess[[0, 1]] * hess[[1, 0]] >= -TOL);
    }

    /// Purpose: the matrix walk collapses to two scalar walks on
    /// block-diagonal input.
    /// Given: a diagonal pair of OU components with a periodogram whose
    /// cross terms are zero.
    /// Expect: value is the sum of the two scalar values; gradient is the
    /// concatenation; the observed Hessian is block diagonal with the
    /// scalar blocks.
    #[test]
    fn matrix_walk_matches_block_diagonal_scalars() {
        // Arrange
        let params = [1.2, 0.8, 0.9, 1.4];
        let omega = Array1::linspace(-1.9, 2.2, 6);
        let delta = 0.5;
        let pair = DiagonalPair {
            a: OrnsteinUhlenbeck::new(params[0], params[1]),
            b: OrnsteinUhlenbeck::new(params[2], params[3]),
        };
        let diag_a = scalar_periodogram(6);
        let diag_b = diag_a.mapv(|v| v * 0.7);
        let mut joint = Array2::from_elem((6, 3), Complex64::new(0.0, 0.0));
        for w in 0..6 {
            joint[[w, 0]] = diag_a[[w, 0]];
            joint[[w, 2]] = diag_b[[w, 0]];
        }

        let mut storage =
            populated(&pair, &omega, delta, EvalRequest { gradient: true, hessian: true });
        let mut grad = Array1::zeros(4);
        let mut hess = Array2::zeros((4, 4));

        // Scalar references, one per component.
        let mut scalar_grad = [Array1::zeros(2), Array1::zeros(2)];
        let mut scalar_hess = [Array2::zeros((2, 2)), Array2::zeros((2, 2))];
        let mut scalar_value = 0.0;
        for (c, periodogram) in [&diag_a, &diag_b].into_iter().enumerate() {
            let model = OrnsteinUhlenbeck::new(params[2 * c], params[2 * c + 1]);
            let mut scalar_storage =
                populated(&model, &omega, delta, EvalRequest { gradient: true, hessian: true });
            scalar_value += likelihood_sums(
                &mut scalar_storage,
                periodogram,
                1,
                2,
                HessianKind::Observed,
                Some(&mut scalar_grad[c]),
                Some(&mut scalar_hess[c]),
            );
        }

        // Act
        let value = likelihood_sums(
            &mut storage,
            &joint,
            2,
            4,
            HessianKind::Observed,
            Some(&mut grad),
            Some(&mut hess),
        );

        // Assert
        assert!((value - scalar_value).abs() < TOL, "{value} vs {scalar_value}");
        for c in 0..2 {
            for j in 0..2 {
                assert!((grad[2 * c + j] - scalar_grad[c][j]).abs() < TOL);
                for k in 0..2 {
                    assert!(
                        (hess[[2 * c + j, 2 * c + k]] - scalar_hess[c][[j, k]]).abs() < TOL,
                        "block {c}, pair ({j}, {k})"
                    );
                }
            }
        }
        // Cross blocks vanish for independent components.
        for j in 0..2 {
            for k in 2..4 {
                assert!(hess[[j, k]].abs() < TOL && hess[[k, j]].abs() < TOL);
            }
        }
    }

    /// Purpose: the matrix gradient handles complex cross periodogram
    /// terms; finite differences of the walk agree.
    /// Given: correlated OU at [1.1, 0.7, 0.4] with a periodogram whose
    /// cross terms carry phase.
    /// Expect: all three components within FD tolerance.
    #[test]
    fn matrix_gradient_matches_finite_differences() {
        // Arrange
        let params = [1.1, 0.7, 0.4];
        let omega = Array1::linspace(-2.1, 2.4, 6);
        let delta = 0.8;
        let periodogram = bivariate_periodogram(6);
        let model = CorrelatedOrnsteinUhlenbeck::new(params[0], params[1], params[2]);
        let mut storage =
            populated(&model, &omega, delta, EvalRequest { gradient: true, hessian: false });
        let mut grad = Array1::zeros(3);

        // Act
        let value = likelihood_sums(
            &mut storage,
            &periodogram,
            2,
            3,
            HessianKind::Expected,
            Some(&mut grad),
            None,
        );

        // Assert
        assert!(value.is_finite());
        for k in 0..3 {
            let mut up = params;
            let mut down = params;
            up[k] += FD_STEP;
            down[k] -= FD_STEP;
            let fd = (correlated_value(up, &omega, delta, &periodogram)
                - correlated_value(down, &omega, delta, &periodogram))
                / (2.0 * FD_STEP);
            assert!((grad[k] - fd).abs() < FD_TOL, "k = {k}: {} vs {fd}", grad[k]);
        }
    }

    /// Purpose: the matrix expected Hessian equals the explicit inverse
    /// product sum.
    /// Given: correlated OU at [1.1, 0.7, 0.4] over six frequencies.
    /// Expect: every entry matches sum_w Re tr(S^-1 dS_j S^-1 dS_k); the
    /// matrix is symmetric.
    #[test]
    fn matrix_expected_hessian_matches_inverse_products() {
        // Arrange
        let model = CorrelatedOrnsteinUhlenbeck::new(1.1, 0.7, 0.4);
        let omega = Array1::linspace(-2.1, 2.4, 6);
        let delta = 0.8;
        let periodogram = bivariate_periodogram(6);
        let mut storage =
            populated(&model, &omega, delta, EvalRequest { gradient: true, hessian: false });

        let mut direct = Array2::<f64>::zeros((3, 3));
        for w in 0..6 {
            let mut spectrum = DMatrix::zeros(2, 2);
            expand_hermitian(storage.sdf_at(w).into(), 2, &mut spectrum);
            let inverse = spectrum.try_inverse().expect("spectrum is invertible");
            let mut grads = Vec::new();
            for k in 0..3 {
                let mut grad_mat = DMatrix::zeros(2, 2);
                expand_hermitian(storage.sdf_grad_at(k, w).into(), 2, &mut grad_mat);
                grads.push(&inverse * grad_mat);
            }
            for j in 0..3 {
                for k in 0..3 {
                    direct[[j, k]] += (&grads[j] * &grads[k]).trace().re;
                }
            }
        }
        let mut hess = Array2::zeros((3, 3));

        // Act
        likelihood_sums(
            &mut storage,
            &periodogram,
            2,
            3,
            HessianKind::Expected,
            None,
            Some(&mut hess),
        );

        // Assert
        for j in 0..3 {
            for k in 0..3 {
                assert!(
                    (hess[[j, k]] - direct[[j, k]]).abs() < 1e-8,
                    "pair ({j}, {k}): {} vs {}",
                    hess[[j, k]],
                    direct[[j, k]]
                );
            }
        }
        for j in 0..3 {
            for k in 0..j {
                assert_eq!(hess[[j, k]], hess[[k, j]]);
            }
        }
    }

    /// Purpose: requesting only the gradient leaves the Hessian buffer
    /// untouched and vice versa.
    /// Given: OU populated for gradients; one walk per request shape.
    /// Expect: identical values across request shapes.
    #[test]
    fn requests_are_independent() {
        // Arrange
        let model = OrnsteinUhlenbeck::new(1.2, 0.8);
        let omega = Array1::linspace(-2.0, 2.3, 6);
        let periodogram = scalar_periodogram(6);
        let mut storage =
            populated(&model, &omega, 0.7, EvalRequest { gradient: true, hessian: true });
        let mut grad = Array1::zeros(2);
        let mut hess = Array2::zeros((2, 2));

        // Act
        let value_only =
            likelihood_sums(&mut storage, &periodogram, 1, 2, HessianKind::Observed, None, None);
        let with_grad = likelihood_sums(
            &mut storage,
            &periodogram,
            1,
            2,
            HessianKind::Observed,
            Some(&mut grad),
            None,
        );
        let with_both = likelihood_sums(
            &mut storage,
            &periodogram,
            1,
            2,
            HessianKind::Observed,
            Some(&mut grad),
            Some(&mut hess),
        );

        // Assert
        assert_eq!(value_only, with_grad);
        assert_eq!(value_only, with_both);
    }

    /// Purpose: a spectrum that cannot factor yields an infinite value and
    /// NaN derivatives, on both failure routes.
    /// Given: the zero spectrum (factorization refuses to start), the
    /// indefinite spectrum (factorization runs but a pivot is not
    /// positive), and a scalar zero spectrum via sigma = 0.
    /// Expect: INFINITY values, NaN-filled gradients.
    #[test]
    fn failed_factorization_poisons_output() {
        // Arrange
        let omega = Array1::linspace(-1.5, 1.8, 4);
        let periodogram = bivariate_periodogram(4);

        for (name, value) in [
            ("zero", {
                let mut storage = populated(
                    &ZeroSpectrum,
                    &omega,
                    1.0,
                    EvalRequest { gradient: true, hessian: false },
                );
                let mut grad = Array1::zeros(1);
                let value = likelihood_sums(
                    &mut storage,
                    &periodogram,
                    2,
                    1,
                    HessianKind::Expected,
                    Some(&mut grad),
                    None,
                );
                assert!(grad[0].is_nan(), "zero spectrum must poison the gradient");
                value
            }),
            ("indefinite", {
                let mut storage = populated(
                    &IndefiniteSpectrum,
                    &omega,
                    1.0,
                    EvalRequest { gradient: true, hessian: false },
                );
                let mut grad = Array1::zeros(1);
                let value = likelihood_sums(
                    &mut storage,
                    &periodogram,
                    2,
                    1,
                    HessianKind::Expected,
                    Some(&mut grad),
                    None,
                );
                assert!(grad[0].is_nan(), "indefinite spectrum must poison the gradient");
                value
            }),
            ("scalar zero", {
                let model = OrnsteinUhlenbeck::new(0.0, 0.8);
                let mut storage = populated(
                    &model,
                    &omega,
                    1.0,
                    EvalRequest { gradient: true, hessian: false },
                );
                let mut grad = Array1::zeros(2);
                let value = likelihood_sums(
                    &mut storage,
                    &scalar_periodogram(4),
                    1,
                    2,
                    HessianKind::Observed,
                    Some(&mut grad),
                    None,
                );
                assert!(grad[0].is_nan(), "scalar zero spectrum must poison the gradient");
                value
            }),
        ] {
            // Assert
            assert_eq!(value, f64::INFINITY, "{name} spectrum");
        }

        // Matrix scratch survives a failed walk: repopulating the same
        // storage with a healthy model evaluates cleanly.
        let mut storage = populated(
            &IndefiniteSpectrum,
            &omega,
            1.0,
            EvalRequest { gradient: false, hessian: false },
        );
        let failed =
            likelihood_sums(&mut storage, &periodogram, 2, 1, HessianKind::Expected, None, None);
        assert_eq!(failed, f64::INFINITY);
        storage
            .populate_spectral(&IdentitySpectrum, omega.view(), 1.0, EvalRequest {
                gradient: false,
                hessian: false,
            })
            .expect("identity spectrum populates");
        let healthy =
            likelihood_sums(&mut storage, &periodogram, 2, 1, HessianKind::Expected, None, None);
        assert!(healthy.is_finite());
    }
}
