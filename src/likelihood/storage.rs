//! Purpose
//! -------
//! Preallocated per-likelihood scratch: packed model spectra (and their
//! first and second parameter derivatives) at every surviving frequency,
//! refreshed on each evaluation without allocating.
//!
//! Key behaviors
//! -------------
//! - `populate_spectral` fills aliased spectral densities straight from
//!   the model hooks (standard Whittle).
//! - `populate_expected` transforms model autocovariances into expected
//!   periodograms with one length-`n` FFT per matrix entry, folding
//!   negative lags onto `[0, n)` via `C(-tau) = C(tau)^T` (debiased
//!   Whittle).
//! - Derivative buffers are only refreshed when the evaluation request
//!   asks for them; a missing model hook surfaces as its capability error.
//!
//! Invariants & assumptions
//! ------------------------
//! - Buffer layout is `[quantity][frequency][packed entry]`, all
//!   row-major; parameter pairs `(j, k)` with `j >= k` use the same packed
//!   indexing as matrix entries.
//! - The expected periodogram needs no second-derivative buffers: the
//!   expected Hessian is built from first derivatives alone.
//! - Matrix scratch is sized once from the process dimension; the
//!   evaluation core detaches it (`std::mem::take`) for the duration of a
//!   frequency walk so the packed buffers stay borrowable next to it.
//!
//! Conventions
//! -----------
//! - For the standard variant the spectral buffer holds the aliased
//!   density; for the debiased variant it holds the expected periodogram.
//!
//! Downstream usage
//! ----------------
//! - The evaluation core walks these buffers frequency by frequency.
//!
//! Testing notes
//! -------------
//! - The fold-plus-FFT path is checked against a direct two-sided lag sum,
//!   including an asymmetric cross-covariance to pin the transpose fold.

use nalgebra::DMatrix;
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

use ndarray::ArrayView1;

use crate::likelihood::data::DebiasedWhittleData;
use crate::likelihood::errors::WhittleResult;
use crate::likelihood::hermitian::{compact_index, compact_len};
use crate::models::SpectralModel;

/// Which derivative buffers an evaluation needs refreshed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EvalRequest {
    pub(crate) gradient: bool,
    pub(crate) hessian: bool,
}

/// FFT workspace for turning lag-domain autocovariances into expected
/// periodograms.
pub(crate) struct AcvWorkspace {
    fft: Arc<dyn Fft<f64>>,
    scratch: Vec<Complex64>,
    signal: Vec<Complex64>,
    lags: Vec<f64>,
}

impl AcvWorkspace {
    fn new(num_obs: usize, dim: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(num_obs);
        let scratch = vec![Complex64::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        AcvWorkspace {
            fft,
            scratch,
            signal: vec![Complex64::new(0.0, 0.0); num_obs],
            lags: vec![0.0; num_obs * dim * dim],
        }
    }
}

/// Reusable matrix scratch for multivariate likelihood walks.
pub(crate) struct MatScratch {
    pub(crate) s: DMatrix<Complex64>,
    pub(crate) b: DMatrix<Complex64>,
    pub(crate) h: DMatrix<Complex64>,
    pub(crate) a_mats: Vec<DMatrix<Complex64>>,
}

impl MatScratch {
    fn new(dim: usize, nparams: usize) -> Self {
        MatScratch {
            s: DMatrix::zeros(dim, dim),
            b: DMatrix::zeros(dim, dim),
            h: DMatrix::zeros(dim, dim),
            a_mats: (0..nparams).map(|_| DMatrix::zeros(dim, dim)).collect(),
        }
    }
}

impl Default for MatScratch {
    /// Empty placeholder left behind while a walk has the scratch detached.
    fn default() -> Self {
        MatScratch::new(0, 0)
    }
}

/// Frequency-indexed model quantities for one likelihood object.
pub(crate) struct Storage {
    dim: usize,
    nparams: usize,
    num_freqs: usize,
    packed: usize,
    sdf: Vec<Complex64>,
    sdf_grad: Vec<Complex64>,
    sdf_hess: Vec<Complex64>,
    acv: Option<AcvWorkspace>,
    pub(crate) mats: MatScratch,
}

impl Storage {
    /// Scratch for the standard variant: spectral buffers only.
    pub(crate) fn spectral(dim: usize, nparams: usize, num_freqs: usize) -> Self {
        let packed = compact_len(dim);
        let pairs = compact_len(nparams);
        Storage {
            dim,
            nparams,
            num_freqs,
            packed,
            sdf: vec![Complex64::new(0.0, 0.0); num_freqs * packed],
            sdf_grad: vec![Complex64::new(0.0, 0.0); nparams * num_freqs * packed],
            sdf_hess: vec![Complex64::new(0.0, 0.0); pairs * num_freqs * packed],
            acv: None,
            mats: MatScratch::new(dim, nparams),
        }
    }

    /// Scratch for the debiased variant: adds the lag-domain FFT
    /// workspace and drops the unused second-derivative buffers.
    pub(crate) fn expected(dim: usize, nparams: usize, num_freqs: usize, num_obs: usize) -> Self {
        let mut storage = Storage::spectral(dim, nparams, num_freqs);
        storage.sdf_hess = Vec::new();
        storage.acv = Some(AcvWorkspace::new(num_obs, dim));
        storage
    }

    /// Packed spectral value at frequency `w`.
    pub(crate) fn sdf_at(&self, w: usize) -> &[Complex64] {
        &self.sdf[w * self.packed..(w + 1) * self.packed]
    }

    /// Packed spectral gradient of parameter `k` at frequency `w`.
    pub(crate) fn sdf_grad_at(&self, k: usize, w: usize) -> &[Complex64] {
        let base = (k * self.num_freqs + w) * self.packed;
        &self.sdf_grad[base..base + self.packed]
    }

    /// Packed spectral second derivative of parameter pair `(j, k)`,
    /// `j >= k`, at frequency `w`.
    pub(crate) fn sdf_hess_at(&self, j: usize, k: usize, w: usize) -> &[Complex64] {
        let base = (compact_index(j, k) * self.num_freqs + w) * self.packed;
        &self.sdf_hess[base..base + self.packed]
    }

    /// Refresh spectral buffers from the model's aliased density hooks.
    pub(crate) fn populate_spectral<M: SpectralModel>(
        &mut self,
        model: &M,
        omega: ArrayView1<'_, f64>,
        delta: f64,
        req: EvalRequest,
    ) -> WhittleResult<()> {
        let packed = self.packed;
        self.sdf.fill(Complex64::new(0.0, 0.0));
        for (w, &omega_w) in omega.iter().enumerate() {
            model.add_aliased_sdf(&mut self.sdf[w * packed..(w + 1) * packed], omega_w, delta);
        }

        if req.gradient || req.hessian {
            self.sdf_grad.fill(Complex64::new(0.0, 0.0));
            for k in 0..self.nparams {
                for (w, &omega_w) in omega.iter().enumerate() {
                    let base = (k * self.num_freqs + w) * packed;
                    model.add_aliased_sdf_grad(
                        &mut self.sdf_grad[base..base + packed],
                        k,
                        omega_w,
                        delta,
                    )?;
                }
            }
        }

        if req.hessian {
            self.sdf_hess.fill(Complex64::new(0.0, 0.0));
            for j in 0..self.nparams {
                for k in 0..=j {
                    for (w, &omega_w) in omega.iter().enumerate() {
                        let base = (compact_index(j, k) * self.num_freqs + w) * packed;
                        model.add_aliased_sdf_hess(
                            &mut self.sdf_hess[base..base + packed],
                            j,
                            k,
                            omega_w,
                            delta,
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Refresh spectral buffers with expected periodograms derived from
    /// the model's autocovariance hooks.
    ///
    /// For each matrix entry the two-sided, kernel-weighted lag sum is
    /// folded onto `[0, n)` and evaluated with one forward FFT; results
    /// are gathered at the surviving grid indices. The expected Hessian
    /// needs first derivatives only, so a Hessian request here refreshes
    /// the gradient buffers and nothing more.
    pub(crate) fn populate_expected<M: SpectralModel>(
        &mut self,
        model: &M,
        data: &DebiasedWhittleData,
        req: EvalRequest,
    ) -> WhittleResult<()> {
        let dim = self.dim;
        let packed = self.packed;
        let num_freqs = self.num_freqs;
        let num_obs = data.num_obs;
        let dd = dim * dim;
        let scale = data.delta / (2.0 * std::f64::consts::PI);

        if let Some(ws) = self.acv.as_mut() {
            // Value: lag matrices, then one fold + FFT per packed entry.
            ws.lags.fill(0.0);
            for t in 0..num_obs {
                model.add_acv(&mut ws.lags[t * dd..(t + 1) * dd], t as f64 * data.delta);
            }
            for row in 0..dim {
                for col in 0..=row {
                    let entry = compact_index(row, col);
                    fold_lags(ws, &data.kernel, num_obs, dim, row, col);
                    ws.fft.process_with_scratch(&mut ws.signal, &mut ws.scratch);
                    for (w, &k) in data.grid_idx.iter().enumerate() {
                        self.sdf[w * packed + entry] = ws.signal[k] * scale;
                    }
                }
            }

            if req.gradient || req.hessian {
                for k_param in 0..self.nparams {
                    ws.lags.fill(0.0);
                    for t in 0..num_obs {
                        model.add_acv_grad(
                            &mut ws.lags[t * dd..(t + 1) * dd],
                            k_param,
                            t as f64 * data.delta,
                        )?;
                    }
                    for row in 0..dim {
                        for col in 0..=row {
                            let entry = compact_index(row, col);
                            fold_lags(ws, &data.kernel, num_obs, dim, row, col);
                            ws.fft.process_with_scratch(&mut ws.signal, &mut ws.scratch);
                            for (w, &k) in data.grid_idx.iter().enumerate() {
                                self.sdf_grad[(k_param * num_freqs + w) * packed + entry] =
                                    ws.signal[k] * scale;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Fold the kernel-weighted two-sided lag sequence of entry `(row, col)`
/// onto `[0, n)`: `a[0] = kappa(0) C_0[row, col]` and
/// `a[t] = kappa(t) C_t[row, col] + kappa(n - t) C_{n-t}[col, row]`.
fn fold_lags(
    ws: &mut AcvWorkspace,
    kernel: &ndarray::Array1<f64>,
    num_obs: usize,
    dim: usize,
    row: usize,
    col: usize,
) {
    let dd = dim * dim;
    ws.signal[0] = Complex64::new(kernel[0] * ws.lags[row * dim + col], 0.0);
    for t in 1..num_obs {
        let direct = kernel[t] * ws.lags[t * dd + row * dim + col];
        let mirrored = kernel[num_obs - t] * ws.lags[(num_obs - t) * dd + col * dim + row];
        ws.signal[t] = Complex64::new(direct + mirrored, 0.0);
    }
}

#[cfg(test)]
mod tests {
    //! Scope
    //! -----
    //! Covers:
    //! - Buffer layout of spectral values, gradients, and Hessian pairs.
    //! - The fold-plus-FFT expected periodogram against a direct two-sided
    //!   lag sum, including an asymmetric cross-covariance.
    //! - Capability errors bubbling out of population.
    //!
    //! Intentionally does NOT cover:
    //! - Likelihood sums over these buffers (evaluation core tests).
    use super::*;
    use crate::likelihood::data::DebiasedWhittleOptions;
    use crate::likelihood::errors::WhittleError;
    use crate::models::{CorrelatedOrnsteinUhlenbeck, OrnsteinUhlenbeck};
    use crate::series::TimeSeries;
    use ndarray::Array1;

    const TOL: f64 = 1e-10;

    /// Debiased data scaffold over an arbitrary series; only the grid,
    /// kernel, and sampling interval matter for these tests.
    fn debiased_scaffold(num_obs: usize, delta: f64, dim: usize) -> DebiasedWhittleData {
        let values = ndarray::Array2::from_shape_fn((num_obs, dim), |(t, c)| {
            ((t + 1) as f64 * 0.37 + c as f64).sin()
        });
        let series = TimeSeries::new(values, delta).expect("valid series");
        DebiasedWhittleData::new(&series, &DebiasedWhittleOptions::default())
            .expect("valid data")
    }

    /// Direct two-sided expected periodogram at one frequency:
    /// `(delta / 2 pi) * sum_{|tau| < n} kappa(|tau|) C(tau delta)[row, col]
    /// exp(-i omega tau delta)` with `C(-s) = C(s)^T`.
    fn direct_expected<M: SpectralModel>(
        model: &M,
        data: &DebiasedWhittleData,
        omega: f64,
        row: usize,
        col: usize,
    ) -> Complex64 {
        let dim = data.dim;
        let dd = dim * dim;
        let num_obs = data.num_obs;
        let mut lags = vec![0.0; num_obs * dd];
        for t in 0..num_obs {
            model.add_acv(&mut lags[t * dd..(t + 1) * dd], t as f64 * data.delta);
        }
        let mut total = Complex64::new(0.0, 0.0);
        for tau in -(num_obs as i64 - 1)..num_obs as i64 {
            let abs = tau.unsigned_abs() as usize;
            let value = if tau >= 0 {
                lags[abs * dd + row * dim + col]
            } else {
                lags[abs * dd + col * dim + row]
            };
            let weight = 1.0 - abs as f64 / (2.0 * num_obs as f64);
            let phase = -omega * tau as f64 * data.delta;
            total += Complex64::new(0.0, phase).exp() * (weight * value);
        }
        total * (data.delta / (2.0 * std::f64::consts::PI))
    }

    /// Two coupled components whose cross-covariance is asymmetric, so the
    /// transpose fold is load-bearing.
    struct LaggedPair;

    impl SpectralModel for LaggedPair {
        const DIM: usize = 2;
        const NPARAMS: usize = 0;
        const NAME: &'static str = "lagged pair";

        fn from_params(_theta: ArrayView1<'_, f64>) -> Self {
            LaggedPair
        }

        fn add_sdf(&self, _out: &mut [Complex64], _omega: f64) {}

        fn add_acv(&self, out: &mut [f64], tau: f64) {
            let tau = tau.abs();
            out[0] += (-tau).exp();
            out[1] += 0.3 * (-2.0 * tau).exp();
            out[2] += 0.7 * (-tau).exp();
            out[3] += (-3.0 * tau).exp();
        }
    }

    /// Purpose: spectral population lays out values and derivatives where
    /// the accessors read them.
    /// Given: OU over a small grid with gradients and Hessians requested.
    /// Expect: each buffer slot equals a fresh hook call.
    #[test]
    fn spectral_population_matches_hooks() {
        // Arrange
        let model = OrnsteinUhlenbeck::new(1.2, 0.8);
        let omega = ndarray::array![0.4, -1.1, 2.0];
        let delta = 0.5;
        let mut storage = Storage::spectral(1, 2, 3);

        // Act
        storage
            .populate_spectral(&model, omega.view(), delta, EvalRequest {
                gradient: true,
                hessian: true,
            })
            .expect("OU implements all hooks");

        // Assert
        for (w, &omega_w) in omega.iter().enumerate() {
            let mut direct = [Complex64::new(0.0, 0.0)];
            model.add_aliased_sdf(&mut direct, omega_w, delta);
            assert!((storage.sdf_at(w)[0] - direct[0]).norm() < TOL);

            for k in 0..2 {
                let mut direct = [Complex64::new(0.0, 0.0)];
                model.add_aliased_sdf_grad(&mut direct, k, omega_w, delta).expect("grad");
                assert!((storage.sdf_grad_at(k, w)[0] - direct[0]).norm() < TOL);
            }
            for (j, k) in [(0usize, 0usize), (1, 0), (1, 1)] {
                let mut direct = [Complex64::new(0.0, 0.0)];
                model.add_aliased_sdf_hess(&mut direct, j, k, omega_w, delta).expect("hess");
                assert!((storage.sdf_hess_at(j, k, w)[0] - direct[0]).norm() < TOL);
            }
        }
    }

    /// Purpose: the fold-plus-FFT expected periodogram equals the direct
    /// two-sided lag sum for a univariate model.
    /// Given: OU on an 8-point grid, delta = 0.5.
    /// Expect: agreement at every surviving frequency.
    #[test]
    fn expected_periodogram_matches_direct_sum_univariate() {
        // Arrange
        let model = OrnsteinUhlenbeck::new(1.1, 0.6);
        let data = debiased_scaffold(8, 0.5, 1);
        let mut storage = Storage::expected(1, 2, data.num_freqs(), 8);

        // Act
        storage
            .populate_expected(&model, &data, EvalRequest { gradient: false, hessian: false })
            .expect("value-only population");

        // Assert
        for w in 0..data.num_freqs() {
            let direct = direct_expected(&model, &data, data.omega[w], 0, 0);
            assert!(
                (storage.sdf_at(w)[0] - direct).norm() < TOL,
                "w = {w}: {} vs {direct}",
                storage.sdf_at(w)[0]
            );
        }
    }

    /// Purpose: the transpose fold handles asymmetric cross-covariances.
    /// Given: the LaggedPair model on an 8-point grid.
    /// Expect: every packed entry matches the direct sum, and the cross
    /// entry picks up a genuine imaginary part.
    #[test]
    fn expected_periodogram_matches_direct_sum_asymmetric() {
        // Arrange
        let model = LaggedPair;
        let data = debiased_scaffold(8, 1.0, 2);
        let mut storage = Storage::expected(2, 0, data.num_freqs(), 8);

        // Act
        storage
            .populate_expected(&model, &data, EvalRequest { gradient: false, hessian: false })
            .expect("value-only population");

        // Assert
        let mut saw_imaginary = false;
        for w in 0..data.num_freqs() {
            for (row, col) in [(0usize, 0usize), (1, 0), (1, 1)] {
                let direct = direct_expected(&model, &data, data.omega[w], row, col);
                let stored = storage.sdf_at(w)[compact_index(row, col)];
                assert!(
                    (stored - direct).norm() < TOL,
                    "w = {w}, entry ({row}, {col}): {stored} vs {direct}"
                );
                if row != col && direct.im.abs() > 1e-6 {
                    saw_imaginary = true;
                }
            }
        }
        assert!(saw_imaginary, "asymmetric cross-covariance must show phase");
    }

    /// Purpose: expected-gradient population matches the direct sum of
    /// autocovariance derivatives.
    /// Given: OU on an 8-point grid with gradients requested.
    /// Expect: agreement for both parameters at every frequency.
    #[test]
    fn expected_gradient_matches_direct_sum() {
        // Arrange
        let model = OrnsteinUhlenbeck::new(1.1, 0.6);
        let data = debiased_scaffold(8, 0.5, 1);
        let mut storage = Storage::expected(1, 2, data.num_freqs(), 8);

        // Direct reference: differentiate the lag sum parameter by
        // parameter via the acv gradient hook.
        struct GradAsAcv<'a> {
            inner: &'a OrnsteinUhlenbeck,
            k: usize,
        }
        impl SpectralModel for GradAsAcv<'_> {
            const DIM: usize = 1;
            const NPARAMS: usize = 0;
            const NAME: &'static str = "grad-as-acv";
            fn from_params(_theta: ArrayView1<'_, f64>) -> Self {
                unimplemented!("test helper is built directly")
            }
            fn add_sdf(&self, _out: &mut [Complex64], _omega: f64) {}
            fn add_acv(&self, out: &mut [f64], tau: f64) {
                self.inner.add_acv_grad(out, self.k, tau).expect("OU implements acv gradients");
            }
        }

        // Act
        storage
            .populate_expected(&model, &data, EvalRequest { gradient: true, hessian: false })
            .expect("gradient population");

        // Assert
        for k in 0..2 {
            let reference = GradAsAcv { inner: &model, k };
            for w in 0..data.num_freqs() {
                let direct = direct_expected(&reference, &data, data.omega[w], 0, 0);
                assert!(
                    (storage.sdf_grad_at(k, w)[0] - direct).norm() < TOL,
                    "k = {k}, w = {w}"
                );
            }
        }
    }

    /// Purpose: missing model hooks fail population with their capability
    /// error.
    /// Given: correlated OU (no Hessian hooks) with a Hessian request.
    /// Expect: SdfHessianNotImplemented.
    #[test]
    fn missing_hook_bubbles_out() {
        // Arrange
        let model = CorrelatedOrnsteinUhlenbeck::new(1.1, 0.7, 0.4);
        let omega = Array1::linspace(0.2, 1.4, 4);
        let mut storage = Storage::spectral(2, 3, 4);

        // Act
        let result = storage.populate_spectral(&model, omega.view(), 1.0, EvalRequest {
            gradient: true,
            hessian: true,
        });

        // Assert
        assert_eq!(
            result,
            Err(WhittleError::SdfHessianNotImplemented {
                model: "correlated Ornstein-Uhlenbeck"
            })
        );
    }
}
