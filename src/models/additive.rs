//! Sum of two independent component models.
//!
//! The spectral density and autocovariance of a sum of independent
//! processes are the sums of the component quantities, so every hook
//! simply chains both components on the shared buffer. The parameter
//! vector is the concatenation `[theta_first, theta_second]`; derivative
//! hooks route each index to the component that owns it, and mixed
//! second-derivative pairs are identically zero.

use ndarray::{s, ArrayView1};
use num_complex::Complex64;

use crate::likelihood::errors::WhittleResult;
use crate::models::traits::SpectralModel;

/// Independent sum of two component models with concatenated parameters.
///
/// Both components must share a process dimension; the mismatch is caught
/// at compile time when the composed type is used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdditiveModel<M1, M2> {
    first: M1,
    second: M2,
}

impl<M1, M2> AdditiveModel<M1, M2> {
    pub fn new(first: M1, second: M2) -> Self {
        AdditiveModel { first, second }
    }
}

impl<M1: SpectralModel, M2: SpectralModel> SpectralModel for AdditiveModel<M1, M2> {
    const DIM: usize = {
        assert!(M1::DIM == M2::DIM, "additive components must share a dimension");
        M1::DIM
    };
    const NPARAMS: usize = M1::NPARAMS + M2::NPARAMS;
    const NAME: &'static str = "additive";

    fn from_params(theta: ArrayView1<'_, f64>) -> Self {
        AdditiveModel {
            first: M1::from_params(theta.slice(s![..M1::NPARAMS])),
            second: M2::from_params(theta.slice(s![M1::NPARAMS..])),
        }
    }

    fn add_sdf(&self, out: &mut [Complex64], omega: f64) {
        self.first.add_sdf(out, omega);
        self.second.add_sdf(out, omega);
    }

    fn add_acv(&self, out: &mut [f64], tau: f64) {
        self.first.add_acv(out, tau);
        self.second.add_acv(out, tau);
    }

    fn add_sdf_grad(&self, out: &mut [Complex64], k: usize, omega: f64) -> WhittleResult<()> {
        if k < M1::NPARAMS {
            self.first.add_sdf_grad(out, k, omega)
        } else {
            self.second.add_sdf_grad(out, k - M1::NPARAMS, omega)
        }
    }

    fn add_sdf_hess(
        &self,
        out: &mut [Complex64],
        j: usize,
        k: usize,
        omega: f64,
    ) -> WhittleResult<()> {
        if j < M1::NPARAMS {
            self.first.add_sdf_hess(out, j, k, omega)
        } else if k >= M1::NPARAMS {
            self.second.add_sdf_hess(out, j - M1::NPARAMS, k - M1::NPARAMS, omega)
        } else {
            // Mixed pair: the components share no parameters.
            Ok(())
        }
    }

    fn add_acv_grad(&self, out: &mut [f64], k: usize, tau: f64) -> WhittleResult<()> {
        if k < M1::NPARAMS {
            self.first.add_acv_grad(out, k, tau)
        } else {
            self.second.add_acv_grad(out, k - M1::NPARAMS, tau)
        }
    }

    fn add_aliased_sdf(&self, out: &mut [Complex64], omega: f64, delta: f64) {
        self.first.add_aliased_sdf(out, omega, delta);
        self.second.add_aliased_sdf(out, omega, delta);
    }

    fn add_aliased_sdf_grad(
        &self,
        out: &mut [Complex64],
        k: usize,
        omega: f64,
        delta: f64,
    ) -> WhittleResult<()> {
        if k < M1::NPARAMS {
            self.first.add_aliased_sdf_grad(out, k, omega, delta)
        } else {
            self.second.add_aliased_sdf_grad(out, k - M1::NPARAMS, omega, delta)
        }
    }

    fn add_aliased_sdf_hess(
        &self,
        out: &mut [Complex64],
        j: usize,
        k: usize,
        omega: f64,
        delta: f64,
    ) -> WhittleResult<()> {
        if j < M1::NPARAMS {
            self.first.add_aliased_sdf_hess(out, j, k, omega, delta)
        } else if k >= M1::NPARAMS {
            self.second.add_aliased_sdf_hess(out, j - M1::NPARAMS, k - M1::NPARAMS, omega, delta)
        } else {
            Ok(())
        }
    }
}
