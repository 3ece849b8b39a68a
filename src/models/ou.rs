//! Ornstein-Uhlenbeck family: `dX = -theta X dt + sigma dW`.
//!
//! Second-order structure, with `den = theta^2 + omega^2`:
//! - spectral density `f(omega) = sigma^2 theta / (pi den)`,
//! - autocovariance `c(tau) = sigma^2 exp(-theta |tau|)`.
//!
//! All derivative hooks are implemented analytically, so this family
//! supports value, gradient, and Hessian evaluation for both likelihood
//! variants.

use ndarray::ArrayView1;
use num_complex::Complex64;

use crate::likelihood::errors::WhittleResult;
use crate::models::traits::SpectralModel;

use std::f64::consts::PI;

/// Univariate Ornstein-Uhlenbeck model with parameters `[sigma, theta]`.
///
/// `sigma` scales the driving noise and `theta` is the mean-reversion
/// rate. Values outside `sigma > 0`, `theta > 0` are accepted and surface
/// as non-finite likelihood values downstream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrnsteinUhlenbeck {
    sigma: f64,
    theta: f64,
}

impl OrnsteinUhlenbeck {
    pub fn new(sigma: f64, theta: f64) -> Self {
        OrnsteinUhlenbeck { sigma, theta }
    }
}

impl SpectralModel for OrnsteinUhlenbeck {
    const DIM: usize = 1;
    const NPARAMS: usize = 2;
    const NAME: &'static str = "Ornstein-Uhlenbeck";

    fn from_params(theta: ArrayView1<'_, f64>) -> Self {
        OrnsteinUhlenbeck { sigma: theta[0], theta: theta[1] }
    }

    fn add_sdf(&self, out: &mut [Complex64], omega: f64) {
        let den = self.theta * self.theta + omega * omega;
        out[0].re += self.sigma * self.sigma * self.theta / (PI * den);
    }

    fn add_acv(&self, out: &mut [f64], tau: f64) {
        out[0] += self.sigma * self.sigma * (-self.theta * tau.abs()).exp();
    }

    fn add_sdf_grad(&self, out: &mut [Complex64], k: usize, omega: f64) -> WhittleResult<()> {
        let den = self.theta * self.theta + omega * omega;
        if k == 0 {
            out[0].re += 2.0 * self.sigma * self.theta / (PI * den);
        } else {
            out[0].re +=
                self.sigma * self.sigma * (omega * omega - self.theta * self.theta)
                    / (PI * den * den);
        }
        Ok(())
    }

    fn add_sdf_hess(
        &self,
        out: &mut [Complex64],
        j: usize,
        k: usize,
        omega: f64,
    ) -> WhittleResult<()> {
        let den = self.theta * self.theta + omega * omega;
        let value = match (j, k) {
            (0, 0) => 2.0 * self.theta / (PI * den),
            (1, 0) => {
                2.0 * self.sigma * (omega * omega - self.theta * self.theta) / (PI * den * den)
            }
            _ => {
                2.0 * self.sigma * self.sigma * self.theta
                    * (self.theta * self.theta - 3.0 * omega * omega)
                    / (PI * den * den * den)
            }
        };
        out[0].re += value;
        Ok(())
    }

    fn add_acv_grad(&self, out: &mut [f64], k: usize, tau: f64) -> WhittleResult<()> {
        let decay = (-self.theta * tau.abs()).exp();
        if k == 0 {
            out[0] += 2.0 * self.sigma * decay;
        } else {
            out[0] -= self.sigma * self.sigma * tau.abs() * decay;
        }
        Ok(())
    }
}
