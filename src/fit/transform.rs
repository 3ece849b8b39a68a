//! Parameter transforms between optimizer space and model space.
//!
//! L-BFGS line searches probe trial points well outside the current
//! iterate, and the built-in spectral families blow up (infinite value,
//! poisoned derivatives) outside their positive parameter region. A
//! [`ParamTransform`] reparameterizes the search so every trial point the
//! solver produces maps back into the model's region: the optimizer works
//! on an unconstrained vector `z`, and the objective sees
//! `theta = constrain(z)`.
//!
//! The nonlinear map is built from guarded transforms that are prone to
//! overflow/underflow in naive form, using explicit cutoffs (`x > 20.0`)
//! to keep `f64` arithmetic in a well-conditioned regime:
//! - [`safe_softplus`]: stable `ln(1 + exp(x))`, mapping the reals
//!   onto `(0, inf)` without overflow.
//! - [`safe_softplus_inv`]: inverse of softplus, mapping `(0, inf)`
//!   back without catastrophic cancellation.
//! - [`safe_logistic`]: the softplus derivative, evaluated without
//!   overflow on either tail; it supplies the chain-rule factor for
//!   gradients.

use crate::fit::{
    errors::{FitError, FitResult},
    types::{Grad, Theta},
};

/// Elementwise map between the optimizer's unconstrained space and the
/// model's parameter space.
///
/// Variants:
/// - `Identity`: no reparameterization; optimizer and model space agree.
/// - `Softplus`: every coordinate is `softplus`-mapped, so the model only
///   ever sees strictly positive parameters.
///
/// The same map is applied to every coordinate. Families with mixed
/// parameter regions (e.g. a correlation in `(-1, 1)` next to positive
/// scales) should fit under `Identity` from an interior starting point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamTransform {
    Identity,
    Softplus,
}

impl ParamTransform {
    /// Map an optimizer-space vector `z` into model space.
    ///
    /// Softplus output is strictly positive and finite for finite input,
    /// so a constrained trial point never leaves the model's region.
    pub fn constrain(&self, z: &Theta) -> Theta {
        match self {
            ParamTransform::Identity => z.clone(),
            ParamTransform::Softplus => z.mapv(safe_softplus),
        }
    }

    /// Map a model-space vector into optimizer space (the inverse of
    /// [`ParamTransform::constrain`]), used on the initial guess.
    ///
    /// # Errors
    /// Returns [`FitError::InvalidTransformInput`] when a coordinate lies
    /// outside the map's domain (non-positive, for `Softplus`).
    pub fn unconstrain(&self, theta: &Theta) -> FitResult<Theta> {
        match self {
            ParamTransform::Identity => Ok(theta.clone()),
            ParamTransform::Softplus => {
                for (index, &value) in theta.iter().enumerate() {
                    if value <= 0.0 {
                        return Err(FitError::InvalidTransformInput {
                            index,
                            value,
                            reason: "Softplus inverse needs strictly positive input.",
                        });
                    }
                }
                Ok(theta.mapv(safe_softplus_inv))
            }
        }
    }

    /// Convert a model-space gradient into an optimizer-space gradient at
    /// `z`, multiplying elementwise by `d theta_i / d z_i`.
    ///
    /// For `Softplus` that factor is the logistic function of `z_i`; for
    /// `Identity` the gradient passes through unchanged.
    pub fn chain(&self, z: &Theta, mut grad: Grad) -> Grad {
        match self {
            ParamTransform::Identity => grad,
            ParamTransform::Softplus => {
                for (g, &zi) in grad.iter_mut().zip(z.iter()) {
                    *g *= safe_logistic(zi);
                }
                grad
            }
        }
    }
}

/// Numerically stable softplus: `softplus(x) = ln(1 + exp(x))`.
///
/// For sufficiently large `x`, `softplus(x) = x + ln1p(exp(-x))` is `x`
/// to double precision; otherwise it falls back to `ln1p(exp(x))`. The
/// cutoff (`x > 20.0`) keeps the calculation in a well-conditioned
/// regime for `f64`.
pub fn safe_softplus(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp().ln_1p() }
}

/// Stable inverse of softplus on `(0, inf)`: solves `softplus(t) = x`
/// for `t = ln(exp(x) - 1)`.
///
/// Direct evaluation can overflow or lose precision; this mirrors the
/// guarded strategy of [`safe_softplus`]: above the cutoff `exp(-x)` is
/// negligible and the inverse is `x` itself, otherwise `ln(expm1(x))`.
pub fn safe_softplus_inv(x: f64) -> f64 {
    if x > 20.0 { x } else { x.exp_m1().ln() }
}

/// Numerically stable logistic function `1 / (1 + exp(-x))`.
///
/// Branches on the sign of `x` so the exponential is always taken of a
/// non-positive argument, avoiding overflow on both tails.
pub fn safe_logistic(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Eigenvalue cutoff for curvature matrices: eigenvalues at or below this
/// threshold are treated as numerically zero when a Hessian is inverted
/// (pseudoinverse truncation in the inference layer).
pub const EIGEN_EPS: f64 = 1e-10;
