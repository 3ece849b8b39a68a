//! Validation helpers for Whittle fitting.
//!
//! This module centralizes the consistency checks used across the fitting
//! interface:
//!
//! - **Tolerance checks**: [`verify_tol_grad`], [`verify_tol_cost`] ensure
//!   numeric tolerances are finite and strictly positive when provided.
//! - **Initial guess**: [`validate_theta0`] enforces the objective's
//!   parameter count and finite entries before any solver work starts.
//! - **Gradient validation**: [`validate_grad`] enforces correct dimension
//!   and finite entries.
//! - **Parameter estimates**: [`validate_theta_hat`] ensures a candidate
//!   `theta_hat` exists and contains only finite values.
//! - **Objective values**: [`validate_value`] checks objective outputs for
//!   finiteness.
//!
//! These helpers standardize error reporting by returning domain-specific
//! [`FitError`] variants, making higher-level code more uniform and easier
//! to debug.
use crate::fit::{
    errors::{FitError, FitResult},
    types::{Grad, Theta},
};

/// Validate the optional gradient-norm tolerance.
///
/// - Accepts `None` (no stopping rule on gradient).
/// - If `Some`, the value must be **finite** and **strictly positive**.
///
/// # Errors
/// Returns [`FitError::InvalidTolGrad`] if the value is non-finite or <= 0.0.
pub fn verify_tol_grad(tol: Option<f64>) -> FitResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(FitError::InvalidTolGrad { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(FitError::InvalidTolGrad { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate the optional cost-change tolerance (for convergence).
///
/// - Accepts `None` (no stopping rule on cost change).
/// - If `Some`, the value must be **finite** and **strictly positive**.
///
/// # Errors
/// Returns [`FitError::InvalidTolCost`] if the value is non-finite or <= 0.0.
pub fn verify_tol_cost(tol: Option<f64>) -> FitResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(FitError::InvalidTolCost { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(FitError::InvalidTolCost { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate an initial guess against the objective's parameter count.
///
/// Checks:
/// - `theta0.len() == dim`
/// - every element is finite (`NaN` or infinities are rejected)
///
/// # Errors
/// - [`FitError::ThetaLengthMismatch`] if length does not match `dim`.
/// - [`FitError::InvalidThetaInput`] with the index/value of the first
///   offending element.
pub fn validate_theta0(theta0: &Theta, dim: usize) -> FitResult<()> {
    if theta0.len() != dim {
        return Err(FitError::ThetaLengthMismatch { expected: dim, actual: theta0.len() });
    }
    for (index, &value) in theta0.iter().enumerate() {
        if !value.is_finite() {
            return Err(FitError::InvalidThetaInput { index, value });
        }
    }
    Ok(())
}

/// Validate a gradient vector against dimension and finiteness.
///
/// Checks:
/// - `grad.len() == dim`
/// - every element is finite (`NaN` or infinities are rejected)
///
/// # Errors
/// - [`FitError::GradientDimMismatch`] if length does not match `dim`.
/// - [`FitError::InvalidGradient`] with the index/value/reason of the first
///   offending element.
pub fn validate_grad(grad: &Grad, dim: usize) -> FitResult<()> {
    if grad.len() != dim {
        return Err(FitError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(FitError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}

/// Validate and unwrap an estimated parameter vector (`theta_hat`).
///
/// Accepts only a present vector with all **finite** entries.
///
/// # Returns
/// The owned `Theta` if valid.
///
/// # Errors
/// - [`FitError::MissingThetaHat`] if no vector was provided.
/// - [`FitError::InvalidThetaHat`] if any element is non-finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> FitResult<Theta> {
    match theta_hat {
        Some(t) => {
            for (index, &value) in t.iter().enumerate() {
                if !value.is_finite() {
                    return Err(FitError::InvalidThetaHat {
                        index,
                        value,
                        reason: "Parameter estimates must be finite.",
                    });
                }
            }
            Ok(t)
        }
        None => Err(FitError::MissingThetaHat),
    }
}

/// Validate that a scalar objective value is finite.
///
/// Negative values are fine as long as they are finite.
///
/// # Errors
/// Returns [`FitError::NonFiniteCost`] if the value is `NaN` or infinite.
pub fn validate_value(value: f64) -> FitResult<()> {
    if !value.is_finite() {
        return Err(FitError::NonFiniteCost { value });
    }
    Ok(())
}
