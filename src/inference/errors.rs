//! Errors for post-fit inference (covariance, standard errors, Wald
//! intervals).
//!
//! This module defines [`InferenceError`], the error type shared by the
//! covariance and interval routines. Engine failures raised while
//! evaluating the expected Hessian at the estimate convert in via `From`;
//! a parameter-count mismatch keeps its own variant so callers can tell a
//! misshapen estimate apart from a numerical failure. An alias
//! [`InferenceResult<T>`] standardizes the return type across inference
//! code.

use crate::likelihood::errors::WhittleError;

/// Result alias for inference operations.
pub type InferenceResult<T> = Result<T, InferenceError>;

/// Unified error type for post-fit inference.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Inputs ----
    /// Confidence level must lie strictly between 0 and 1.
    InvalidConfidenceLevel { level: f64 },

    /// Vector lengths disagree (estimate vs. parameter count or standard
    /// errors).
    DimensionMismatch { expected: usize, actual: usize },

    // ---- Curvature ----
    /// Expected Hessian has a non-finite entry at the estimate.
    HessianNotFinite { row: usize, col: usize, value: f64 },

    // ---- Engine ----
    /// Likelihood engine error without a dedicated inference variant.
    EngineError { text: String },
}

impl std::error::Error for InferenceError {}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Inputs ----
            InferenceError::InvalidConfidenceLevel { level } => {
                write!(f, "Confidence level must lie strictly between 0 and 1; got: {level}")
            }
            InferenceError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {expected}, got {actual}")
            }

            // ---- Curvature ----
            InferenceError::HessianNotFinite { row, col, value } => {
                write!(
                    f,
                    "Expected Hessian entry ({row}, {col}) is non-finite at the estimate: {value}"
                )
            }

            // ---- Engine ----
            InferenceError::EngineError { text } => {
                write!(f, "Likelihood engine error: {text}")
            }
        }
    }
}

impl From<WhittleError> for InferenceError {
    fn from(err: WhittleError) -> Self {
        match err {
            WhittleError::ThetaLengthMismatch { expected, actual } => {
                InferenceError::DimensionMismatch { expected, actual }
            }
            other => InferenceError::EngineError { text: other.to_string() },
        }
    }
}
