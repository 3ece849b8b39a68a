//! Errors for Whittle likelihood evaluation (series validation, frequency
//! options, parameter checks, and model capability gaps).
//!
//! This module defines the likelihood error type, [`WhittleError`], shared by
//! data construction, option validation, and the evaluation entry points.
//! It implements `Display`/`Error` and converts into the fitting layer's
//! error type at the optimizer boundary.
//!
//! ## Conventions
//! - **Indices are 0-based** (row = observation, column = series component).
//! - The sampling interval must be **strictly positive and finite**.
//! - Frequency cutoffs bound `|omega|` and are applied as a closed interval;
//!   `lower <= upper` is required at option construction.
//! - Capability errors (`*NotImplemented`) carry the model's display name so
//!   a caller knows which spectral hook is missing, not just that one is.

/// Crate-wide result alias for likelihood operations that may produce
/// [`WhittleError`].
pub type WhittleResult<T> = Result<T, WhittleError>;

/// Unified error type for Whittle likelihood construction and evaluation.
///
/// Covers time-series validation, frequency/taper option checks, parameter
/// vector validation, output-buffer shape checks, and missing model
/// derivative hooks.
#[derive(Debug, Clone, PartialEq)]
pub enum WhittleError {
    // ---- Series validation ----
    /// Sampling interval must be finite and > 0.
    InvalidSamplingInterval { delta: f64 },

    /// Series must contain at least two observations.
    SeriesTooShort { len: usize },

    /// An observation is NaN/±inf.
    NonFiniteValue { row: usize, col: usize, value: f64 },

    /// Series dimension does not match what the model expects.
    DimensionMismatch { expected: usize, actual: usize },

    // ---- Options validation ----
    /// Frequency cutoffs must satisfy 0 <= lower <= upper.
    InvalidCutoffs { lower: f64, upper: f64 },

    /// Taper length must equal the series length.
    TaperLengthMismatch { expected: usize, actual: usize },

    /// A taper weight is NaN/±inf.
    NonFiniteTaper { index: usize, value: f64 },

    /// Taper must have non-zero energy so it can be normalized.
    ZeroEnergyTaper,

    /// No Fourier frequencies survive the cutoff filter.
    EmptyFrequencyGrid { lower: f64, upper: f64 },

    // ---- Parameter validation ----
    /// Theta length mismatch for the model's parameter count.
    ThetaLengthMismatch { expected: usize, actual: usize },

    /// Parameter coordinates must be finite.
    NonFiniteTheta { index: usize, value: f64 },

    // ---- Output buffers ----
    /// Gradient buffer length must equal the model's parameter count.
    GradientShapeMismatch { expected: usize, actual: usize },

    /// Hessian buffer must be square with side equal to the parameter count.
    HessianShapeMismatch { expected: (usize, usize), actual: (usize, usize) },

    // ---- Model capability ----
    /// Model does not provide spectral-density gradients.
    SdfGradientNotImplemented { model: &'static str },

    /// Model does not provide spectral-density Hessians.
    SdfHessianNotImplemented { model: &'static str },

    /// Model does not provide autocovariance gradients.
    AcvGradientNotImplemented { model: &'static str },
}

impl std::error::Error for WhittleError {}

impl std::fmt::Display for WhittleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Series validation ----
            WhittleError::InvalidSamplingInterval { delta } => {
                write!(f, "Sampling interval must be finite and > 0; got: {delta}")
            }
            WhittleError::SeriesTooShort { len } => {
                write!(f, "Series must contain at least two observations; got: {len}")
            }
            WhittleError::NonFiniteValue { row, col, value } => {
                write!(f, "Observation at row {row}, column {col} is non-finite: {value}")
            }
            WhittleError::DimensionMismatch { expected, actual } => {
                write!(f, "Series dimension mismatch: expected {expected}, got {actual}")
            }
            // ---- Options validation ----
            WhittleError::InvalidCutoffs { lower, upper } => {
                write!(
                    f,
                    "Frequency cutoffs must satisfy 0 <= lower <= upper; got lower {lower}, upper {upper}"
                )
            }
            WhittleError::TaperLengthMismatch { expected, actual } => {
                write!(f, "Taper length mismatch: expected {expected}, got {actual}")
            }
            WhittleError::NonFiniteTaper { index, value } => {
                write!(f, "Taper weight at index {index} is non-finite: {value}")
            }
            WhittleError::ZeroEnergyTaper => {
                write!(f, "Taper has zero energy and cannot be normalized.")
            }
            WhittleError::EmptyFrequencyGrid { lower, upper } => {
                write!(
                    f,
                    "No Fourier frequencies fall inside the cutoff band [{lower}, {upper}]."
                )
            }
            // ---- Parameter validation ----
            WhittleError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Theta length mismatch: expected {expected}, got {actual}")
            }
            WhittleError::NonFiniteTheta { index, value } => {
                write!(f, "Theta coordinate at index {index} must be finite, got {value}")
            }
            // ---- Output buffers ----
            WhittleError::GradientShapeMismatch { expected, actual } => {
                write!(f, "Gradient buffer length mismatch: expected {expected}, got {actual}")
            }
            WhittleError::HessianShapeMismatch { expected, actual } => {
                write!(
                    f,
                    "Hessian buffer shape mismatch: expected {expected:?}, got {actual:?}"
                )
            }
            // ---- Model capability ----
            WhittleError::SdfGradientNotImplemented { model } => {
                write!(f, "Model '{model}' does not implement spectral-density gradients.")
            }
            WhittleError::SdfHessianNotImplemented { model } => {
                write!(f, "Model '{model}' does not implement spectral-density Hessians.")
            }
            WhittleError::AcvGradientNotImplemented { model } => {
                write!(f, "Model '{model}' does not implement autocovariance gradients.")
            }
        }
    }
}
