//! Errors for the Whittle fitting layer (options validation, transform
//! domain checks, solver wiring, and outcome validation).
//!
//! [`FitError`] flattens the engine's [`WhittleError`] at the optimizer
//! boundary and wraps Argmin's error kinds so solver failures surface as
//! crate types. Conversions from `argmin::core::Error` recover, in order,
//! fit errors raised inside the adapter, engine errors raised inside an
//! evaluation, and Argmin's own error kinds; anything else becomes a
//! backend error carrying the original message.

use argmin::core::{ArgminError, Error};

use crate::likelihood::errors::WhittleError;

/// Result alias for fitting operations.
pub type FitResult<T> = Result<T, FitError>;

/// Unified error type for Whittle fitting.
#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    // ---- Initial guess ----
    /// Theta length mismatch for the objective's parameter count.
    ThetaLengthMismatch {
        expected: usize,
        actual: usize,
    },

    /// Optimization inputs must have finite values.
    InvalidThetaInput {
        index: usize,
        value: f64,
    },

    // ---- Transform ----
    /// Input lies outside the transform's domain.
    InvalidTransformInput {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    // ---- FitOptions ----
    /// Gradient tolerance needs to be positive and finite.
    InvalidTolGrad {
        tol: f64,
        reason: &'static str,
    },
    /// Cost change tolerance needs to be positive and finite.
    InvalidTolCost {
        tol: f64,
        reason: &'static str,
    },
    /// Maximum iterations needs to be positive.
    InvalidMaxIter {
        max_iter: usize,
        reason: &'static str,
    },
    /// At least one tolerance must be provided.
    NoTolerancesProvided,

    /// Invalid line searcher name.
    InvalidLineSearch {
        name: String,
        reason: &'static str,
    },

    /// lbfgs_mem needs to be at least 1.
    InvalidLbfgsMem {
        mem: usize,
        reason: &'static str,
    },

    // ---- Cost function ----
    /// Objective returned a non-finite value.
    NonFiniteCost {
        value: f64,
    },

    // ---- Gradient ----
    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Gradient elements need to be finite.
    InvalidGradient {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    // ---- Optimizer outcome ----
    /// Estimated parameters must be finite.
    InvalidThetaHat {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    /// Theta hat is missing.
    MissingThetaHat,

    // ---- Argmin ----
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter {
        text: String,
    },
    /// Wrapper for argmin::NotImplemented
    NotImplemented {
        text: String,
    },
    /// Wrapper for argmin::NotInitialized
    NotInitialized {
        text: String,
    },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated {
        text: String,
    },
    /// Wrapper for argmin::CheckPointNotFound
    CheckPointNotFound {
        text: String,
    },
    /// Wrapper for argmin::PotentialBug
    PotentialBug {
        text: String,
    },
    /// Wrapper for argmin::ImpossibleError
    ImpossibleError {
        text: String,
    },
    /// Wrapper for other argmin::Error types
    BackendError {
        text: String,
    },

    // ---- Engine ----
    /// Likelihood engine error without a dedicated fit-level variant.
    EngineError {
        text: String,
    },

    // ---- Fallback ----
    UnknownError,
}

impl std::error::Error for FitError {}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Initial guess ----
            FitError::ThetaLengthMismatch { expected, actual } => {
                write!(f, "Theta length mismatch: expected {expected}, actual {actual}")
            }
            FitError::InvalidThetaInput { index, value } => {
                write!(f, "Invalid theta input at index {index}: {value}, must be finite")
            }

            // ---- Transform ----
            FitError::InvalidTransformInput { index, value, reason } => {
                write!(f, "Invalid transform input at index {index}: {value}: {reason}")
            }

            // ---- FitOptions ----
            FitError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            FitError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost change tolerance {tol}: {reason}")
            }
            FitError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            FitError::NoTolerancesProvided => {
                write!(f, "No tolerances provided")
            }
            FitError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            FitError::InvalidLbfgsMem { mem, reason } => {
                write!(f, "Invalid L-BFGS memory {mem}: {reason}")
            }

            // ---- Cost function ----
            FitError::NonFiniteCost { value } => {
                write!(f, "Non-finite objective value: {value}")
            }

            // ---- Gradient ----
            FitError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            FitError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- Optimizer outcome ----
            FitError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid estimated parameter at index {index}: {value}: {reason}")
            }
            FitError::MissingThetaHat => {
                write!(f, "Missing estimated parameters (theta hat)")
            }

            // ---- Argmin ----
            FitError::InvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            FitError::NotImplemented { text } => {
                write!(f, "Not implemented: {text}")
            }
            FitError::NotInitialized { text } => {
                write!(f, "Not initialized: {text}")
            }
            FitError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            FitError::CheckPointNotFound { text } => {
                write!(f, "Checkpoint not found: {text}")
            }
            FitError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            FitError::ImpossibleError { text } => {
                write!(f, "Impossible error: {text}")
            }
            FitError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }

            // ---- Engine ----
            FitError::EngineError { text } => {
                write!(f, "Likelihood engine error: {text}")
            }

            // ---- Fallback ----
            FitError::UnknownError => {
                write!(f, "Unknown error")
            }
        }
    }
}

impl From<WhittleError> for FitError {
    fn from(err: WhittleError) -> Self {
        match err {
            WhittleError::ThetaLengthMismatch { expected, actual } => {
                FitError::ThetaLengthMismatch { expected, actual }
            }
            WhittleError::NonFiniteTheta { index, value } => {
                FitError::InvalidThetaInput { index, value }
            }
            other => FitError::EngineError { text: other.to_string() },
        }
    }
}

impl From<Error> for FitError {
    fn from(original_err: Error) -> Self {
        let original_err = match original_err.downcast::<FitError>() {
            Ok(fit_err) => return fit_err,
            Err(err) => err,
        };
        let original_err = match original_err.downcast::<WhittleError>() {
            Ok(engine_err) => return FitError::from(engine_err),
            Err(err) => err,
        };
        match original_err.downcast::<ArgminError>() {
            Ok(argmin_err) => match argmin_err {
                ArgminError::InvalidParameter { text } => FitError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => FitError::NotImplemented { text },
                ArgminError::NotInitialized { text } => FitError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => FitError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => FitError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => FitError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => FitError::ImpossibleError { text },
                _ => FitError::UnknownError,
            },
            Err(err) => FitError::BackendError { text: err.to_string() },
        }
    }
}
