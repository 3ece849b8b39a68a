//! likelihood — Whittle and debiased Whittle evaluation stack.
//!
//! Purpose
//! -------
//! Provide frequency-domain likelihood evaluation for parametric stationary
//! models: the standard Whittle sum over the periodogram and the debiased
//! variant that scores the model's expected periodogram instead. Both
//! deliver the value, the analytic gradient, and a Hessian (observed for
//! the standard variant, expected/Fisher for the debiased one) from a
//! single pass over the frequency grid. This is the surface the fitting
//! and inference layers depend on.
//!
//! Key behaviors
//! -------------
//! - Build per-series frequency data once in [`data`]: the cutoff-filtered
//!   Fourier grid and the packed tapered periodogram, plus the lag
//!   kernel for the debiased variant.
//! - Preallocate per-likelihood scratch in [`storage`] and refresh it from
//!   the model hooks on every evaluation; no allocation happens per call.
//! - Reduce populated storage to likelihood sums in [`core`], with a
//!   scalar fast path for univariate data and one complex Cholesky per
//!   frequency for multivariate data.
//! - Expose the public objects in [`whittle`]: [`WhittleLikelihood`] and
//!   [`DebiasedWhittleLikelihood`], generic over the model family.
//! - Centralize error types in [`errors`] ([`WhittleError`],
//!   [`WhittleResult`]) so data construction, validation, and evaluation
//!   share one error surface.
//!
//! Invariants & assumptions
//! ------------------------
//! - The value is a negated log-likelihood up to constants; fitting
//!   minimizes it directly, and derivative buffers follow that sign.
//! - The zero frequency never enters a sum; cutoffs bound `|omega|` with
//!   closed endpoints and an empty surviving grid is a construction
//!   error.
//! - Hermitian matrices (periodograms, model spectra, their derivatives)
//!   are stored packed, lower triangle row-major.
//! - A model spectrum that is not positive definite at a used frequency
//!   makes the value infinite and the derivatives NaN; it is never an
//!   error. Errors are reserved for malformed inputs and missing model
//!   derivative hooks.
//! - Evaluation mutates the owned storage, so the call surface takes
//!   `&mut self`; concurrent evaluation requires one likelihood object
//!   per caller.
//!
//! Conventions
//! -----------
//! - Angular frequencies `omega = 2 pi f / delta` in DFT order; the
//!   periodogram is scaled by `delta / (2 pi)`; tapers are normalized to
//!   unit energy.
//! - Spectral densities alias over a fixed window of wraparounds; the
//!   expected periodogram is synthesized from the autocovariance with the
//!   triangular lag kernel `1 - t / (2 n)`.
//!
//! Downstream usage
//! ----------------
//! - Typical flow: wrap observations in [`crate::series::TimeSeries`],
//!   build a likelihood object for a model family, then either call
//!   [`WhittleLikelihood::evaluate`] directly or hand the object to the
//!   fitting layer, which drives
//!   [`WhittleLikelihood::evaluate_into`] through its objective adapter.
//! - Inference consumes the debiased variant's expected Hessian at the
//!   optimum for covariance and standard errors.
//!
//! Testing notes
//! -------------
//! - [`data`] pins the DFT and scaling conventions through single-tone
//!   and Parseval identities; [`storage`] checks the fold-plus-FFT
//!   expected periodogram against direct two-sided lag sums; [`core`]
//!   pins gradients and Hessians against finite differences of the walk
//!   and the matrix path against a block-diagonal scalar embedding;
//!   [`whittle`] pins both variants against full-precision reference
//!   values on univariate, composed, and bivariate models.

pub mod data;
pub mod errors;
pub mod whittle;

mod core;
mod freqs;
mod hermitian;
mod storage;

// ---- Re-exports (primary public surface) ----------------------------------
//
// These are the “everyday” types most users need: the two likelihood
// objects, their data and options, and the shared error surface.

pub use self::data::{
    DebiasedWhittleData, DebiasedWhittleOptions, WhittleData, WhittleOptions,
};
pub use self::errors::{WhittleError, WhittleResult};
pub use self::whittle::{DebiasedWhittleLikelihood, WhittleLikelihood};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use whittle_inference::likelihood::prelude::*;
//
// to import the main evaluation surface in a single line.

pub mod prelude {
    pub use super::{
        DebiasedWhittleData, DebiasedWhittleLikelihood, DebiasedWhittleOptions, WhittleData,
        WhittleError, WhittleLikelihood, WhittleOptions, WhittleResult,
    };
}
