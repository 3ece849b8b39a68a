//! whittle_inference — debiased Whittle estimation for stationary time series.
//!
//! Purpose
//! -------
//! Serve as the crate root tying together the five public areas: data
//! ingestion ([`series`]), parametric model hooks ([`models`]), the
//! Whittle objective engine ([`likelihood`]), the argmin-powered fit
//! layer ([`fit`]), and post-fit asymptotic inference ([`inference`]).
//!
//! Key behaviors
//! -------------
//! - Expose the core areas as public modules; each area re-exports its
//!   primary surface and carries an optional `prelude`.
//! - Define nothing itself: all computation, validation, and error
//!   mapping live in the inner modules.
//!
//! Invariants & assumptions
//! ------------------------
//! - Frequencies are angular and sampling-aware throughout: the grid is
//!   `2 pi k / (n delta)` and spectral densities integrate to the
//!   variance over `[-pi / delta, pi / delta]`.
//! - The objective convention is fixed crate-wide: the Whittle value is
//!   a penalty, smaller is better, and the fit layer minimizes it
//!   directly with no sign flip.
//! - Out-of-region parameters poison evaluations (infinite value, NaN
//!   derivative buffers) instead of erroring; only structural misuse
//!   (shape mismatches, non-finite inputs, invalid options) surfaces as
//!   an error.
//!
//! Conventions
//! -----------
//! - Indexing, units, and storage conventions follow the documentation
//!   of the underlying modules (`likelihood::core`, `fit::run`, etc.).
//! - Each area owns its error enum (`WhittleError`, `FitError`,
//!   `InferenceError`) and a matching `Result` alias; conversions
//!   between them are explicit `From` impls at the area boundaries.
//!
//! Downstream usage
//! ----------------
//! - The typical pipeline is: build a [`series::TimeSeries`], construct
//!   a [`likelihood::WhittleLikelihood`] or
//!   [`likelihood::DebiasedWhittleLikelihood`] over a model
//!   implementing [`models::SpectralModel`], minimize it with
//!   [`fit::fit_whittle`], then pass the estimate to
//!   [`inference::calc_standard_errors`] and
//!   [`inference::wald_intervals`].
//! - Custom models plug in by implementing [`models::SpectralModel`]
//!   (and its autocovariance hooks for the debiased variant); nothing
//!   else in the pipeline changes.
//!
//! Testing notes
//! -------------
//! - Numerical behavior is covered by unit tests in the inner modules;
//!   `tests/` exercises the full fit-then-infer pipeline end to end on
//!   synthetic data.

pub mod fit;
pub mod inference;
pub mod likelihood;
pub mod models;
pub mod series;
