//! Parametric model families for Whittle estimation.
//!
//! A family implements [`SpectralModel`]: spectral density and
//! autocovariance accumulation hooks, optional analytic derivatives, and
//! aliasing folds. The catalogue here covers:
//! - [`OrnsteinUhlenbeck`]: univariate OU with full analytic derivatives.
//! - [`CorrelatedOrnsteinUhlenbeck`]: an equicorrelated OU pair with
//!   analytic gradients only.
//! - [`AdditiveModel`]: type-level sum of two independent components with
//!   concatenated parameters.
//!
//! New families implement the trait and immediately work with both
//! likelihood variants; derivative hooks can be added incrementally.

pub mod additive;
pub mod correlated_ou;
pub mod ou;
pub mod traits;

// ---- Re-exports ----
pub use additive::AdditiveModel;
pub use correlated_ou::CorrelatedOrnsteinUhlenbeck;
pub use ou::OrnsteinUhlenbeck;
pub use traits::SpectralModel;
