//! fit — argmin-powered minimization of the Whittle objective.
//!
//! Purpose
//! -------
//! Provide a high-level, Argmin-backed fitting layer for **minimizing
//! Whittle objectives** `V(theta)` produced by the likelihood stack.
//! Callers hold a likelihood object (anything implementing
//! [`WhittleObjective`], in particular
//! [`crate::likelihood::WhittleLikelihood`] and
//! [`crate::likelihood::DebiasedWhittleLikelihood`]) and invoke
//! [`fit_whittle`] to run L-BFGS with a configurable line search,
//! tolerances, and finite-difference fallbacks.
//!
//! Key behaviors
//! -------------
//! - Present the likelihood value to Argmin **as-is** via
//!   [`adapter::FitAdapter`]: the engine already reports a negated
//!   log-likelihood, so the cost is `V(theta)` with no sign change.
//! - Reparameterize trial points elementwise through
//!   [`transform::ParamTransform`] so positivity-constrained parameters
//!   stay inside the model's region while the solver works in an
//!   unconstrained space.
//! - Expose a single, user-facing entrypoint [`fit_whittle`] that:
//!   - validates the initial guess against the objective's dimension,
//!   - maps it into optimizer space through the transform,
//!   - selects an L-BFGS solver via [`builders`] based on
//!     [`traits::LineSearcher`],
//!   - executes the solver via [`run::run_lbfgs`], and
//!   - normalizes results into a [`FitOutcome`] with `theta_hat` mapped
//!     back to model space.
//! - Use the engine's analytic gradient when the model implements its
//!   derivative hooks, falling back to central (then forward) finite
//!   differences inside the adapter when it does not, with post-hoc
//!   validation and error capture.
//! - Centralize optimizer configuration ([`Tolerances`], [`FitOptions`])
//!   and validation logic ([`validation`]) so downstream code can assume
//!   sane, finite inputs.
//!
//! Invariants & assumptions
//! ------------------------
//! - The optimizer **always minimizes** `V(theta)` directly; there is no
//!   sign flip anywhere in this layer, and all reported values
//!   (including [`FitOutcome::value`]) are the objective itself.
//! - [`WhittleObjective::value`] and [`WhittleObjective::gradient`] must
//!   treat invalid inputs as recoverable [`crate::likelihood::WhittleError`]
//!   values, not panics.
//! - An infinite objective at a trial point (a spectrum that is not
//!   positive definite there) is surfaced to the solver as a
//!   [`FitError::NonFiniteCost`]; choosing a transform that keeps trial
//!   points inside the model's region is how callers avoid it.
//! - Vectors and matrices use the canonical aliases [`Theta`], [`Grad`],
//!   [`types::Hessian`]; all are assumed finite whenever optimization
//!   proceeds.
//! - Configuration types ([`Tolerances`], [`FitOptions`]) are validated
//!   on construction and are treated as internally consistent by the
//!   solver layer.
//!
//! Conventions
//! -----------
//! - The solver iterates over an unconstrained **optimizer space** `z`;
//!   the model sees `theta = constrain(z)`. With
//!   [`ParamTransform::Identity`] the two coincide; with
//!   [`ParamTransform::Softplus`] each coordinate maps through a guarded
//!   softplus and the analytic gradient is chain-ruled accordingly.
//! - Gradients exposed by [`WhittleObjective::gradient`] are for the
//!   objective in model space (`dV/dtheta`); the adapter owns the
//!   transform chain rule (`dV/dz`).
//! - Errors bubble up as [`FitResult<T>`] / [`FitError`]; this module and
//!   its children never intentionally panic or use `unsafe`.
//!
//! Downstream usage
//! ----------------
//! - Build a likelihood object from a series and options, then call
//!   [`fit_whittle`] with:
//!   - the objective `&mut F`,
//!   - an initial parameter vector [`Theta`] in model space,
//!   - a [`ParamTransform`] matching the family's constraints, and
//!   - a [`FitOptions`] configuration (tolerances, line search, L-BFGS
//!     memory).
//! - Higher-level code is expected to interact only with the re-exported
//!   surface: [`fit_whittle`], [`WhittleObjective`], [`FitOptions`],
//!   [`Tolerances`], [`FitOutcome`], [`ParamTransform`], plus numeric
//!   aliases from [`types`].
//! - Internal fitting code:
//!   - uses [`adapter`] to bridge into Argmin,
//!   - uses [`builders`] to construct L-BFGS solvers with the chosen
//!     line search,
//!   - delegates execution to [`run::run_lbfgs`], and
//!   - relies on [`validation`] for derivative and state checks.
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover:
//!   - cost and gradient handling (no sign flip, transform chain rule,
//!     finite-difference fallback) in [`adapter`],
//!   - solver construction and tolerance wiring in [`builders`],
//!   - guarded transform behavior in [`transform`] and input checks in
//!     [`validation`],
//!   - configuration and outcome invariants in [`traits`].
//! - Integration tests exercise [`fit_whittle`] end to end by fitting an
//!   Ornstein-Uhlenbeck model to simulated data, verifying that:
//!   - line-search choices are respected,
//!   - finite-difference fallbacks behave as expected, and
//!   - [`FitOutcome`] reports sensible values and diagnostics.

pub mod adapter;
pub mod builders;
pub mod errors;
pub mod run;
pub mod traits;
pub mod transform;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{FitError, FitResult};
pub use self::run::fit_whittle;
pub use self::traits::{FitOptions, FitOutcome, LineSearcher, Tolerances, WhittleObjective};
pub use self::transform::ParamTransform;
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use whittle_inference::fit::prelude::*;
//
// to import the main fitting surface in a single line.

pub mod prelude {
    pub use super::errors::{FitError, FitResult};
    pub use super::run::fit_whittle;
    pub use super::traits::{FitOptions, FitOutcome, LineSearcher, Tolerances, WhittleObjective};
    pub use super::transform::ParamTransform;
    pub use super::types::{Cost, Grad, Theta};
}
