//! fit::builders — L-BFGS solver construction helpers.
//!
//! Purpose
//! -------
//! Provide small, focused builders for the L-BFGS solvers used by the
//! Whittle fitting layer. These helpers hide Argmin's generic wiring and
//! apply crate-level options (tolerances, memory size) so that
//! higher-level code can request a configured solver without touching
//! Argmin-specific types.
//!
//! Key behaviors
//! -------------
//! - Construct L-BFGS solvers with either Hager-Zhang or More-Thuente
//!   line search based on crate-level aliases.
//! - Apply optional gradient and cost-change tolerances from
//!   [`FitOptions`] via a shared configuration helper.
//! - Leave the initial parameter vector and maximum iterations to the
//!   runner/executor layer, keeping these builders side-effect free.
//!
//! Invariants & assumptions
//! ------------------------
//! - All solvers operate on the canonical numeric types [`Theta`],
//!   [`Grad`], and [`Cost`] as defined in [`fit::types`].
//! - The L-BFGS memory (`m`) is either provided via `opts.lbfgs_mem` or
//!   defaults to [`DEFAULT_LBFGS_MEM`].
//! - Any invalid tolerance passed into Argmin's
//!   `with_tolerance_grad` / `with_tolerance_cost` is surfaced as a
//!   [`FitError`] via the crate's `From<Error>` implementation.
//!
//! Conventions
//! -----------
//! - [`HagerZhangLS`] and [`MoreThuenteLS`] are the crate's canonical
//!   line-search aliases; [`LbfgsHagerZhang`] and [`LbfgsMoreThuente`]
//!   pair these with the standard `(Theta, Grad, Cost)` triple.
//! - The builders do **not** set an initial parameter vector or
//!   `max_iters`; these are runtime concerns applied by the runner.
//!
//! Downstream usage
//! ----------------
//! - [`fit_whittle`](crate::fit::run::fit_whittle) calls
//!   [`build_optimizer_hager_zhang`] or [`build_optimizer_more_thuente`]
//!   based on the configured [`LineSearcher`] in [`FitOptions`].
//! - The returned solver is passed to the runner along with an adapted
//!   problem and initial parameters.
//! - [`configure_lbfgs`] is the shared wiring function that applies
//!   tolerances; it is generic over the line-search type.
//!
//! Testing notes
//! -------------
//! - Unit tests verify solver construction for both line searches, the
//!   propagation of `lbfgs_mem`, and tolerance application.
//! - The fitting integration test exercises these builders indirectly
//!   through full L-BFGS solves.
//!
//! [`FitError`]: crate::fit::errors::FitError
//! [`LineSearcher`]: crate::fit::traits::LineSearcher
//! [`fit::types`]: crate::fit::types
use argmin::solver::quasinewton::LBFGS;

use crate::fit::{
    errors::FitResult,
    traits::FitOptions,
    types::{
        Cost, DEFAULT_LBFGS_MEM, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente,
        MoreThuenteLS, Theta,
    },
};

/// Construct L-BFGS with Hager-Zhang line search.
///
/// Builds an [`LbfgsHagerZhang`] solver configured with the crate's
/// standard numeric types and optional tolerances from [`FitOptions`],
/// leaving initial parameters and iteration limits to the caller. The
/// history size comes from `opts.lbfgs_mem`, defaulting to
/// [`DEFAULT_LBFGS_MEM`].
///
/// # Errors
/// Returns a `FitError` (via `From<argmin::core::Error>`) when Argmin
/// rejects a tolerance setting.
pub fn build_optimizer_hager_zhang(opts: &FitOptions) -> FitResult<LbfgsHagerZhang> {
    let hager_zhang = HagerZhangLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsHagerZhang::new(hager_zhang, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Construct L-BFGS with More-Thuente line search.
///
/// The More-Thuente counterpart of [`build_optimizer_hager_zhang`], with
/// the same option handling.
///
/// # Errors
/// Returns a `FitError` (via `From<argmin::core::Error>`) when Argmin
/// rejects a tolerance setting.
pub fn build_optimizer_more_thuente(opts: &FitOptions) -> FitResult<LbfgsMoreThuente> {
    let more_thuente = MoreThuenteLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsMoreThuente::new(more_thuente, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Apply optional tolerances to an L-BFGS solver.
///
/// Generic helper that wires crate-level tolerance options from
/// [`FitOptions`] into an existing L-BFGS solver, regardless of the
/// line-search type. When a tolerance is `None`, the corresponding
/// `with_tolerance_*` method is not called and Argmin's defaults remain
/// in effect.
///
/// # Errors
/// Returns a `FitError` (via `From<argmin::core::Error>`) when
/// `with_tolerance_grad` or `with_tolerance_cost` rejects a value.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &FitOptions,
) -> FitResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}
