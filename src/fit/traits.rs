//! Public API surface for Whittle fitting.
//!
//! - [`WhittleObjective`]: the seam between the likelihood engine and the
//!   optimizer, implemented by both likelihood variants.
//! - [`FitOptions`] and [`Tolerances`]: configuration for the optimizer.
//! - [`LineSearcher`]: choice of line search used by L-BFGS.
//! - [`FitOutcome`]: normalized result returned by [`fit_whittle`].
//!
//! Convention: the Whittle value `V(theta)` is already oriented for
//! minimization (smaller is better), so the fitting layer minimizes it
//! directly. There is no sign flip anywhere: objective values, gradients,
//! and the reported best value all live on the same scale as
//! `evaluate`.
//!
//! [`fit_whittle`]: crate::fit::run::fit_whittle
use crate::fit::{
    errors::{FitError, FitResult},
    types::{FnEvalMap, Grad, Theta},
    validation::{validate_theta_hat, validate_value, verify_tol_cost, verify_tol_grad},
};
use crate::likelihood::errors::WhittleResult;
use crate::likelihood::{DebiasedWhittleLikelihood, WhittleLikelihood};
use crate::models::SpectralModel;
use argmin::core::TerminationStatus;
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// Minimization interface over a Whittle likelihood object.
///
/// The fitting layer drives evaluation exclusively through this trait, so
/// both likelihood variants (and any future objective wrapping one) plug
/// into the same solver machinery. Methods take `&mut self` because
/// evaluation rewrites the object's internal storage.
///
/// Required:
/// - `nparams() -> usize`: length of the parameter vector the objective
///   expects.
/// - `value(&mut self, &Theta) -> WhittleResult<f64>`: the objective
///   value `V(theta)`.
/// - `gradient(&mut self, &Theta, &mut Grad) -> WhittleResult<()>`: the
///   analytic gradient of `V`, written into the caller's buffer. Models
///   without derivative hooks surface their capability error here; the
///   adapter falls back to finite differences in that case.
pub trait WhittleObjective {
    fn nparams(&self) -> usize;
    fn value(&mut self, theta: &Theta) -> WhittleResult<f64>;
    fn gradient(&mut self, theta: &Theta, grad: &mut Grad) -> WhittleResult<()>;
}

impl<M: SpectralModel> WhittleObjective for WhittleLikelihood<M> {
    fn nparams(&self) -> usize {
        M::NPARAMS
    }

    fn value(&mut self, theta: &Theta) -> WhittleResult<f64> {
        self.evaluate(theta.view())
    }

    fn gradient(&mut self, theta: &Theta, grad: &mut Grad) -> WhittleResult<()> {
        self.evaluate_into(theta.view(), false, Some(grad), None).map(|_| ())
    }
}

impl<M: SpectralModel> WhittleObjective for DebiasedWhittleLikelihood<M> {
    fn nparams(&self) -> usize {
        M::NPARAMS
    }

    fn value(&mut self, theta: &Theta) -> WhittleResult<f64> {
        self.evaluate(theta.view())
    }

    fn gradient(&mut self, theta: &Theta, grad: &mut Grad) -> WhittleResult<()> {
        self.evaluate_into(theta.view(), false, Some(grad), None).map(|_| ())
    }
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Variants:
/// - `MoreThuente`: More-Thuente line search.
/// - `HagerZhang`: Hager-Zhang line search.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names
/// (`"MoreThuente"`, `"HagerZhang"`). Unknown names return
/// `FitError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = FitError;

    /// Parse a line-search choice from a string (case-insensitive).
    ///
    /// Accepts:
    /// - `"MoreThuente"`
    /// - `"HagerZhang"`
    /// - Any case variant (e.g., `"morethuente"`, `"HAGERZHANG"`).
    ///
    /// Any other value returns `FitError::InvalidLineSearch` with a helpful message.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(FitError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Optimizer-level configuration.
///
/// Fields:
/// - `tols: Tolerances` — numerical tolerances and iteration limits.
/// - `line_searcher: LineSearcher` — line-search algorithm used by L-BFGS.
/// - `verbose: bool` — if `true`, attaches an observer (behind the `obs_slog`
///   feature) and prints progress.
/// - `lbfgs_mem: Option<usize>` — L-BFGS history size; `None` uses the
///   crate default of 7.
///
/// Constructor:
/// - `new(tols, line_searcher, verbose, lbfgs_mem) -> FitResult<Self>` —
///   builds options; validation of numeric tolerances is handled in
///   `Tolerances::new`.
///
/// Default:
/// - `tols`: `tol_grad = 1e-6`, `tol_cost = None`, `max_iter = 300`
/// - `line_searcher`: `MoreThuente`
/// - `verbose`: `false`
/// - `lbfgs_mem`: `None`
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl FitOptions {
    /// Create a new set of optimizer options.
    ///
    /// This constructor does not mutate values; validation of numeric
    /// tolerances is performed inside [`Tolerances::new`].
    ///
    /// # Errors
    /// Returns [`FitError::InvalidLbfgsMem`] when an explicit history
    /// size of zero is requested.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, verbose: bool, lbfgs_mem: Option<usize>,
    ) -> FitResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(FitError::InvalidLbfgsMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(Self { tols, line_searcher, verbose, lbfgs_mem })
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances::new(Some(1e-6), None, Some(300)).unwrap(),
            line_searcher: LineSearcher::MoreThuente,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

/// Numerical tolerances and iteration limits used by the optimizer.
///
/// - `tol_grad`: terminate when the gradient norm falls below this threshold.
/// - `tol_cost`: terminate when the change in objective value falls below
///   this threshold.
/// - `max_iter`: hard cap on the number of iterations.
///
/// Any field can be `None` but **at least one** of the three must be provided
/// (see [`Tolerances::new`]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Rules
    /// - At least one of `tol_grad`, `tol_cost`, or `max_iter` must be `Some`.
    /// - If provided, tolerances must be **finite and strictly positive**.
    /// - If provided, `max_iter` must be `> 0`.
    ///
    /// # Errors
    /// - [`FitError::NoTolerancesProvided`] if all three are `None`.
    /// - [`FitError::InvalidTolGrad`] / [`FitError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`FitError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> FitResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(FitError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(FitError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

/// Canonical result returned by [`fit_whittle`].
///
/// - `theta_hat`: best parameter vector found, in **model space**.
/// - `value`: best objective value `V(theta_hat)`.
/// - `converged`: `true` if the solver reported a terminating status other
///   than `NotTerminated`.
/// - `status`: human-readable termination status string.
/// - `iterations`: number of optimizer iterations performed.
/// - `fn_evals`: function-evaluation counters reported by `argmin`.
///   Keys follow argmin's counters, e.g., cost_count, gradient_count.
/// - `grad_norm`: norm of the last available optimizer-space gradient,
///   if present.
///
/// [`fit_whittle`]: crate::fit::run::fit_whittle
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl FitOutcome {
    /// Build a validated [`FitOutcome`] from raw solver state.
    ///
    /// Performs:
    /// - `theta_hat` check via `validate_theta_hat` (present and all finite).
    /// - `value` check via `validate_value` (finite).
    /// - Maps `TerminationStatus` into `(converged, status)`.
    /// - Computes `grad_norm` if a gradient was provided.
    ///
    /// # Errors
    /// - Propagates any validation errors for `theta_hat` or `value`.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, converged: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> FitResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let status: String;
        let converged = match converged {
            TerminationStatus::NotTerminated => {
                status = "Not terminated".to_string();
                false
            }
            _ => {
                status = format!("{converged:?}");
                true
            }
        };
        let iterations = iterations as usize;
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self { theta_hat, value, converged, status, iterations, fn_evals, grad_norm })
    }
}
