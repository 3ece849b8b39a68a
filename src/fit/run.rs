//! Execution helpers: the shared L-BFGS runner and the high-level
//! [`fit_whittle`] entry point.
//!
//! [`run_lbfgs`] wires an adapted problem into an `argmin` executor and
//! normalizes the solver state into a [`FitOutcome`]; [`fit_whittle`]
//! validates the initial guess, moves it into optimizer space, selects a
//! solver from the configured line search, and maps the estimate back to
//! model space afterwards.
use crate::fit::{
    adapter::FitAdapter,
    builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
    errors::FitResult,
    traits::{FitOptions, FitOutcome, LineSearcher, WhittleObjective},
    transform::ParamTransform,
    types::{Grad, Theta},
    validation::validate_theta0,
};
#[cfg(feature = "obs_slog")]
use argmin::core::{CostFunction, Gradient};
use argmin::core::{Executor, State};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;

/// Run an `argmin` optimization for a Whittle fitting problem.
///
/// This is the shared runner used by both line-search variants. It wires up:
/// - the objective via [`FitAdapter`],
/// - the chosen `Solver` (L-BFGS with Hager-Zhang/More-Thuente),
/// - the initial optimizer-space parameter `z0`,
/// - optional observers (behind the `obs_slog` feature),
/// - optional `max_iters`,
///   then executes the solver and converts the result into [`FitOutcome`].
///
/// The outcome is reported in **optimizer space**: `theta_hat` and
/// `grad_norm` refer to the point and gradient the solver worked with.
/// [`fit_whittle`] maps the estimate back through the transform.
///
/// # Type Parameters
/// - `F`: The likelihood objective implementing [`WhittleObjective`].
/// - `S`: Any `argmin` solver whose problem is `FitAdapter<'a, F>` and whose
///   `IterState` matches the aliases `Theta` (parameters), `Grad` (gradient),
///   and `f64` as the float type.
///
/// # Arguments
/// - `z0`: Initial optimizer-space vector. It is **consumed** and set on the
///   executor state via `state.param(z0)`.
/// - `opts`: Optimizer options (tolerances, verbosity, max iters, etc.).
/// - `problem`: A [`FitAdapter`] wrapping the objective and its transform.
/// - `solver`: A fully constructed solver (e.g. from
///   [`build_optimizer_hager_zhang`] or [`build_optimizer_more_thuente`]).
///
/// # Feature flags
/// If the `obs_slog` feature is enabled and `opts.verbose == true`, a terminal
/// slog observer is attached with `ObserverMode::Always` and a one-time
/// pre-iteration line logs V(theta0) and, if available, ||grad|| before the
/// first iteration.
///
/// # Returns
/// A [`FitOutcome`] containing the best parameter found, best objective value
/// V(theta_hat), termination status, iteration count, function-evaluation
/// counts, and the last available gradient's norm if it can be calculated.
///
/// # Errors
/// - Propagates any `argmin` runtime error (observer failures, solver errors,
///   line-search failures, etc.) via the crate's `From<argmin::core::Error>`
///   conversion.
/// - Propagates any validation errors encountered when constructing
///   [`FitOutcome`].
pub fn run_lbfgs<'a, F, S>(
    z0: Theta, opts: &FitOptions, problem: FitAdapter<'a, F>, solver: S,
) -> FitResult<FitOutcome>
where
    F: WhittleObjective,
    S: argmin::core::Solver<
            FitAdapter<'a, F>,
            argmin::core::IterState<Theta, Grad, (), (), (), f64>,
        > + Send
        + 'static,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&z0, &problem)?;
    }
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(z0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    FitOutcome::new(
        result.take_best_param(),
        result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
    )
}

/// Minimize a Whittle objective `V(theta)` using L-BFGS with the chosen
/// line search.
///
/// # Behavior
/// - Validates the initial guess against the objective's parameter count
///   and finiteness.
/// - Maps `theta0` into optimizer space through `transform` (rejecting
///   out-of-domain starting points).
/// - Wraps `(objective, transform)` in a [`FitAdapter`] exposing the
///   minimization problem to `argmin` — no sign flip is involved.
/// - Builds an L-BFGS solver with either **Hager-Zhang** or
///   **More-Thuente** line search based on `opts.line_searcher`.
/// - Calls [`run_lbfgs`], then maps the estimate back to model space, so
///   [`FitOutcome::theta_hat`] is directly comparable to the vectors
///   handed to `evaluate`.
///
/// # Parameters
/// - `objective`: A likelihood object implementing [`WhittleObjective`].
/// - `theta0`: Initial parameter vector in model space.
/// - `transform`: Elementwise reparameterization keeping trial points in
///   the model's region (use `Identity` for unconstrained families).
/// - `opts`: Optimizer options (tolerances, line search choice, verbosity,
///   L-BFGS memory).
///
/// # Errors
/// - Initial-guess validation errors (`ThetaLengthMismatch`,
///   `InvalidThetaInput`, `InvalidTransformInput`).
/// - Builder errors from `build_optimizer_*`.
/// - Runtime errors from [`run_lbfgs`] (e.g., line search failures or an
///   infinite objective at a trial point).
///
/// # Returns
/// A [`FitOutcome`] with `theta_hat` in model space, the best value
/// `V(theta_hat)`, termination status, iteration/function-evaluation
/// counts, and optionally the optimizer-space gradient norm.
///
/// # Example
/// ```no_run
/// use ndarray::{array, Array1};
/// use whittle_inference::fit::{fit_whittle, FitOptions, ParamTransform};
/// use whittle_inference::likelihood::{WhittleLikelihood, WhittleOptions};
/// use whittle_inference::models::OrnsteinUhlenbeck;
/// use whittle_inference::series::TimeSeries;
///
/// let values = Array1::from_shape_fn(256, |t| (0.4 * t as f64).sin());
/// let series = TimeSeries::from_column(values, 1.0)?;
/// let mut likelihood =
///     WhittleLikelihood::<OrnsteinUhlenbeck>::new(&series, &WhittleOptions::default())?;
///
/// let outcome = fit_whittle(
///     &mut likelihood,
///     array![1.0, 1.0],
///     ParamTransform::Softplus,
///     &FitOptions::default(),
/// )?;
/// println!("theta_hat = {:?}, V = {}", outcome.theta_hat, outcome.value);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn fit_whittle<F: WhittleObjective>(
    objective: &mut F, theta0: Theta, transform: ParamTransform, opts: &FitOptions,
) -> FitResult<FitOutcome> {
    validate_theta0(&theta0, objective.nparams())?;
    let z0 = transform.unconstrain(&theta0)?;
    let problem = FitAdapter::new(objective, transform);
    let mut outcome = match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(z0, opts, problem, solver)?
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(z0, opts, problem, solver)?
        }
    };
    outcome.theta_hat = transform.constrain(&outcome.theta_hat);
    Ok(outcome)
}

// ---- Helper Methods ----

#[cfg(feature = "obs_slog")]
fn log_initial_state<F>(z0: &Theta, problem: &FitAdapter<'_, F>) -> FitResult<()>
where
    F: WhittleObjective,
{
    let v0 = problem.cost(z0)?;
    let g0n = problem.gradient(z0).ok().map(|g| g.l2_norm());

    eprintln!(
        "init: V(theta0) = {:.6}{}",
        v0,
        g0n.map(|n| format!(", ||grad|| = {:.6}", n)).unwrap_or_default()
    );
    Ok(())
}
