//! Adapter that exposes a [`WhittleObjective`] as an `argmin` problem.
//!
//! The Whittle value `V(theta)` is already oriented for minimization, so
//! the cost handed to `argmin` is `V` itself with no sign flip. The
//! adapter owns two conversions instead:
//! - trial points arrive in optimizer space and are mapped through the
//!   configured [`ParamTransform`] before the engine sees them;
//! - analytic model-space gradients are mapped back by the transform's
//!   chain rule. When the model lacks derivative hooks, the gradient is
//!   finite-differenced directly in optimizer space, which folds the
//!   transform in for free.
//!
//! Evaluation takes `&mut` access to the likelihood object while argmin
//! hands out `&self`, so the objective sits behind a `RefCell`.
use std::cell::RefCell;

use crate::fit::{
    errors::FitError,
    traits::WhittleObjective,
    transform::ParamTransform,
    types::{Cost, Grad, Theta},
    validation::validate_grad,
};
use crate::likelihood::errors::WhittleError;
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges a [`WhittleObjective`] to `argmin`'s `CostFunction` and
/// `Gradient`.
///
/// - `CostFunction::cost` returns `V(constrain(z))`.
/// - `Gradient::gradient` returns:
///   - the chain-ruled analytic gradient when the model provides one, or
///   - a finite-difference gradient of the cost in optimizer space when
///     the model's derivative hooks are missing.
pub struct FitAdapter<'a, F: WhittleObjective> {
    objective: RefCell<&'a mut F>,
    transform: ParamTransform,
}

impl<'a, F: WhittleObjective> FitAdapter<'a, F> {
    /// Construct a new adapter over an objective and its parameter
    /// transform.
    pub fn new(objective: &'a mut F, transform: ParamTransform) -> Self {
        Self { objective: RefCell::new(objective), transform }
    }
}

impl<'a, F: WhittleObjective> CostFunction for FitAdapter<'a, F> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate the cost `V(constrain(z))` at an optimizer-space point.
    ///
    /// - Maps `z` into model space, then calls the objective's `value`.
    /// - Returns `Error(NonFiniteCost)` if the value is not finite; an
    ///   infinite value marks a trial point outside the model's
    ///   positive-definite region, which the line search must not accept.
    ///
    /// # Errors
    /// Propagates any engine error from `value` via `?`.
    fn cost(&self, z: &Self::Param) -> Result<Self::Output, Error> {
        let theta = self.transform.constrain(z);
        let value = self.objective.borrow_mut().value(&theta)?;
        if !value.is_finite() {
            return Err((FitError::NonFiniteCost { value }).into());
        }
        Ok(value)
    }
}

impl<'a, F: WhittleObjective> Gradient for FitAdapter<'a, F> {
    type Param = Theta;
    type Gradient = Grad;

    /// Evaluate the gradient of the cost at an optimizer-space point.
    ///
    /// Behavior:
    /// - Asks the objective for its analytic model-space gradient; on
    ///   success, validates it and applies the transform's chain rule.
    /// - When the model reports a missing derivative hook, computes a
    ///   finite-difference gradient of the **cost** in optimizer space:
    ///   - Try *central* differences first.
    ///   - If any evaluation of the `cost` closure failed (captured via
    ///     `closure_err`), retry with *forward* differences.
    ///   - Validate the FD gradient; if it fails (e.g., non-finite), retry
    ///     once with *forward* differences and validate again.
    ///
    /// Implementation notes:
    /// - The FD closure must return `f64`, so `?` cannot be used inside
    ///   it; the first error is captured in `closure_err` and the closure
    ///   returns `NaN`. After FD, that captured error is turned back into
    ///   a real error (or the forward-difference retry runs).
    ///
    /// # Errors
    /// - Propagates engine errors other than the missing-hook variants.
    /// - Propagates any error raised by cost evaluations performed during FD.
    /// - Returns validation errors if the gradient has wrong dimension or
    ///   non-finite entries.
    fn gradient(&self, z: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = z.len();
        let theta = self.transform.constrain(z);
        let mut grad = Grad::zeros(dim);
        let analytic = self.objective.borrow_mut().gradient(&theta, &mut grad);
        match analytic {
            Ok(()) => {
                validate_grad(&grad, dim)?;
                Ok(self.transform.chain(z, grad))
            }
            Err(
                WhittleError::SdfGradientNotImplemented { .. }
                | WhittleError::AcvGradientNotImplemented { .. },
            ) => {
                let closure_err: RefCell<Option<Error>> = RefCell::new(None);
                let cost_func = |z: &Theta| -> f64 {
                    match self.cost(z) {
                        Ok(val) => val,
                        Err(e) => {
                            let mut slot = closure_err.borrow_mut();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            f64::NAN
                        }
                    }
                };
                let mut fd_grad = z.central_diff(&cost_func);
                if closure_err.borrow().is_some() {
                    fd_grad = run_fd_diff(z, &cost_func, &closure_err)?;
                    return Ok(fd_grad);
                }
                match validate_grad(&fd_grad, dim) {
                    Ok(()) => Ok(fd_grad),
                    Err(_) => {
                        fd_grad = run_fd_diff(z, &cost_func, &closure_err)?;
                        Ok(fd_grad)
                    }
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Compute a forward-difference gradient of `func` at `z`, with error capture.
///
/// The FD closure cannot return `Result`, so any error raised by `func` is
/// stored into `closure_err` and the closure returns `NaN`. This helper:
/// - clears `closure_err`,
/// - performs `forward_diff`,
/// - if an error was captured, returns it as `Err`,
/// - validates the resulting gradient,
/// - if validation succeeds, returns the gradient as `Ok(grad)`.
///
/// # Errors
/// Returns any error captured during evaluation of `func` inside the FD
/// routine or by validation of the resulting gradient.
fn run_fd_diff<G: Fn(&Theta) -> f64>(
    z: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> Result<Grad, Error> {
    closure_err.replace(None);
    let fd_grad = z.forward_diff(func);
    let dim = z.len();
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&fd_grad, dim)?;
    Ok(fd_grad)
}
