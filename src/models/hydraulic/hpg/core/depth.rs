//! Characteristic depths of a reach: normal and critical.
//!
//! Both are roots of a scalar residual in depth and are found by bisection
//! over the part-full range of the section.

use std::convert::Infallible;

use thiserror::Error;
use twine_core::{EquationProblem, Model};
use twine_solvers::equation::bisection;

use super::Reach;

/// Flows below this magnitude are treated as no flow.
pub(crate) const ZERO_FLOW: f64 = 1e-6;

/// Depth (as a fraction of full depth) where a circular section's uniform-flow
/// capacity peaks.
const PEAK_CAPACITY_FRACTION: f64 = 0.938;

const LOWER_FRACTION: f64 = 1e-6;
const UPPER_FRACTION: f64 = 0.9999;

/// Errors that can occur while solving for a characteristic depth.
#[derive(Debug, Error)]
pub enum DepthError {
    /// The reach has no cross-section geometry.
    #[error("reach has no cross-section geometry")]
    NoGeometry,

    /// The bisection solver encountered an error.
    #[error("bisection solver error")]
    Bisection(#[from] bisection::Error),

    /// The solver reached the iteration limit without converging.
    #[error("depth solver hit iteration limit: residual={residual}")]
    MaxIters {
        /// Final residual of the normalized depth equation.
        residual: f64,

        /// Iteration count performed by the solver.
        iters: usize,
    },
}

/// Critical and normal depth for one discharge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacteristicDepths {
    pub critical: f64,

    /// Infinite on flat or adverse slopes.
    pub normal: f64,
}

impl CharacteristicDepths {
    /// Computes both depths for `flow` (sign ignored).
    ///
    /// # Errors
    ///
    /// Returns a [`DepthError`] if either bisection fails.
    pub fn new(reach: &Reach, flow: f64) -> Result<Self, DepthError> {
        Ok(Self {
            critical: critical_depth(reach, flow)?,
            normal: normal_depth(reach, flow)?,
        })
    }

    /// Supercritical uniform flow: the normal depth lies below critical depth.
    #[must_use]
    pub fn is_steep(&self) -> bool {
        self.normal < self.critical
    }
}

/// Depth at which the reach carries `flow` in uniform flow.
///
/// Returns [`f64::INFINITY`] when the bed slope is not positive, and the full
/// depth when `flow` exceeds the part-full capacity peak.
///
/// # Errors
///
/// Returns a [`DepthError`] if the bisection fails to converge.
pub fn normal_depth(reach: &Reach, flow: f64) -> Result<f64, DepthError> {
    let flow = flow.abs();
    let max_depth = reach.max_depth();
    if max_depth <= 0.0 {
        return Err(DepthError::NoGeometry);
    }
    if reach.slope() <= 0.0 {
        return Ok(f64::INFINITY);
    }
    if flow < ZERO_FLOW {
        return Ok(0.0);
    }

    let residual = |y: f64| reach.capacity(y) / flow - 1.0;
    bracketed_root(
        residual,
        LOWER_FRACTION * max_depth,
        PEAK_CAPACITY_FRACTION * max_depth,
        max_depth,
    )
}

/// Depth at which `flow` (sign ignored) has minimum specific energy.
///
/// Capped just below the crown when the flow is still supercritical there.
///
/// # Errors
///
/// Returns a [`DepthError`] if the bisection fails to converge.
pub fn critical_depth(reach: &Reach, flow: f64) -> Result<f64, DepthError> {
    let flow = flow.abs();
    let max_depth = reach.max_depth();
    if max_depth <= 0.0 {
        return Err(DepthError::NoGeometry);
    }
    if flow < ZERO_FLOW {
        return Ok(0.0);
    }

    // Decreasing in depth, so negate to share the rising-residual convention.
    let residual = |y: f64| 1.0 - reach.froude_squared(flow, y);
    bracketed_root(
        residual,
        LOWER_FRACTION * max_depth,
        UPPER_FRACTION * max_depth,
        UPPER_FRACTION * max_depth,
    )
}

/// Finds the root of an increasing residual on `[lower, upper]`.
///
/// Returns `lower` when the residual is already non-negative there and
/// `saturated` when it is still negative at `upper`.
pub(crate) fn bracketed_root<F>(residual: F, lower: f64, upper: f64, saturated: f64) -> Result<f64, DepthError>
where
    F: Fn(f64) -> f64,
{
    if residual(lower) >= 0.0 {
        return Ok(lower);
    }
    if residual(upper) < 0.0 {
        return Ok(saturated);
    }

    let model = DepthModel { residual };
    let config = bisection::Config {
        max_iters: 100,
        x_abs_tol: 1e-10 * upper,
        x_rel_tol: 0.0,
        residual_tol: 1e-12,
    };

    let solution = bisection::solve(
        &model,
        &DepthProblem,
        [lower, upper],
        &config,
        |event: &bisection::Event<'_, _, _>| {
            if event.result().is_err() {
                return Some(bisection::Action::assume_positive());
            }
            None
        },
    )?;

    if solution.status != bisection::Status::Converged {
        return Err(DepthError::MaxIters {
            residual: solution.residual,
            iters: solution.iters,
        });
    }

    Ok(solution.snapshot.output.depth)
}

/// A depth paired with its normalized residual.
#[derive(Debug, Clone, Copy)]
struct DepthEval {
    depth: f64,
    residual: f64,
}

/// Model evaluating a depth residual.
struct DepthModel<F> {
    residual: F,
}

impl<F: Fn(f64) -> f64> Model for DepthModel<F> {
    type Input = f64;
    type Output = DepthEval;
    type Error = Infallible;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        Ok(DepthEval {
            depth: *input,
            residual: (self.residual)(*input),
        })
    }
}

/// Equation problem driving the depth residual to zero.
struct DepthProblem;

impl EquationProblem<1> for DepthProblem {
    type Input = f64;
    type Output = DepthEval;
    type Error = Infallible;

    fn input(&self, x: &[f64; 1]) -> Result<Self::Input, Self::Error> {
        Ok(x[0])
    }

    fn residuals(
        &self,
        _input: &Self::Input,
        output: &Self::Output,
    ) -> Result<[f64; 1], Self::Error> {
        Ok([output.residual])
    }
}
