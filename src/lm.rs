//! Core Levenberg-Marquardt optimizer.
//!
//! This module implements the damped Gauss-Newton iteration: each pass
//! builds the residual vector and Jacobian from the bound model, solves the
//! damped normal equations `(J^T J + lambda * diag(J^T J)) * delta = J^T r`,
//! applies `delta` to the parameter estimate, and adapts the damping factor
//! from the trend of the residual sum of squares.

use ndarray::{aview1, Array1};

use crate::error::{LevMarError, Result};
use crate::matrix::DenseMatrix;
use crate::model::ModelFunction;
use crate::trace::{FitObserver, IterationRecord};

/// Configuration options for the Levenberg-Marquardt optimizer.
#[derive(Debug, Clone)]
pub struct LmConfig {
    /// Maximum number of iterations. Default: 1000
    pub max_iterations: usize,

    /// Initial value for the damping parameter. Must be positive.
    /// Default: 0.95
    pub initial_lambda: f64,

    /// Factor by which lambda is multiplied after an improving iteration
    /// and divided after a non-improving one. Must lie in (0, 1).
    /// Default: 0.95
    pub damping_decay: f64,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            initial_lambda: 0.95,
            damping_decay: 0.95,
        }
    }
}

/// Working buffers, allocated once per problem size and reused across
/// iterations.
struct Workspace {
    n_points: usize,
    /// `n_points x n_params`, one row of partial derivatives per data point.
    jacobian: DenseMatrix,
    /// `n_params x n_points`, transpose of `jacobian`.
    jacobian_t: DenseMatrix,
    /// `n_points x 1` column of residuals `y[i] - f(params, x[i])`.
    residual: DenseMatrix,
    /// `n_params x n_params`, holds `J^T J`, then the damped system, then
    /// its inverse.
    normal: DenseMatrix,
    /// `n_params x n_params`, holds `lambda * diag(J^T J)`.
    damping: DenseMatrix,
    /// `n_params x 1`, holds `J^T r`.
    rhs: DenseMatrix,
    /// `n_params x 1` parameter update.
    delta: DenseMatrix,
    /// Scratch row handed to the model's `jacobian_row`.
    row: Array1<f64>,
}

impl Workspace {
    fn new(n_points: usize, n_params: usize) -> Self {
        Self {
            n_points,
            jacobian: DenseMatrix::zeros(n_points, n_params),
            jacobian_t: DenseMatrix::zeros(n_params, n_points),
            residual: DenseMatrix::zeros(n_points, 1),
            normal: DenseMatrix::zeros(n_params, n_params),
            damping: DenseMatrix::zeros(n_params, n_params),
            rhs: DenseMatrix::zeros(n_params, 1),
            delta: DenseMatrix::zeros(n_params, 1),
            row: Array1::zeros(n_params),
        }
    }

    /// Recompute the residual column and the Jacobian rows for the current
    /// parameter estimate, querying the model once per data point.
    fn form_jacobian<M: ModelFunction>(
        &mut self,
        model: &M,
        params: &Array1<f64>,
        xs: &[f64],
        ys: &[f64],
    ) {
        for (i, (&x, &y)) in xs.iter().zip(ys.iter()).enumerate() {
            self.residual.set(i, 0, y - model.value(params, x));
            model.jacobian_row(params, x, &mut self.row);
            for (j, &derivative) in self.row.iter().enumerate() {
                self.jacobian.set(i, j, derivative);
            }
        }
    }
}

/// The Levenberg-Marquardt optimizer.
///
/// One instance owns its parameter vector and working buffers and mutates
/// them in place across iterations, so it is not usable for concurrent
/// fits; callers needing those should create independent instances. A call
/// to [`run`](Self::run) executes to completion.
pub struct LevenbergMarquardt<M: ModelFunction> {
    model: M,
    n_params: usize,
    config: LmConfig,
    observer: Option<Box<dyn FitObserver>>,
    workspace: Option<Workspace>,
    params: Array1<f64>,
}

impl<M: ModelFunction> LevenbergMarquardt<M> {
    /// Create an optimizer bound to the given model, with default
    /// configuration and no observer.
    pub fn new(model: M) -> Self {
        let n_params = model.n_params();
        Self {
            model,
            n_params,
            config: LmConfig::default(),
            observer: None,
            workspace: None,
            params: Array1::zeros(n_params),
        }
    }

    /// Replace the configuration. Values are validated when `run` is called.
    pub fn with_config(mut self, config: LmConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a diagnostic observer, notified once per iteration.
    pub fn with_observer(mut self, observer: Box<dyn FitObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Set the iteration cap. A cap of zero makes `run` return the initial
    /// guess unchanged.
    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.config.max_iterations = max_iterations;
    }

    /// The current parameter estimate: the result of the last `run`, or the
    /// last successfully-updated values if that run was aborted.
    pub fn params(&self) -> &Array1<f64> {
        &self.params
    }

    /// Fit the model to the given data, starting from `initial_guess`.
    ///
    /// Runs exactly `max_iterations` damped Gauss-Newton iterations; there
    /// is no tolerance-based early exit. The parameter update is applied
    /// unconditionally every iteration, even when the residual sum of
    /// squares worsens; only the damping factor for the next iteration
    /// reacts to the trend. Canonical LM would instead reject a worsening
    /// step and retry with larger damping. This follows the reference
    /// behavior deliberately; see DESIGN.md.
    ///
    /// The working buffers are allocated on first use and reused by later
    /// calls; a call with a different number of data points explicitly
    /// reallocates them.
    ///
    /// # Arguments
    ///
    /// * `xs`, `ys` - the observed data, two sequences of equal, nonzero
    ///   length
    /// * `initial_guess` - starting parameter values, length equal to the
    ///   model's parameter count
    ///
    /// # Returns
    ///
    /// * A borrow of the fitted parameter vector (the optimizer retains
    ///   ownership).
    /// * `InvalidConfiguration` if any dimension is zero or mismatched, or
    ///   the damping configuration is out of range. Raised before any
    ///   iteration runs.
    /// * `SingularMatrix` if the damped normal-equations matrix is not
    ///   invertible within tolerance. The run is aborted with the parameter
    ///   vector left at its last successfully-updated value.
    pub fn run(&mut self, xs: &[f64], ys: &[f64], initial_guess: &[f64]) -> Result<&Array1<f64>> {
        self.validate(xs, ys, initial_guess)?;

        let mut workspace = match self.workspace.take() {
            Some(workspace) if workspace.n_points == xs.len() => workspace,
            _ => Workspace::new(xs.len(), self.n_params),
        };
        self.params.assign(&aview1(initial_guess));

        let outcome = Self::iterate(
            &self.model,
            &mut self.params,
            &mut workspace,
            &self.config,
            self.observer.as_deref_mut(),
            xs,
            ys,
        );
        self.workspace = Some(workspace);
        outcome?;
        Ok(&self.params)
    }

    fn validate(&self, xs: &[f64], ys: &[f64], initial_guess: &[f64]) -> Result<()> {
        if self.n_params == 0 {
            return Err(LevMarError::InvalidConfiguration(
                "model reports zero parameters".to_string(),
            ));
        }
        if xs.is_empty() {
            return Err(LevMarError::InvalidConfiguration(
                "no data points supplied".to_string(),
            ));
        }
        if xs.len() != ys.len() {
            return Err(LevMarError::InvalidConfiguration(format!(
                "xs has {} points but ys has {}",
                xs.len(),
                ys.len()
            )));
        }
        if initial_guess.len() != self.n_params {
            return Err(LevMarError::InvalidConfiguration(format!(
                "initial guess has length {}, expected {}",
                initial_guess.len(),
                self.n_params
            )));
        }
        if !(self.config.initial_lambda > 0.0) {
            return Err(LevMarError::InvalidConfiguration(format!(
                "initial_lambda must be positive, got {}",
                self.config.initial_lambda
            )));
        }
        if !(self.config.damping_decay > 0.0 && self.config.damping_decay < 1.0) {
            return Err(LevMarError::InvalidConfiguration(format!(
                "damping_decay must lie in (0, 1), got {}",
                self.config.damping_decay
            )));
        }
        Ok(())
    }

    fn iterate(
        model: &M,
        params: &mut Array1<f64>,
        ws: &mut Workspace,
        config: &LmConfig,
        mut observer: Option<&mut (dyn FitObserver + '_)>,
        xs: &[f64],
        ys: &[f64],
    ) -> Result<()> {
        let n_params = params.len();
        let mut lambda = config.initial_lambda;
        let decay = config.damping_decay;
        let mut last_sum_of_squares = f64::INFINITY;

        for iteration in 0..config.max_iterations {
            ws.form_jacobian(model, params, xs, ys);
            ws.jacobian_t.copy_transposed_from(&ws.jacobian)?;

            // normal = (J^T J + lambda * diag(J^T J))^-1
            ws.jacobian_t.mul_into(&ws.jacobian, &mut ws.normal)?;
            ws.damping.copy_from(&ws.normal)?;
            ws.damping.diagonalise();
            ws.damping.scale(lambda);
            ws.normal.add_assign(&ws.damping)?;
            ws.normal.invert()?;

            // delta = normal * J^T r
            ws.jacobian_t.mul_into(&ws.residual, &mut ws.rhs)?;
            ws.normal.mul_into(&ws.rhs, &mut ws.delta)?;

            // Applied unconditionally, whether or not this step improves.
            for k in 0..n_params {
                params[k] += ws.delta.get(k, 0);
            }

            // Relax damping toward Gauss-Newton on improvement, tighten it
            // toward gradient descent otherwise.
            let current = ws.residual.sum_of_squares();
            let step_lambda = lambda;
            if current < last_sum_of_squares {
                lambda *= decay;
            } else {
                lambda /= decay;
            }
            last_sum_of_squares = current;

            if let Some(observer) = observer.as_mut() {
                observer.iteration(&IterationRecord {
                    iteration,
                    sum_of_squares: current,
                    lambda: step_lambda,
                });
            }
        }
        Ok(())
    }
}
