//! Model function trait.
//!
//! This module defines the `ModelFunction` trait, the interface between the
//! optimizer and the concrete parametric model being fitted. The optimizer
//! queries the model once per data point: once for the predicted value and
//! once for the analytic partial derivatives.

use ndarray::Array1;

/// A parametric model `y = f(params, x)` with analytic derivatives.
///
/// Implementations must report a fixed, positive parameter count for the
/// lifetime of the value; the optimizer sizes its working buffers from it.
pub trait ModelFunction {
    /// Number of free parameters of this model instance.
    fn n_params(&self) -> usize;

    /// The model's predicted y at `x` under the given parameters.
    fn value(&self, params: &Array1<f64>, x: f64) -> f64;

    /// Fill `out` with the partial derivative of the model value with
    /// respect to each parameter, evaluated at `x` under `params`.
    ///
    /// `out` has length [`n_params`](Self::n_params) and is owned by the
    /// caller, which reuses it across calls.
    fn jacobian_row(&self, params: &Array1<f64>, x: f64, out: &mut Array1<f64>);
}
