//! Stock model functions for common fitting problems.

use ndarray::Array1;

use crate::model::ModelFunction;

/// A straight line, `y = a * x + b`, with parameters `[a, b]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearModel;

impl ModelFunction for LinearModel {
    fn n_params(&self) -> usize {
        2
    }

    fn value(&self, params: &Array1<f64>, x: f64) -> f64 {
        params[0] * x + params[1]
    }

    fn jacobian_row(&self, _params: &Array1<f64>, x: f64, out: &mut Array1<f64>) {
        // Derivative with respect to a
        out[0] = x;
        // Derivative with respect to b
        out[1] = 1.0;
    }
}

/// An exponential, `y = p0 * exp(p1 * x)`, with parameters `[p0, p1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExponentialModel;

impl ModelFunction for ExponentialModel {
    fn n_params(&self) -> usize {
        2
    }

    fn value(&self, params: &Array1<f64>, x: f64) -> f64 {
        params[0] * f64::exp(params[1] * x)
    }

    fn jacobian_row(&self, params: &Array1<f64>, x: f64, out: &mut Array1<f64>) {
        let exp_term = f64::exp(params[1] * x);
        // Derivative with respect to p0
        out[0] = exp_term;
        // Derivative with respect to p1
        out[1] = params[0] * x * exp_term;
    }
}
