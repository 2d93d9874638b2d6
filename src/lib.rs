//! # levmar
//!
//! `levmar` fits a parametric model function to observed (x, y) data by
//! nonlinear least squares, using the Levenberg-Marquardt damped
//! Gauss-Newton method with analytic Jacobians.
//!
//! The library provides:
//! - A [`LevenbergMarquardt`] optimizer that owns its working buffers and
//!   reuses them across iterations
//! - The [`ModelFunction`] trait for the model being fitted, plus stock
//!   models for common cases
//! - The [`DenseMatrix`] primitives the iteration is built on
//! - An optional per-iteration observer for diagnostics
//!
//! ## Basic Usage
//!
//! ```
//! use levmar::{LevenbergMarquardt, LinearModel};
//!
//! // Noiseless samples of y = 2x + 1.
//! let xs = [0.0, 1.0, 2.0, 3.0];
//! let ys = [1.0, 3.0, 5.0, 7.0];
//!
//! let mut optimizer = LevenbergMarquardt::new(LinearModel);
//! let params = optimizer.run(&xs, &ys, &[0.0, 0.0]).unwrap();
//!
//! assert!((params[0] - 2.0).abs() < 1e-6);
//! assert!((params[1] - 1.0).abs() < 1e-6);
//! ```

pub mod error;
pub mod lm;
pub mod matrix;
pub mod model;
pub mod models;
pub mod trace;

// Re-exports for convenience
pub use error::{LevMarError, Result};
pub use lm::{LevenbergMarquardt, LmConfig};
pub use matrix::DenseMatrix;
pub use model::ModelFunction;
pub use models::{ExponentialModel, LinearModel};
pub use trace::{ConsoleObserver, FitObserver, IterationRecord, RecordingObserver};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
