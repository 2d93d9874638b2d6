//! Per-iteration observability for the optimizer.
//!
//! The optimizer takes an optional observer at construction instead of a
//! process-wide verbosity flag. Observers are diagnostic only; they cannot
//! influence the iteration.

use std::cell::RefCell;
use std::rc::Rc;

/// Snapshot of one optimizer iteration.
#[derive(Clone, Copy, Debug)]
pub struct IterationRecord {
    /// Zero-based iteration index.
    pub iteration: usize,
    /// Sum of squared residuals measured this iteration, before the
    /// parameter update was applied.
    pub sum_of_squares: f64,
    /// Damping factor used for this iteration's step.
    pub lambda: f64,
}

/// Receives one record per optimizer iteration.
pub trait FitObserver {
    fn iteration(&mut self, record: &IterationRecord);
}

/// Observer that prints one formatted line per iteration to stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleObserver;

impl FitObserver for ConsoleObserver {
    fn iteration(&mut self, record: &IterationRecord) {
        println!(
            "[lm] iter {:>6} | ssq {:>13.6e} | lambda {:>9.3e}",
            record.iteration, record.sum_of_squares, record.lambda
        );
    }
}

/// Observer that accumulates every record for inspection after a run.
///
/// Clones share the same history, so a caller can keep one handle and give
/// another to the optimizer.
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
    history: Rc<RefCell<Vec<IterationRecord>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records captured so far, oldest first.
    pub fn history(&self) -> Vec<IterationRecord> {
        self.history.borrow().clone()
    }

    /// Number of records captured so far.
    pub fn len(&self) -> usize {
        self.history.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.borrow().is_empty()
    }
}

impl FitObserver for RecordingObserver {
    fn iteration(&mut self, record: &IterationRecord) {
        self.history.borrow_mut().push(*record);
    }
}
