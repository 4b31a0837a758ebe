//! Fault-injecting cursor wrapper.
//!
//! [`FaultCursor`] wraps any [`StepCursor`] and injects transient
//! contention, hard step failures, or bogus column type codes at scripted
//! points. The retry, overflow-recovery, and abort paths of the
//! materializer are exercised through this wrapper; it is shipped as a
//! first-class type so integration tests outside this crate can use it.

use sqlwin_error::{Result, WindowError};

use crate::cursor::{StepCursor, StepOutcome};

/// A cursor wrapper that injects faults at scripted points.
///
/// All scripted faults are re-armed by [`reset`](StepCursor::reset), so a
/// reset-and-redrive of the same cursor observes the same behavior.
#[derive(Debug)]
pub struct FaultCursor<C> {
    inner: C,
    /// Number of `Busy`/`Locked` outcomes to report before the first
    /// delegated step.
    contention_prefix: u32,
    contention_outcome: StepOutcome,
    contention_remaining: u32,
    /// Re-arm the contention streak after every delegated step instead of
    /// only on reset.
    contention_rearms: bool,
    /// Fail the (n+1)-th delegated step with this engine error.
    fail_step: Option<(u64, i32, String)>,
    /// Report this raw type code for one column instead of the real one.
    type_override: Option<(usize, i32)>,
    steps_delegated: u64,
}

impl<C: StepCursor> FaultCursor<C> {
    /// Wrap `inner` with no faults armed.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            contention_prefix: 0,
            contention_outcome: StepOutcome::Busy,
            contention_remaining: 0,
            contention_rearms: false,
            fail_step: None,
            type_override: None,
            steps_delegated: 0,
        }
    }

    /// Report `Busy` for the first `count` steps after construction or
    /// reset.
    #[must_use]
    pub fn with_busy_prefix(mut self, count: u32) -> Self {
        self.contention_prefix = count;
        self.contention_remaining = count;
        self.contention_outcome = StepOutcome::Busy;
        self
    }

    /// Report `Locked` for the first `count` steps after construction or
    /// reset.
    #[must_use]
    pub fn with_locked_prefix(mut self, count: u32) -> Self {
        self.contention_prefix = count;
        self.contention_remaining = count;
        self.contention_outcome = StepOutcome::Locked;
        self
    }

    /// Report `Busy` for `count` steps before every delegated step, not
    /// just the first one.
    #[must_use]
    pub fn with_busy_between_steps(mut self, count: u32) -> Self {
        self.contention_prefix = count;
        self.contention_remaining = count;
        self.contention_outcome = StepOutcome::Busy;
        self.contention_rearms = true;
        self
    }

    /// Fail with an engine error once `after` steps have been delegated to
    /// the inner cursor.
    #[must_use]
    pub fn with_step_failure(mut self, after: u64, code: i32, message: impl Into<String>) -> Self {
        self.fail_step = Some((after, code, message.into()));
        self
    }

    /// Report raw type code `code` for column `col` instead of the inner
    /// cursor's real code.
    #[must_use]
    pub fn with_type_code(mut self, col: usize, code: i32) -> Self {
        self.type_override = Some((col, code));
        self
    }

    /// Unwrap, returning the inner cursor.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: StepCursor> StepCursor for FaultCursor<C> {
    fn step(&mut self) -> Result<StepOutcome> {
        if self.contention_remaining > 0 {
            self.contention_remaining -= 1;
            return Ok(self.contention_outcome);
        }
        if let Some((after, code, message)) = &self.fail_step {
            if self.steps_delegated == *after {
                return Err(WindowError::engine(*code, message.clone()));
            }
        }
        let outcome = self.inner.step()?;
        self.steps_delegated += 1;
        if self.contention_rearms {
            self.contention_remaining = self.contention_prefix;
        }
        Ok(outcome)
    }

    fn reset(&mut self) -> Result<()> {
        self.contention_remaining = self.contention_prefix;
        self.steps_delegated = 0;
        self.inner.reset()
    }

    fn column_count(&self) -> usize {
        self.inner.column_count()
    }

    fn column_type_code(&self, col: usize) -> i32 {
        if let Some((faulted_col, code)) = self.type_override {
            if faulted_col == col {
                return code;
            }
        }
        self.inner.column_type_code(col)
    }

    fn column_i64(&self, col: usize) -> Result<i64> {
        self.inner.column_i64(col)
    }

    fn column_f64(&self, col: usize) -> Result<f64> {
        self.inner.column_f64(col)
    }

    fn column_text(&self, col: usize) -> Result<&str> {
        self.inner.column_text(col)
    }

    fn column_blob(&self, col: usize) -> Result<&[u8]> {
        self.inner.column_blob(col)
    }
}
