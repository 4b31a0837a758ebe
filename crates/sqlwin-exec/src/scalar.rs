//! Single-row execution helpers.
//!
//! Convenience paths for statements expected to produce at most one row:
//! configuration pragmas, count/aggregate lookups, existence probes. Every
//! helper resets the cursor before returning, even on error, so the
//! compiled statement stays re-executable. None of them carry retry or
//! pagination logic; transient contention surfaces as a transient engine
//! error for the caller to handle.

use tracing::warn;

use sqlwin_error::{ErrorCode, Result, WindowError};
use sqlwin_types::{ColumnValue, StepCursor};

/// Execute a statement that must produce no rows (DDL, DML, pragmas with no
/// result). A produced row is a hard protocol error: queries must not be
/// run through execute-only paths.
pub fn execute<C>(cursor: &mut C) -> Result<()>
where
    C: StepCursor + ?Sized,
{
    let outcome = match step_scalar(cursor) {
        Ok(ScalarStep::Done) => Ok(()),
        Ok(ScalarStep::Row) => Err(WindowError::UnexpectedRow),
        Err(error) => Err(error),
    };
    finish(cursor, outcome)
}

/// Execute a statement, tolerating either no rows or a first row whose
/// contents are ignored. Useful for statements that may or may not report
/// something (for example pragmas that answer only on some builds).
pub fn execute_tolerant<C>(cursor: &mut C) -> Result<()>
where
    C: StepCursor + ?Sized,
{
    let outcome = match step_scalar(cursor) {
        Ok(ScalarStep::Done | ScalarStep::Row) => Ok(()),
        Err(error) => Err(error),
    };
    finish(cursor, outcome)
}

/// Execute a statement that must produce exactly one row with exactly one
/// column, and return that value.
pub fn query_value<C>(cursor: &mut C) -> Result<ColumnValue>
where
    C: StepCursor + ?Sized,
{
    let outcome = match single_value(cursor) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(WindowError::MissingRow),
        Err(error) => Err(error),
    };
    finish(cursor, outcome)
}

/// Execute a single-value statement, returning `default` when it produces
/// no rows.
pub fn query_i64<C>(cursor: &mut C, default: i64) -> Result<i64>
where
    C: StepCursor + ?Sized,
{
    let outcome = single_value(cursor).map(|v| v.map_or(default, |value| value.to_integer()));
    finish(cursor, outcome)
}

/// Execute a single-value statement, returning `default` when it produces
/// no rows.
pub fn query_f64<C>(cursor: &mut C, default: f64) -> Result<f64>
where
    C: StepCursor + ?Sized,
{
    let outcome = single_value(cursor).map(|v| v.map_or(default, |value| value.to_float()));
    finish(cursor, outcome)
}

/// Execute a single-value statement, returning `None` when it produces no
/// rows or a NULL value.
pub fn query_text<C>(cursor: &mut C) -> Result<Option<String>>
where
    C: StepCursor + ?Sized,
{
    let outcome = single_value(cursor).map(|v| match v {
        None | Some(ColumnValue::Null) => None,
        Some(value) => Some(value.to_text()),
    });
    finish(cursor, outcome)
}

/// Execute a single-value statement, returning `None` when it produces no
/// rows or a NULL value. Non-blob values are rendered to text first, the
/// way the engine's blob read coerces.
pub fn query_blob<C>(cursor: &mut C) -> Result<Option<Vec<u8>>>
where
    C: StepCursor + ?Sized,
{
    let outcome = single_value(cursor).map(|v| match v {
        None | Some(ColumnValue::Null) => None,
        Some(ColumnValue::Blob(bytes)) => Some(bytes),
        Some(ColumnValue::Text(text)) => Some(text.into_bytes()),
        Some(value) => Some(value.to_text().into_bytes()),
    });
    finish(cursor, outcome)
}

/// Execute a configuration-style statement and concatenate the text
/// rendering of every column of its first row, in column order. Returns
/// `None` when the statement produces no rows. Only the first row is read.
pub fn concat_text<C>(cursor: &mut C) -> Result<Option<String>>
where
    C: StepCursor + ?Sized,
{
    let outcome = run_concat(cursor);
    finish(cursor, outcome)
}

fn run_concat<C>(cursor: &mut C) -> Result<Option<String>>
where
    C: StepCursor + ?Sized,
{
    match step_scalar(cursor)? {
        ScalarStep::Done => Ok(None),
        ScalarStep::Row => {
            let mut text = String::new();
            for col in 0..cursor.column_count() {
                text.push_str(&cursor.column_value(col)?.to_text());
            }
            Ok(Some(text))
        }
    }
}

/// Shared single-row, single-column extraction: `None` for no rows, the
/// value otherwise. More than one column or a second row is a protocol
/// error with a distinguishing message.
fn single_value<C>(cursor: &mut C) -> Result<Option<ColumnValue>>
where
    C: StepCursor + ?Sized,
{
    match step_scalar(cursor)? {
        ScalarStep::Done => Ok(None),
        ScalarStep::Row => {
            let columns = cursor.column_count();
            if columns != 1 {
                return Err(WindowError::ColumnCountMismatch {
                    expected: 1,
                    actual: columns,
                });
            }
            let value = cursor.column_value(0)?;
            match step_scalar(cursor)? {
                ScalarStep::Done => Ok(Some(value)),
                ScalarStep::Row => Err(WindowError::ExtraRow),
            }
        }
    }
}

/// A step with contention mapped to a transient engine error; helpers have
/// no retry policy of their own.
enum ScalarStep {
    Row,
    Done,
}

fn step_scalar<C>(cursor: &mut C) -> Result<ScalarStep>
where
    C: StepCursor + ?Sized,
{
    use sqlwin_types::StepOutcome;
    match cursor.step()? {
        StepOutcome::Row => Ok(ScalarStep::Row),
        StepOutcome::Done => Ok(ScalarStep::Done),
        StepOutcome::Busy => Err(WindowError::engine_busy()),
        StepOutcome::Locked => Err(WindowError::engine(
            ErrorCode::Locked as i32,
            "table is locked",
        )),
    }
}

/// Reset the cursor whatever the helper's outcome was; a reset failure
/// never masks the primary error but is surfaced after a success.
fn finish<C, T>(cursor: &mut C, outcome: Result<T>) -> Result<T>
where
    C: StepCursor + ?Sized,
{
    match cursor.reset() {
        Ok(()) => outcome,
        Err(reset_error) => match outcome {
            Ok(_) => Err(reset_error),
            Err(error) => {
                warn!(error = %reset_error, "cursor reset failed after a failed execution");
                Err(error)
            }
        },
    }
}
