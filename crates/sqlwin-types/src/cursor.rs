//! The stepping-cursor boundary to the query engine.
//!
//! A [`StepCursor`] is the live execution state of a compiled statement,
//! advanced one row at a time. The materializer and the scalar helpers
//! borrow a cursor exclusively for the duration of one call and never
//! retain it; the same cursor can be reset and re-driven afterwards.
//!
//! The trait replaces the pair of near-duplicate implementations the
//! original system kept behind opaque statement pointers: every consumer in
//! this workspace is generic over `StepCursor`, so there is exactly one
//! materializer and one set of helpers.

use sqlwin_error::{Result, WindowError};

use crate::value::{ColumnType, ColumnValue};

/// Outcome of advancing a stepping cursor by one row.
///
/// `Busy` and `Locked` are transient states (another writer currently holds
/// an engine lock), distinct from fatal errors: fatal engine failures are
/// reported as `Err(_)` from [`StepCursor::step`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The cursor is positioned on a new row; column accessors are valid.
    Row,
    /// The result set is exhausted.
    Done,
    /// The database is busy; the step may be retried.
    Busy,
    /// A table is locked by another writer; the step may be retried.
    Locked,
}

/// The live execution state of a compiled statement.
///
/// Column accessors are valid only while the cursor is positioned on a row,
/// that is, after [`step`](Self::step) returned [`StepOutcome::Row`] and
/// before the next `step` or [`reset`](Self::reset). Borrowed text and blob
/// slices are likewise invalidated by the next `step` or `reset`.
///
/// An engine-level interrupt raised from outside the call surfaces as an
/// `Err` from the next `step`, never as indefinite blocking.
pub trait StepCursor {
    /// Advance to the next row.
    fn step(&mut self) -> Result<StepOutcome>;

    /// Return the statement to its idle, re-executable state.
    fn reset(&mut self) -> Result<()>;

    /// Number of columns this statement produces. Fixed for the lifetime of
    /// the compiled statement.
    fn column_count(&self) -> usize;

    /// Raw engine type code of column `col` of the current row.
    ///
    /// Returned untranslated so that out-of-range codes remain observable;
    /// decode with [`ColumnType::from_code`].
    fn column_type_code(&self, col: usize) -> i32;

    /// Read column `col` of the current row as a 64-bit integer.
    fn column_i64(&self, col: usize) -> Result<i64>;

    /// Read column `col` of the current row as a 64-bit float.
    fn column_f64(&self, col: usize) -> Result<f64>;

    /// Read column `col` of the current row as UTF-8 text.
    fn column_text(&self, col: usize) -> Result<&str>;

    /// Read column `col` of the current row as raw bytes.
    fn column_blob(&self, col: usize) -> Result<&[u8]>;

    /// Decode the type of column `col`, rejecting out-of-range codes.
    fn column_type(&self, col: usize) -> Result<ColumnType> {
        let code = self.column_type_code(col);
        ColumnType::from_code(code).ok_or(WindowError::UnsupportedColumnType { code })
    }

    /// Read column `col` of the current row as an owned [`ColumnValue`],
    /// dispatching on the reported type.
    fn column_value(&self, col: usize) -> Result<ColumnValue> {
        match self.column_type(col)? {
            ColumnType::Null => Ok(ColumnValue::Null),
            ColumnType::Integer => self.column_i64(col).map(ColumnValue::Integer),
            ColumnType::Float => self.column_f64(col).map(ColumnValue::Float),
            ColumnType::Text => self.column_text(col).map(|s| ColumnValue::Text(s.to_owned())),
            ColumnType::Blob => self.column_blob(col).map(|b| ColumnValue::Blob(b.to_vec())),
        }
    }
}
