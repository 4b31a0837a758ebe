//! In-memory reference cursor.
//!
//! [`MemCursor`] steps over pre-built rows. It is the implementation the
//! `StepCursor` contract is tested against, and doubles as an adapter for
//! materializing result sets that already live in memory.

use sqlwin_error::{Result, WindowError};

use crate::cursor::{StepCursor, StepOutcome};
use crate::value::{ColumnType, ColumnValue};

/// A stepping cursor over an in-memory sequence of rows.
#[derive(Debug, Clone)]
pub struct MemCursor {
    rows: Vec<Vec<ColumnValue>>,
    column_count: usize,
    /// Index of the row the next `step` will yield.
    next_row: usize,
    /// Whether the cursor is currently positioned on row `next_row - 1`.
    on_row: bool,
}

impl MemCursor {
    /// Create a cursor over `rows`, each of which must have exactly
    /// `column_count` values.
    ///
    /// # Panics
    ///
    /// Panics if any row has a different number of columns; a stepping
    /// cursor's column count is fixed for the statement's lifetime.
    #[must_use]
    pub fn new(column_count: usize, rows: Vec<Vec<ColumnValue>>) -> Self {
        for (i, row) in rows.iter().enumerate() {
            assert!(
                row.len() == column_count,
                "row {i} has {} columns, expected {column_count}",
                row.len()
            );
        }
        Self {
            rows,
            column_count,
            next_row: 0,
            on_row: false,
        }
    }

    /// Total number of rows this cursor will produce.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn current(&self) -> Result<&[ColumnValue]> {
        if !self.on_row {
            return Err(WindowError::internal("cursor is not positioned on a row"));
        }
        Ok(&self.rows[self.next_row - 1])
    }

    fn current_value(&self, col: usize) -> Result<&ColumnValue> {
        let row = self.current()?;
        row.get(col).ok_or_else(|| {
            WindowError::internal(format!(
                "column {col} out of range ({} columns)",
                row.len()
            ))
        })
    }
}

impl StepCursor for MemCursor {
    fn step(&mut self) -> Result<StepOutcome> {
        if self.next_row < self.rows.len() {
            self.next_row += 1;
            self.on_row = true;
            Ok(StepOutcome::Row)
        } else {
            self.on_row = false;
            Ok(StepOutcome::Done)
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.next_row = 0;
        self.on_row = false;
        Ok(())
    }

    fn column_count(&self) -> usize {
        self.column_count
    }

    fn column_type_code(&self, col: usize) -> i32 {
        match self.current_value(col) {
            Ok(value) => value.column_type().code(),
            Err(_) => ColumnType::Null.code(),
        }
    }

    fn column_i64(&self, col: usize) -> Result<i64> {
        Ok(self.current_value(col)?.to_integer())
    }

    fn column_f64(&self, col: usize) -> Result<f64> {
        Ok(self.current_value(col)?.to_float())
    }

    fn column_text(&self, col: usize) -> Result<&str> {
        self.current_value(col)?.as_text().ok_or_else(|| {
            WindowError::internal(format!("column {col} does not hold TEXT"))
        })
    }

    fn column_blob(&self, col: usize) -> Result<&[u8]> {
        self.current_value(col)?.as_blob().ok_or_else(|| {
            WindowError::internal(format!("column {col} does not hold BLOB"))
        })
    }
}
