//! Row encoder: one cursor row into one window slot.
//!
//! Pure serialization; all retry and recovery policy lives in the
//! materializer. The encoder's one structural guarantee is that a row is
//! stored completely or not at all: when a column does not fit, the
//! partially-written row is released back to the window before reporting
//! [`CopyRow::Full`].

use tracing::debug;

use sqlwin_error::{Result, WindowError};
use sqlwin_types::{ColumnType, StepCursor};

use crate::window::Window;

/// Outcome of copying one row into the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyRow {
    /// The row and all its columns were stored.
    Stored,
    /// The row did not fit; nothing from it is visible in the window.
    Full,
}

/// Copy the cursor's current row into the next free row slot.
///
/// `columns` is the seeded column count, `start_pos` and `added_rows` are
/// the window's result-relative start and current size, used only for
/// diagnostics. The cursor must be positioned on a row.
///
/// Returns [`CopyRow::Full`] when the field directory or any single
/// column's payload does not fit (the row is released first), and an error
/// for unrecognized column type codes or engine failures while reading a
/// column — in both error cases the partial row is released as well, so no
/// partially-encoded row is ever visible.
pub fn copy_row<C>(
    cursor: &C,
    window: &mut Window,
    columns: usize,
    start_pos: u64,
    added_rows: u64,
) -> Result<CopyRow>
where
    C: StepCursor + ?Sized,
{
    // Allocate a new field directory for the row.
    if window.alloc_row().is_err() {
        debug!(
            start_pos,
            row = added_rows,
            "failed allocating field directory"
        );
        return Ok(CopyRow::Full);
    }
    let row = window.row_count() - 1;

    let result = copy_columns(cursor, window, columns, row, start_pos, added_rows);
    if !matches!(result, Ok(CopyRow::Stored)) {
        window.free_last_row();
    }
    result
}

/// Pack every column in ascending index order.
fn copy_columns<C>(
    cursor: &C,
    window: &mut Window,
    columns: usize,
    row: usize,
    start_pos: u64,
    added_rows: u64,
) -> Result<CopyRow>
where
    C: StepCursor + ?Sized,
{
    for col in 0..columns {
        let code = cursor.column_type_code(col);
        let Some(column_type) = ColumnType::from_code(code) else {
            return Err(WindowError::UnsupportedColumnType { code });
        };
        let put = match column_type {
            ColumnType::Null => window.put_null(row, col),
            ColumnType::Integer => window.put_i64(row, col, cursor.column_i64(col)?),
            ColumnType::Float => window.put_f64(row, col, cursor.column_f64(col)?),
            ColumnType::Text => window.put_text(row, col, cursor.column_text(col)?),
            ColumnType::Blob => window.put_blob(row, col, cursor.column_blob(col)?),
        };
        if put.is_err() {
            debug!(
                row = start_pos + added_rows,
                col,
                column_type = %column_type,
                "failed allocating space for column"
            );
            return Ok(CopyRow::Full);
        }
    }
    Ok(CopyRow::Stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlwin_types::{ColumnValue, FaultCursor, MemCursor, StepOutcome};

    use crate::window::capacity_for;

    fn cursor_with_row(row: Vec<ColumnValue>) -> MemCursor {
        let columns = row.len();
        let mut cursor = MemCursor::new(columns, vec![row]);
        assert_eq!(cursor.step().unwrap(), StepOutcome::Row);
        cursor
    }

    #[test]
    fn stores_a_mixed_row() {
        let cursor = cursor_with_row(vec![
            ColumnValue::Integer(1),
            ColumnValue::Float(0.25),
            ColumnValue::Text("abc".to_owned()),
            ColumnValue::Blob(vec![7, 8]),
            ColumnValue::Null,
        ]);
        let mut window = Window::with_capacity(1024);
        window.set_column_count(5).unwrap();

        let copied = copy_row(&cursor, &mut window, 5, 0, 0).unwrap();
        assert_eq!(copied, CopyRow::Stored);
        assert_eq!(window.row_count(), 1);
        assert_eq!(window.value_at(0, 0).unwrap(), ColumnValue::Integer(1));
        assert_eq!(window.value_at(0, 2).unwrap(), ColumnValue::Text("abc".to_owned()));
        assert_eq!(window.value_at(0, 4).unwrap(), ColumnValue::Null);
    }

    #[test]
    fn full_when_directory_does_not_fit() {
        let cursor = cursor_with_row(vec![ColumnValue::Integer(1)]);
        let mut window = Window::with_capacity(capacity_for(1, 1, 0));
        window.set_column_count(1).unwrap();
        assert_eq!(copy_row(&cursor, &mut window, 1, 0, 0).unwrap(), CopyRow::Stored);
        // No room for a second directory.
        assert_eq!(copy_row(&cursor, &mut window, 1, 0, 1).unwrap(), CopyRow::Full);
        assert_eq!(window.row_count(), 1);
    }

    #[test]
    fn oversized_column_abandons_whole_row() {
        let cursor = cursor_with_row(vec![
            ColumnValue::Integer(5),
            ColumnValue::Text("this payload is far too large".to_owned()),
        ]);
        // Directory fits, payload does not.
        let mut window = Window::with_capacity(capacity_for(1, 2, 4));
        window.set_column_count(2).unwrap();

        let before = window.free_space();
        assert_eq!(copy_row(&cursor, &mut window, 2, 0, 0).unwrap(), CopyRow::Full);
        assert_eq!(window.row_count(), 0);
        assert_eq!(window.free_space(), before);
    }

    #[test]
    fn unknown_type_code_is_fatal_and_releases_row() {
        let inner = cursor_with_row(vec![ColumnValue::Integer(1), ColumnValue::Integer(2)]);
        let cursor = FaultCursor::new(inner).with_type_code(1, 42);
        let mut window = Window::with_capacity(1024);
        window.set_column_count(2).unwrap();

        let err = copy_row(&cursor, &mut window, 2, 0, 0).unwrap_err();
        assert!(matches!(err, WindowError::UnsupportedColumnType { code: 42 }));
        assert_eq!(window.row_count(), 0);
    }

    #[test]
    fn zero_length_payloads_store() {
        let cursor = cursor_with_row(vec![
            ColumnValue::Text(String::new()),
            ColumnValue::Blob(Vec::new()),
        ]);
        let mut window = Window::with_capacity(1024);
        window.set_column_count(2).unwrap();
        assert_eq!(copy_row(&cursor, &mut window, 2, 0, 0).unwrap(), CopyRow::Stored);
        assert_eq!(window.text_at(0, 0).unwrap(), "");
        assert_eq!(window.blob_at(0, 1).unwrap(), &[] as &[u8]);
    }

    // ── Round-trip property ──────────────────────────────────────────────

    use proptest::prelude::*;

    fn arb_column_value() -> BoxedStrategy<ColumnValue> {
        prop_oneof![
            1 => Just(ColumnValue::Null),
            2 => any::<i64>().prop_map(ColumnValue::Integer),
            2 => prop_oneof![
                any::<f64>().prop_filter("NaN breaks PartialEq", |f| !f.is_nan()),
                Just(0.0_f64),
                Just(-0.0_f64),
                Just(f64::MAX),
                Just(f64::MIN_POSITIVE),
            ].prop_map(ColumnValue::Float),
            2 => "[ -~]{0,40}".prop_map(ColumnValue::Text),
            2 => proptest::collection::vec(any::<u8>(), 0..40).prop_map(ColumnValue::Blob),
        ]
        .boxed()
    }

    proptest::proptest! {
        /// Every value written by the encoder reads back bit-for-bit
        /// (Integer, Float) or byte-for-byte (Text, Blob).
        #[test]
        fn prop_encoded_rows_round_trip(
            rows in proptest::collection::vec(
                proptest::collection::vec(arb_column_value(), 3),
                1..20,
            )
        ) {
            let columns = 3;
            let mut cursor = MemCursor::new(columns, rows.clone());
            let mut window = Window::with_capacity(64 * 1024);
            window.set_column_count(columns).unwrap();

            let mut stored = 0usize;
            while cursor.step().unwrap() == StepOutcome::Row {
                let copied = copy_row(&cursor, &mut window, columns, 0, stored as u64).unwrap();
                prop_assert_eq!(copied, CopyRow::Stored);
                stored += 1;
            }

            prop_assert_eq!(window.row_count(), rows.len());
            for (r, row) in rows.iter().enumerate() {
                for (c, expected) in row.iter().enumerate() {
                    let actual = window.value_at(r, c).unwrap();
                    match (expected, &actual) {
                        // -0.0 == 0.0 under PartialEq; compare bits for floats.
                        (ColumnValue::Float(a), ColumnValue::Float(b)) => {
                            prop_assert_eq!(a.to_bits(), b.to_bits());
                        }
                        _ => prop_assert_eq!(expected, &actual),
                    }
                }
            }
        }
    }
}
