//! Public API facade for sqlwin.
//!
//! sqlwin materializes the results of a query executed against an embedded
//! relational engine into a bounded, randomly-re-readable, densely packed
//! binary buffer — the window — so callers can page through large result
//! sets without holding the full result in memory and without re-running
//! the query for every page.
//!
//! The engine is an external collaborator behind the [`StepCursor`] trait:
//! anything that can step a compiled statement row by row, report typed
//! columns, and reset can be materialized. [`fill_window`] drives one
//! pagination window; the [`scalar`] helpers cover single-row convenience
//! executions.
//!
//! ```
//! use sqlwin::{fill_window, ColumnValue, MaterializeConfig, MemCursor, Window};
//!
//! let rows = vec![
//!     vec![ColumnValue::Integer(1), ColumnValue::Text("ada".into())],
//!     vec![ColumnValue::Integer(2), ColumnValue::Text("grace".into())],
//! ];
//! let mut cursor = MemCursor::new(2, rows);
//! let mut window = Window::new();
//!
//! let outcome = fill_window(
//!     &mut cursor,
//!     &mut window,
//!     0,     // start storing at the first row
//!     0,     // the row that must be present
//!     false, // no exhaustive count
//!     &MaterializeConfig::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(outcome.total_rows, 2);
//! assert_eq!(window.text_at(1, 1).unwrap(), "grace");
//! ```

pub use sqlwin_error::{ErrorCode, Result, WindowError};
pub use sqlwin_exec::scalar;
pub use sqlwin_exec::{fill_window, FillOutcome, MaterializeConfig};
pub use sqlwin_types::{
    ColumnType, ColumnValue, FaultCursor, MemCursor, StepCursor, StepOutcome,
};
pub use sqlwin_window::{capacity_for, copy_row, CopyRow, Window, WindowFull, DEFAULT_CAPACITY};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> MaterializeConfig {
        MaterializeConfig::new().with_retry_sleep(Duration::ZERO)
    }

    /// Two columns per row: the row index and a 16-byte text payload.
    fn indexed_rows(n: usize) -> Vec<Vec<ColumnValue>> {
        (0..n)
            .map(|i| {
                vec![
                    ColumnValue::Integer(i as i64),
                    ColumnValue::Text(format!("item-{i:011}")),
                ]
            })
            .collect()
    }

    /// A window that holds exactly `rows` rows of the `indexed_rows` shape.
    fn window_holding(rows: usize) -> Window {
        Window::with_capacity(capacity_for(rows, 2, 16))
    }

    // ── Paging end to end ────────────────────────────────────────────────

    #[test]
    fn page_through_a_large_result() {
        let total = 95usize;
        let page = 20usize;
        let mut cursor = MemCursor::new(2, indexed_rows(total));
        let mut window = window_holding(page);

        let mut seen = Vec::new();
        let mut pos = 0u64;
        loop {
            let outcome =
                fill_window(&mut cursor, &mut window, pos, pos, false, &config()).unwrap();
            if window.row_count() == 0 {
                break;
            }
            for row in 0..window.row_count() {
                seen.push(window.i64_at(row, 0).unwrap());
            }
            pos = outcome.start_pos + window.row_count() as u64;
            if pos >= total as u64 {
                break;
            }
        }

        let expected: Vec<i64> = (0..total as i64).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn jump_to_an_arbitrary_position() {
        let mut cursor = MemCursor::new(2, indexed_rows(500));
        let mut window = window_holding(25);

        // Ask for row 400 the way a cursor adapter would: start a bit
        // before it, require it present.
        let outcome =
            fill_window(&mut cursor, &mut window, 390, 400, false, &config()).unwrap();
        let offset = (400 - outcome.start_pos) as usize;
        assert!(offset < window.row_count());
        assert_eq!(window.i64_at(offset, 0).unwrap(), 400);
        assert_eq!(window.text_at(offset, 1).unwrap(), "item-00000000400");
    }

    #[test]
    fn required_pos_far_past_window_capacity() {
        // The window holds 5 rows; the required row is 42 windows away
        // from the start. The restart policy must land it.
        let mut cursor = MemCursor::new(2, indexed_rows(300));
        let mut window = window_holding(5);
        let outcome =
            fill_window(&mut cursor, &mut window, 0, 210, false, &config()).unwrap();
        let start = outcome.start_pos;
        let stored = window.row_count() as u64;
        assert!(start <= 210 && 210 < start + stored);
        let offset = (210 - start) as usize;
        assert_eq!(window.i64_at(offset, 0).unwrap(), 210);
    }

    #[test]
    fn exhaustive_count_with_small_window() {
        let mut cursor = MemCursor::new(2, indexed_rows(333));
        let mut window = window_holding(10);
        let outcome =
            fill_window(&mut cursor, &mut window, 0, 0, true, &config()).unwrap();
        assert_eq!(outcome.total_rows, 333);
        assert_eq!(window.row_count(), 10);
    }

    #[test]
    fn rematerialization_is_idempotent() {
        let mut cursor = MemCursor::new(2, indexed_rows(80));
        let mut window = window_holding(10);

        let first = fill_window(&mut cursor, &mut window, 30, 55, false, &config()).unwrap();
        let first_ids: Vec<i64> = (0..window.row_count())
            .map(|r| window.i64_at(r, 0).unwrap())
            .collect();

        let second = fill_window(&mut cursor, &mut window, 30, 55, false, &config()).unwrap();
        let second_ids: Vec<i64> = (0..window.row_count())
            .map(|r| window.i64_at(r, 0).unwrap())
            .collect();

        assert_eq!(first, second);
        assert_eq!(first_ids, second_ids);
    }

    // ── Values survive the window byte-for-byte ──────────────────────────

    #[test]
    fn all_value_kinds_survive_materialization() {
        let rows = vec![
            vec![
                ColumnValue::Null,
                ColumnValue::Integer(i64::MIN),
                ColumnValue::Float(std::f64::consts::PI),
                ColumnValue::Text("naïve — über".to_owned()),
                ColumnValue::Blob(vec![0x00, 0xff, 0x7f]),
            ],
            vec![
                ColumnValue::Integer(i64::MAX),
                ColumnValue::Float(-0.0),
                ColumnValue::Text(String::new()),
                ColumnValue::Blob(Vec::new()),
                ColumnValue::Null,
            ],
        ];
        let mut cursor = MemCursor::new(5, rows.clone());
        let mut window = Window::new();
        fill_window(&mut cursor, &mut window, 0, 0, false, &config()).unwrap();

        for (r, row) in rows.iter().enumerate() {
            for (c, expected) in row.iter().enumerate() {
                let actual = window.value_at(r, c).unwrap();
                match (expected, &actual) {
                    (ColumnValue::Float(a), ColumnValue::Float(b)) => {
                        assert_eq!(a.to_bits(), b.to_bits());
                    }
                    _ => assert_eq!(expected, &actual),
                }
            }
        }
    }

    // ── Contention and failure scenarios ─────────────────────────────────

    #[test]
    fn busy_forty_nine_times_succeeds() {
        let inner = MemCursor::new(2, indexed_rows(3));
        let mut cursor = FaultCursor::new(inner).with_busy_prefix(49);
        let mut window = window_holding(10);
        let outcome =
            fill_window(&mut cursor, &mut window, 0, 0, false, &config()).unwrap();
        assert_eq!(outcome.total_rows, 3);
    }

    #[test]
    fn busy_fifty_one_times_times_out() {
        let inner = MemCursor::new(2, indexed_rows(3));
        let mut cursor = FaultCursor::new(inner).with_busy_prefix(51);
        let mut window = window_holding(10);
        let err =
            fill_window(&mut cursor, &mut window, 0, 0, false, &config()).unwrap_err();
        assert!(matches!(err, WindowError::LockTimeout { .. }));
        assert_eq!(err.error_code(), ErrorCode::Busy);
    }

    #[test]
    fn unsupported_type_leaves_no_partial_row() {
        let inner = MemCursor::new(2, indexed_rows(3));
        let mut cursor = FaultCursor::new(inner).with_type_code(1, 99);
        let mut window = window_holding(10);
        let err =
            fill_window(&mut cursor, &mut window, 0, 0, false, &config()).unwrap_err();
        assert!(matches!(
            err,
            WindowError::UnsupportedColumnType { code: 99 }
        ));
        assert_eq!(window.row_count(), 0);
    }

    #[test]
    fn cursor_reusable_after_failure() {
        let inner = MemCursor::new(2, indexed_rows(5));
        let mut cursor = FaultCursor::new(inner).with_step_failure(3, 9, "interrupted");
        let mut window = window_holding(10);
        assert!(fill_window(&mut cursor, &mut window, 0, 0, false, &config()).is_err());

        // The failed call reset the cursor; a fresh wrapper-free drive of
        // the prefix works again from the top.
        assert_eq!(cursor.step().unwrap(), StepOutcome::Row);
        assert_eq!(cursor.column_i64(0).unwrap(), 0);
    }

    // ── Scalar helpers through the facade ────────────────────────────────

    #[test]
    fn scalar_round_trip() {
        let mut cursor = MemCursor::new(1, vec![vec![ColumnValue::Integer(4096)]]);
        assert_eq!(scalar::query_i64(&mut cursor, -1).unwrap(), 4096);
        // The helper reset the cursor, so it can be run again.
        assert_eq!(scalar::query_i64(&mut cursor, -1).unwrap(), 4096);
    }

    #[test]
    fn pragma_style_concat() {
        let mut cursor = MemCursor::new(
            2,
            vec![vec![
                ColumnValue::Text("wal".to_owned()),
                ColumnValue::Integer(2),
            ]],
        );
        assert_eq!(
            scalar::concat_text(&mut cursor).unwrap(),
            Some("wal2".to_owned())
        );
    }
}
