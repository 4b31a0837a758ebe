//! The windowed result materializer.
//!
//! One call fills a caller-owned [`Window`] with a contiguous slice of a
//! statement's result, starting at a requested row position. The window is
//! cleared and re-seeded at the start of every call and left populated for
//! the caller to read afterwards; the cursor is always reset before the
//! call returns so the same compiled statement can be re-executed.
//!
//! The overflow-recovery rule: when the window fills before reaching
//! `required_pos` (the one row the caller actually needs visible), the
//! window is cleared and refilled starting at the row that did not fit.
//! Without this, a window smaller than the distance between `start_pos`
//! and `required_pos` would fill up on earlier rows forever; restarting
//! guarantees the required position becomes reachable within one window's
//! capacity, at the cost of re-discarding rows that were already encoded.

use std::thread;

use tracing::{debug, error, trace, warn};

use sqlwin_error::{Result, WindowError};
use sqlwin_types::{StepCursor, StepOutcome};
use sqlwin_window::{copy_row, CopyRow, Window};

use crate::config::MaterializeConfig;

/// Positional metadata for one materialization call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillOutcome {
    /// Zero-based index, within the full result, of the first row actually
    /// stored in the window. May differ from the requested start position
    /// when overflow recovery advanced the window.
    pub start_pos: u64,
    /// Number of rows the cursor produced before the call stopped. This is
    /// the full result size only when the cursor was exhausted (always the
    /// case with `count_all_rows`).
    pub total_rows: u64,
}

/// Fill `window` with rows from `cursor`, starting at result position
/// `start_pos` and guaranteeing that the row at `required_pos` is stored
/// if the result reaches it.
///
/// With `count_all_rows` the cursor keeps being stepped (and rows counted)
/// after the window fills, so `total_rows` is the exhaustive result size.
///
/// The cursor is reset before returning, on success and on failure alike.
/// A `start_pos` beyond the end of the result is not an error: it is
/// logged as an anomaly and yields an empty window.
pub fn fill_window<C>(
    cursor: &mut C,
    window: &mut Window,
    start_pos: u64,
    required_pos: u64,
    count_all_rows: bool,
    config: &MaterializeConfig,
) -> Result<FillOutcome>
where
    C: StepCursor + ?Sized,
{
    let outcome = drive(cursor, window, start_pos, required_pos, count_all_rows, config);

    // Release the cursor back to its idle state whatever happened above. A
    // reset failure must not mask a fill error, but is surfaced when the
    // fill itself succeeded.
    match cursor.reset() {
        Ok(()) => outcome,
        Err(reset_error) => match outcome {
            Ok(_) => Err(reset_error),
            Err(error) => {
                warn!(error = %reset_error, "cursor reset failed after a failed window fill");
                Err(error)
            }
        },
    }
}

fn drive<C>(
    cursor: &mut C,
    window: &mut Window,
    mut start_pos: u64,
    required_pos: u64,
    count_all_rows: bool,
    config: &MaterializeConfig,
) -> Result<FillOutcome>
where
    C: StepCursor + ?Sized,
{
    window.clear();
    let columns = cursor.column_count();
    window.set_column_count(columns)?;

    let mut retry_count: u32 = 0;
    let mut total_rows: u64 = 0;
    let mut added_rows: u64 = 0;
    let mut window_full = false;

    while !window_full || count_all_rows {
        match cursor.step()? {
            StepOutcome::Row => {
                trace!(row = total_rows, "stepped cursor to a row");
                retry_count = 0;
                total_rows += 1;

                // Skip the row if the window is full or the start position
                // has not been reached yet; it still counts as seen.
                if start_pos >= total_rows || window_full {
                    continue;
                }

                let mut copied = copy_row(&*cursor, window, columns, start_pos, added_rows)?;
                if copied == CopyRow::Full
                    && added_rows > 0
                    && start_pos + added_rows <= required_pos
                {
                    // The window filled before reaching the row the caller
                    // actually needs. Restart it at the current row,
                    // discarding the rows stored so far.
                    debug!(
                        start_pos,
                        added_rows, required_pos, "window full before required row, restarting"
                    );
                    window.clear();
                    window.set_column_count(columns)?;
                    start_pos += added_rows;
                    added_rows = 0;
                    copied = copy_row(&*cursor, window, columns, start_pos, added_rows)?;
                }

                match copied {
                    CopyRow::Stored => added_rows += 1,
                    CopyRow::Full => window_full = true,
                }
            }
            StepOutcome::Done => {
                trace!("result set exhausted");
                break;
            }
            StepOutcome::Busy | StepOutcome::Locked => {
                if retry_count >= config.retry_limit {
                    error!(retries = retry_count, "giving up on database lock retry");
                    return Err(WindowError::LockTimeout {
                        retries: retry_count,
                    });
                }
                trace!(retry_count, "database locked, retrying");
                thread::sleep(config.retry_sleep);
                retry_count += 1;
            }
        }
    }

    debug!(
        total_rows,
        added_rows,
        bytes_used = window.capacity() - window.free_space(),
        "window fill finished"
    );
    if start_pos > total_rows {
        // Diagnostic anomaly only: the result was shorter than the
        // requested start, so the window is valid but empty.
        warn!(start_pos, total_rows, "window start position beyond result end");
    }

    Ok(FillOutcome {
        start_pos,
        total_rows,
    })
}
