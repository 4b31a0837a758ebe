//! Fixed-capacity result window buffer and row encoder.
//!
//! A [`Window`] holds a contiguous slice of a query result in a single
//! exclusively-owned byte arena: a small header, one field directory per
//! row packed from the low end, and variable-length text/blob payloads
//! packed from the high end. The two regions grow toward each other;
//! running out of space is the recoverable [`WindowFull`] signal that
//! drives the overflow-recovery policy in the materializer, never a
//! failure by itself.
//!
//! [`encoder::copy_row`] serializes one cursor row into the next free row
//! slot, abandoning the whole row when any single column does not fit so
//! that partially-encoded rows are never visible.

pub mod encoder;
pub mod window;

pub use encoder::{copy_row, CopyRow};
pub use window::{capacity_for, Window, WindowFull, DEFAULT_CAPACITY};
