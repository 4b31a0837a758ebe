//! Driving layer: fills result windows from stepping cursors and runs
//! single-row convenience executions.
//!
//! [`fill_window`] is the windowed result materializer: it steps a prepared
//! statement row by row, encodes rows into a caller-owned
//! [`Window`](sqlwin_window::Window), recovers from window exhaustion
//! mid-scan, retries transient lock contention, and reports back precise
//! positional metadata. The [`scalar`] module holds the sibling helpers for
//! statements expected to produce at most one row.
//!
//! Everything here is synchronous and single-threaded: one call runs to
//! completion on the calling thread, and the only waiting primitive is the
//! bounded lock-retry sleep configured via [`MaterializeConfig`].

pub mod config;
pub mod materializer;
pub mod scalar;

pub use config::MaterializeConfig;
pub use materializer::{fill_window, FillOutcome};
