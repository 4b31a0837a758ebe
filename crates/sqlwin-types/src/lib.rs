//! Core vocabulary for the sqlwin result-window materializer.
//!
//! This crate defines the values a query row is made of ([`ColumnValue`],
//! [`ColumnType`]), the outcomes of advancing a prepared statement
//! ([`StepOutcome`]), and the [`StepCursor`] trait that is the boundary to
//! the underlying query engine. Everything above this crate is generic over
//! `StepCursor`; nothing in the workspace knows how rows are actually
//! produced.
//!
//! [`MemCursor`] is the in-memory reference implementation used by tests
//! and adapters, and [`FaultCursor`] wraps any cursor to inject transient
//! contention and failures for exercising the recovery paths.

pub mod cursor;
pub mod fault;
pub mod mem;
pub mod value;

pub use cursor::{StepCursor, StepOutcome};
pub use fault::FaultCursor;
pub use mem::MemCursor;
pub use value::{ColumnType, ColumnValue};
