use thiserror::Error;

/// Primary error type for window materialization and scalar execution.
///
/// Modeled after the engine's error codes with Rust-idiomatic structure:
/// structured variants for the cases callers match on, plus a wrapped
/// engine error for everything the underlying cursor reports itself.
///
/// Window exhaustion is deliberately absent. Running out of window space is
/// a recoverable condition that drives the overflow-recovery policy inside
/// the materializer and is never surfaced to callers as a failure.
#[derive(Error, Debug)]
pub enum WindowError {
    // === Window setup ===
    /// The window could not be cleared or re-seeded at the start of a fill.
    #[error("failed to initialize the result window: {detail}")]
    WindowInit { detail: String },

    // === Encoding ===
    /// The cursor reported a column type code outside the supported set.
    #[error("unknown column type code {code} when filling window")]
    UnsupportedColumnType { code: i32 },

    // === Lock contention ===
    /// Transient lock contention persisted past the retry ceiling.
    #[error("database lock retry count exceeded after {retries} attempts")]
    LockTimeout { retries: u32 },

    // === Engine ===
    /// The underlying engine reported a fatal error while stepping or
    /// reading a column.
    #[error("engine error {code}: {message}")]
    Engine { code: i32, message: String },

    // === Protocol violations (scalar helpers) ===
    /// An execute-only statement produced a result row.
    #[error("unexpected result row: queries must not be run through execute-only paths")]
    UnexpectedRow,

    /// A statement contractually required to produce one row produced none.
    #[error("statement produced no rows where exactly one was required")]
    MissingRow,

    /// A single-value statement produced the wrong number of columns.
    #[error("expected exactly {expected} column(s), got {actual}")]
    ColumnCountMismatch { expected: usize, actual: usize },

    /// A single-row statement produced a second row.
    #[error("got more than one row from a single-row statement")]
    ExtraRow,

    // === Internal ===
    /// Internal invariant violation (should never happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Engine result/error codes, matching the numeric values the underlying
/// engine uses on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    /// Successful result.
    Ok = 0,
    /// Generic error.
    Error = 1,
    /// Internal logic error.
    Internal = 2,
    /// Database file is locked.
    Busy = 5,
    /// Table is locked.
    Locked = 6,
    /// Interrupted by an engine-level interrupt signal.
    Interrupt = 9,
    /// Library used incorrectly.
    Misuse = 21,
}

impl WindowError {
    /// Map this error to a numeric engine code.
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::WindowInit { .. } | Self::UnsupportedColumnType { .. } => ErrorCode::Error,
            Self::LockTimeout { .. } => ErrorCode::Busy,
            Self::Engine { .. } => ErrorCode::Error,
            Self::UnexpectedRow
            | Self::MissingRow
            | Self::ColumnCountMismatch { .. }
            | Self::ExtraRow => ErrorCode::Misuse,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Whether this error wraps transient lock contention that may succeed
    /// on retry from the caller's side.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Engine { code, .. } => {
                *code == ErrorCode::Busy as i32 || *code == ErrorCode::Locked as i32
            }
            _ => false,
        }
    }

    /// Whether this error is a scalar-helper contract violation.
    pub const fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedRow
                | Self::MissingRow
                | Self::ColumnCountMismatch { .. }
                | Self::ExtraRow
        )
    }

    /// Create a window-initialization error.
    pub fn init(detail: impl Into<String>) -> Self {
        Self::WindowInit {
            detail: detail.into(),
        }
    }

    /// Wrap an engine error code and message.
    pub fn engine(code: i32, message: impl Into<String>) -> Self {
        Self::Engine {
            code,
            message: message.into(),
        }
    }

    /// Engine-side transient contention surfaced as a hard error (used by
    /// paths that carry no retry logic of their own).
    pub fn engine_busy() -> Self {
        Self::engine(ErrorCode::Busy as i32, "database is busy")
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type alias using `WindowError`.
pub type Result<T> = std::result::Result<T, WindowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = WindowError::UnsupportedColumnType { code: 42 };
        assert_eq!(
            err.to_string(),
            "unknown column type code 42 when filling window"
        );
    }

    #[test]
    fn error_display_lock_timeout() {
        let err = WindowError::LockTimeout { retries: 50 };
        assert_eq!(
            err.to_string(),
            "database lock retry count exceeded after 50 attempts"
        );
    }

    #[test]
    fn error_display_column_mismatch() {
        let err = WindowError::ColumnCountMismatch {
            expected: 1,
            actual: 3,
        };
        assert_eq!(err.to_string(), "expected exactly 1 column(s), got 3");
    }

    #[test]
    fn error_code_mapping() {
        assert_eq!(
            WindowError::LockTimeout { retries: 1 }.error_code(),
            ErrorCode::Busy
        );
        assert_eq!(
            WindowError::UnsupportedColumnType { code: 0 }.error_code(),
            ErrorCode::Error
        );
        assert_eq!(WindowError::UnexpectedRow.error_code(), ErrorCode::Misuse);
        assert_eq!(WindowError::ExtraRow.error_code(), ErrorCode::Misuse);
        assert_eq!(
            WindowError::internal("bug").error_code(),
            ErrorCode::Internal
        );
    }

    #[test]
    fn is_transient() {
        assert!(WindowError::engine_busy().is_transient());
        assert!(WindowError::engine(ErrorCode::Locked as i32, "table locked").is_transient());
        assert!(!WindowError::engine(ErrorCode::Interrupt as i32, "interrupted").is_transient());
        assert!(!WindowError::LockTimeout { retries: 50 }.is_transient());
        assert!(!WindowError::UnexpectedRow.is_transient());
    }

    #[test]
    fn protocol_violations() {
        assert!(WindowError::UnexpectedRow.is_protocol_violation());
        assert!(WindowError::MissingRow.is_protocol_violation());
        assert!(WindowError::ExtraRow.is_protocol_violation());
        assert!(
            WindowError::ColumnCountMismatch {
                expected: 1,
                actual: 2
            }
            .is_protocol_violation()
        );
        assert!(!WindowError::engine_busy().is_protocol_violation());
        assert!(!WindowError::init("x").is_protocol_violation());
    }

    #[test]
    fn convenience_constructors() {
        let err = WindowError::init("column count changed");
        assert!(matches!(err, WindowError::WindowInit { detail } if detail == "column count changed"));

        let err = WindowError::engine(9, "interrupted");
        assert!(matches!(err, WindowError::Engine { code: 9, .. }));

        let err = WindowError::engine_busy();
        assert_eq!(err.to_string(), "engine error 5: database is busy");
    }

    #[test]
    fn error_code_values() {
        assert_eq!(ErrorCode::Ok as i32, 0);
        assert_eq!(ErrorCode::Busy as i32, 5);
        assert_eq!(ErrorCode::Locked as i32, 6);
        assert_eq!(ErrorCode::Interrupt as i32, 9);
        assert_eq!(ErrorCode::Misuse as i32, 21);
    }
}
