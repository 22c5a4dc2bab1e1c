//! Error type shared by every traceback operation.
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TraceError {
    /// Growing a trace (or its domain index) could not obtain memory.
    Allocation(String),
    /// Malformed trace, alignment, or sequence input.
    Format(String),
    /// A semantic invariant of a finished trace is violated.
    Validation(String),
    /// Naive, compensated and backward score sums disagree.
    NumericInconsistency {
        naive: f32,
        kahan: f32,
        backwards: f32,
    },
}

impl fmt::Display for TraceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceError::Allocation(msg) => write!(f, "allocation failure: {}", msg),
            TraceError::Format(msg) => write!(f, "format error: {}", msg),
            TraceError::Validation(msg) => write!(f, "validation error: {}", msg),
            TraceError::NumericInconsistency {
                naive,
                kahan,
                backwards,
            } => write!(
                f,
                "score sums disagree: naive {:.6}, kahan {:.6}, backwards {:.6}",
                naive, kahan, backwards
            ),
        }
    }
}

impl std::error::Error for TraceError {}

impl From<std::collections::TryReserveError> for TraceError {
    fn from(why: std::collections::TryReserveError) -> Self {
        TraceError::Allocation(why.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TraceError>;

/// Shorthand for `Err(TraceError::Format(..))` with `format!` arguments.
macro_rules! format_err {
    ($($arg:tt)*) => {
        Err($crate::error::TraceError::Format(format!($($arg)*)))
    };
}

/// Shorthand for `Err(TraceError::Validation(..))` with `format!` arguments.
macro_rules! invalid {
    ($($arg:tt)*) => {
        Err($crate::error::TraceError::Validation(format!($($arg)*)))
    };
}
