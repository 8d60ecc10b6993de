use thiserror::Error;

/// Record-level validation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was empty or whitespace only
    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),

    /// A field exceeded its length limit
    #[error("field `{field}` is too long ({len} chars, max {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// Identifier contains characters that are unsafe in a file name
    #[error("invalid complaint id: {0:?}")]
    InvalidId(String),

    /// Severity string did not name a known level
    #[error("unknown severity: {0:?} (expected low, medium, high or critical)")]
    UnknownSeverity(String),
}
