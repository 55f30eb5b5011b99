use thiserror::Error;

/// Errors that can occur while issuing identifiers or computing amounts.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MoadianError {
    /// The fiscal scope is not a well-formed 6-character identifier.
    #[error("scope error: {0}")]
    Scope(String),

    /// The serial store could not be read or written, or holds a corrupt record.
    #[error("storage error: {0}")]
    Storage(String),

    /// A value does not fit its fixed-width field.
    #[error("format error: {0}")]
    Format(String),

    /// Out-of-range monetary input.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A parsed identifier carries the wrong check digit.
    #[error(transparent)]
    Checksum(#[from] ChecksumMismatch),
}

/// Check digit found in an identifier does not match the one recomputed
/// over its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecksumMismatch {
    /// Digit recomputed over the payload.
    pub expected: u8,
    /// Digit carried by the input.
    pub found: u8,
}

impl std::fmt::Display for ChecksumMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "checksum mismatch: expected {}, found {}",
            self.expected, self.found
        )
    }
}

impl std::error::Error for ChecksumMismatch {}
