//! Crate error type.

use crate::validation::ValidationError;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the allocation engine and the scheduling operations.
///
/// Allocation heuristics themselves never fail for lack of a good answer;
/// errors are reserved for malformed input and collaborator failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A feasible range with `low > high` reached an allocator.
    #[error("invalid day range [{low}, {high}]: low bound exceeds high bound")]
    InvalidRange { low: i64, high: i64 },

    /// Candidate days passed to a bulk allocation were not strictly ascending.
    #[error("candidate days must be strictly ascending (violated at index {index})")]
    UnsortedCandidates { index: usize },

    /// A single-day sampler was asked to choose from nothing.
    #[error("no candidate days to sample from")]
    NoCandidates,

    /// Allocation input failed structural validation.
    #[error("invalid allocation input: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    /// Configuration value out of its accepted domain.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The host collection rejected a read or write.
    #[error("collection error: {0}")]
    Collection(String),

    /// A background worker terminated abnormally.
    #[error("background worker failed: {0}")]
    Worker(String),

    /// Configuration JSON could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<Vec<ValidationError>> for Error {
    fn from(errors: Vec<ValidationError>) -> Self {
        Error::Validation(errors)
    }
}
