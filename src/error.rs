//! Crate-level error types.

use thiserror::Error;

/// Errors produced by the molmorph crate.
#[derive(Debug, Error)]
pub enum MorphError {
    /// Malformed or truncated structure record.
    #[error("failed to parse structure record: {details} (at line ~{line})")]
    Parse {
        /// 1-based line number the parser stopped at.
        line: usize,
        /// Human-readable description of the problem.
        details: String,
    },
    /// Atom/element/bond arrays that violate the molecule invariants.
    #[error("invalid molecule: {0}")]
    InvalidMolecule(String),
    /// The data source could not be reached or failed mid-request.
    #[error("structure source unavailable for '{id}': {reason}")]
    SourceUnavailable {
        /// Identifier that was being resolved.
        id: String,
        /// Underlying failure description.
        reason: String,
    },
    /// The data source does not know the identifier.
    #[error("no structure found for '{0}'")]
    NotFound(String),
    /// A sequence index outside the published sequence.
    #[error("sequence index {index} out of bounds (len {len})")]
    InvalidIndex {
        /// Requested index.
        index: usize,
        /// Current sequence length.
        len: usize,
    },
    /// Generic I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML options parsing/serialization failure.
    #[error("options parse error: {0}")]
    OptionsParse(String),
    /// Failed to spawn a background thread.
    #[error("failed to spawn thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),
}

impl MorphError {
    /// Shorthand for a [`MorphError::Parse`] at `line`.
    pub fn parse(line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            line,
            details: details.into(),
        }
    }

    /// Whether this error only affects a single sequence element, so the
    /// builder should skip the element and keep going.
    #[must_use]
    pub fn is_element_fatal(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. } | Self::SourceUnavailable { .. } | Self::NotFound(_)
        )
    }
}
