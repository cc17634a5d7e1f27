//! Error types for crosscopy.
//!
//! This module covers the *fatal* error class only: conditions that abort a
//! whole run (bad configuration, malformed manifest structure, input I/O
//! failures). Failures of individual transfers are a separate, recoverable
//! class and live in [`TransferError`](crate::TransferError) — they are
//! counted and logged, never propagated through [`Result`].

use std::io;
use thiserror::Error;

/// Result type for crosscopy operations.
///
/// This is a type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors that abort a whole run.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Reading the input manifest failed partway through.
    #[error("error reading input at line {line}: {source}")]
    Input {
        /// 1-based line number where the read failed
        line: usize,
        /// Underlying I/O error
        source: io::Error,
    },

    /// A manifest line did not have exactly two tab-separated fields.
    #[error("wrong number of fields at line {line}: {fields} fields")]
    FieldCount {
        /// 1-based line number of the malformed line
        line: usize,
        /// Number of fields actually present
        fields: usize,
    },

    /// An access tier value outside the fixed allow-list.
    #[error("unknown access tier {value:?} (expected one of: Hot, Cool, Archive)")]
    UnknownTier {
        /// The rejected value
        value: String,
    },
}
