//! Storage collaborator boundary.
//!
//! The pipeline never talks to a cloud SDK directly; it goes through the
//! [`ObjectSource`] / [`ObjectSink`] traits defined here. Concrete backends
//! live with the binary (see the CLI crate), and tests substitute in-memory
//! fakes.
//!
//! Bodies are streamed: a read hands back a boxed [`Read`] and a write
//! consumes it, so an object is never materialized in memory as a whole.
//! Dropping the body closes the underlying stream on every exit path —
//! success, failure, or cancellation.

use std::error::Error as StdError;
use std::fmt;
use std::io::Read;
use std::str::FromStr;
use thiserror::Error;

use crate::error::Error;

/// A streaming object body handed from source to sink.
pub type ObjectBody = Box<dyn Read + Send>;

/// Boxed error detail carried by collaborator failures.
pub type ErrorDetail = Box<dyn StdError + Send + Sync>;

/// Why a source read failed. Always a per-item failure.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SourceError {
    /// The object does not exist in the source container.
    #[error("object not found")]
    NotFound,

    /// Anything else: network trouble, throttling, a backend outage.
    #[error("{0}")]
    Transient(ErrorDetail),
}

/// Why a destination write failed. Always a per-item failure.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SinkError {
    /// The credentials in use may not write to the destination container.
    #[error("permission denied: {0}")]
    Permission(ErrorDetail),

    /// Anything else: network trouble, throttling, a backend outage.
    #[error("{0}")]
    Transient(ErrorDetail),
}

/// Destination access tier, validated against a fixed allow-list.
///
/// These are the tiers the destination backend's data model exposes; anything
/// else is rejected at startup, not at transfer time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessTier {
    /// Frequently accessed data (the default)
    #[default]
    Hot,
    /// Infrequently accessed data
    Cool,
    /// Offline archive
    Archive,
}

impl AccessTier {
    /// Canonical name of the tier as the backend expects it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hot => "Hot",
            Self::Cool => "Cool",
            Self::Archive => "Archive",
        }
    }
}

impl fmt::Display for AccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("hot") {
            Ok(Self::Hot)
        } else if s.eq_ignore_ascii_case("cool") {
            Ok(Self::Cool)
        } else if s.eq_ignore_ascii_case("archive") {
            Ok(Self::Archive)
        } else {
            Err(Error::UnknownTier {
                value: s.to_string(),
            })
        }
    }
}

/// Options applied to every destination write.
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadOptions {
    /// Access tier for the written object
    pub tier: AccessTier,
}

/// The read half of the collaborator contract.
pub trait ObjectSource: Send + Sync {
    /// Open a streaming read of `key` within `container`.
    ///
    /// `key` is already percent-decoded by the caller.
    fn read(&self, container: &str, key: &str) -> Result<ObjectBody, SourceError>;
}

/// The write half of the collaborator contract.
pub trait ObjectSink: Send + Sync {
    /// Stream `body` into `key` within `container`, consuming the body.
    ///
    /// `container` has already been mapped to the destination naming rules.
    fn write(
        &self,
        container: &str,
        key: &str,
        body: ObjectBody,
        options: &UploadOptions,
    ) -> Result<(), SinkError>;
}
