//! The unit of work: one object to move between backends.

use std::fmt;

/// One transfer request: an object key within a source container.
///
/// Produced by the manifest parser, consumed by exactly one worker, and
/// discarded once the transfer outcome has been reported. The `key` is kept
/// exactly as it appeared in the manifest (still percent-encoded); decoding
/// happens inside the transfer so that a bad encoding fails that one item
/// instead of the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Source container (S3 bucket) name
    pub container: String,
    /// Percent-encoded object key
    pub key: String,
}

impl WorkItem {
    /// Create a work item from a container name and a raw (still encoded) key.
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.key)
    }
}
