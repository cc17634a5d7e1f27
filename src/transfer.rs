//! The transfer operation: move one object from source to sink.

use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::item::WorkItem;
use crate::naming::{DecodeKeyError, decode_key, destination_container};
use crate::store::{ObjectSink, ObjectSource, SinkError, SourceError, UploadOptions};

/// Why one transfer failed.
///
/// Every variant is recoverable at the run level: the item is reported and
/// counted as a failure, and the pipeline moves on.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TransferError {
    /// The manifest key could not be percent-decoded.
    #[error("could not decode key {key:?}: {source}")]
    Decode {
        /// The raw key as it appeared in the manifest
        key: String,
        /// What was wrong with the encoding
        source: DecodeKeyError,
    },

    /// Reading the object from the source backend failed.
    #[error("{container}/{key} download failed: {source}")]
    Download {
        /// Source container name
        container: String,
        /// Decoded object key
        key: String,
        /// Collaborator failure detail
        source: SourceError,
    },

    /// Writing the object to the destination backend failed.
    #[error("{container}/{key} upload failed: {source}")]
    Upload {
        /// Destination container name (already mapped)
        container: String,
        /// Decoded object key
        key: String,
        /// Collaborator failure detail
        source: SinkError,
    },
}

/// Executes transfers against a pair of storage collaborators.
///
/// Cheap to clone-per-worker via the shared `Arc` handles; the collaborators
/// themselves are expected to be thread-safe client wrappers.
pub struct Copier {
    source: Arc<dyn ObjectSource>,
    sink: Arc<dyn ObjectSink>,
    options: UploadOptions,
}

impl Copier {
    /// Build a copier from a source, a sink, and upload options.
    pub fn new(
        source: Arc<dyn ObjectSource>,
        sink: Arc<dyn ObjectSink>,
        options: UploadOptions,
    ) -> Self {
        Self {
            source,
            sink,
            options,
        }
    }

    /// Transfer one object: decode the key, map the container name, read from
    /// the source, and stream into the sink.
    ///
    /// Logs one line per successful transfer. The body is dropped (and the
    /// source stream closed) on every path out of this function.
    pub fn copy(&self, item: &WorkItem) -> Result<(), TransferError> {
        let key = decode_key(&item.key).map_err(|source| TransferError::Decode {
            key: item.key.clone(),
            source,
        })?;

        let body = self
            .source
            .read(&item.container, &key)
            .map_err(|source| TransferError::Download {
                container: item.container.clone(),
                key: key.clone(),
                source,
            })?;

        let dest = destination_container(&item.container);
        self.sink
            .write(&dest, &key, body, &self.options)
            .map_err(|source| TransferError::Upload {
                container: dest.clone(),
                key: key.clone(),
                source,
            })?;

        info!(container = %item.container, key = %key, "copied");
        Ok(())
    }
}
