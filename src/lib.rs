//! # crosscopy
//!
//! A bounded-concurrency pipeline for bulk-copying objects between cloud
//! storage backends.
//!
//! The input is a manifest: tab-separated lines of `(container, key)` pairs
//! naming objects in a source store. One producer streams the manifest into a
//! bounded work queue, a fixed pool of workers pulls items and performs the
//! transfers concurrently, and an aggregator tallies outcomes and decides
//! when the run is over. The actual storage I/O is behind the
//! [`ObjectSource`] / [`ObjectSink`] traits; this crate owns the coordination
//! and failure discipline, not the backend protocols.
//!
//! ## Core guarantees
//!
//! - **Exactly-once consumption**: every manifest line becomes one work item,
//!   handled by exactly one worker; items are never duplicated or skipped.
//! - **Deterministic termination**: each worker emits a completion marker as
//!   its final message; the run ends exactly when all markers are in, whether
//!   items succeeded, failed, or the run was cancelled.
//! - **Two error classes, two paths**: malformed manifest structure is fatal
//!   and surfaces as an [`Error`]; an individual transfer failing (missing
//!   object, bad key encoding, write refused) is logged, counted in the
//!   [`RunReport`], and never stops the other items.
//! - **Streaming**: object bodies flow from source to sink through a boxed
//!   reader and are never materialized in memory as a whole.
//!
//! ## Example
//!
//! ```no_run
//! use std::io::BufReader;
//! use std::sync::Arc;
//! use crosscopy::{Copier, PipelineOptions, UploadOptions, run};
//! # fn collaborators() -> (Arc<dyn crosscopy::ObjectSource>, Arc<dyn crosscopy::ObjectSink>) { unimplemented!() }
//!
//! let (source, sink) = collaborators();
//! let copier = Copier::new(source, sink, UploadOptions::default());
//! let options = PipelineOptions::default().with_workers(8);
//!
//! let manifest = BufReader::new(std::fs::File::open("objects.tsv")?);
//! let report = run(manifest, &copier, &options)?;
//! println!("{} copied, {} failed", report.items_succeeded, report.items_failed());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod item;
mod naming;
mod options;
mod pipeline;
mod source;
mod store;
mod transfer;

pub use error::{Error, Result};
pub use item::WorkItem;
pub use naming::{DecodeKeyError, decode_key, destination_container};
pub use options::PipelineOptions;
pub use pipeline::{RunReport, run};
pub use store::{
    AccessTier, ErrorDetail, ObjectBody, ObjectSink, ObjectSource, SinkError, SourceError,
    UploadOptions,
};
pub use transfer::{Copier, TransferError};
