//! Work source: parses the transfer manifest and feeds the work queue.
//!
//! The manifest is line-oriented text with exactly two tab-separated fields
//! per line: source container and percent-encoded object key. Structural
//! problems (wrong field count, a read error) are fatal for the whole run;
//! end of input closes the queue cleanly. Keys are not decoded here — a bad
//! encoding should fail one item, not the run, so decoding is deferred to the
//! transfer itself.

use crate::error::{Error, Result};
use crate::item::WorkItem;
use crossbeam_channel::Sender;
use std::io::BufRead;

/// Read the manifest from `input` and push one [`WorkItem`] per line into
/// `queue`. Returns the number of items produced.
///
/// Blank lines are skipped and a trailing `\r` is stripped, so manifests with
/// CRLF line endings parse the same as LF ones.
///
/// If every receiver of `queue` has gone away (the pipeline is shutting
/// down), production stops early without error; the items produced so far are
/// already in flight and will be drained by the workers.
///
/// # Errors
///
/// Returns [`Error::Input`] if reading a line fails and [`Error::FieldCount`]
/// if a line does not have exactly two fields. Items from lines preceding the
/// failure have already been queued and may still be transferred.
pub fn feed_work_items<R: BufRead>(input: R, queue: &Sender<WorkItem>) -> Result<u64> {
    let mut produced = 0u64;
    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|source| Error::Input {
            line: line_no,
            source,
        })?;
        let line = line.strip_suffix('\r').unwrap_or(&line);
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split('\t');
        let item = match (fields.next(), fields.next(), fields.next()) {
            (Some(container), Some(key), None) => WorkItem::new(container, key),
            _ => {
                // split always yields at least one field on a non-empty line
                let fields = line.split('\t').count();
                return Err(Error::FieldCount {
                    line: line_no,
                    fields,
                });
            }
        };

        if queue.send(item).is_err() {
            break;
        }
        produced += 1;
    }
    Ok(produced)
}
