//! The bounded-concurrency transfer pipeline.
//!
//! One producer thread parses the manifest into the work queue, N workers
//! pull items and execute transfers, and the aggregator (on the calling
//! thread) consumes the results queue. Both queues are bounded crossbeam
//! channels, so a slow stage backpressures its upstream instead of buffering
//! without limit.
//!
//! Termination is driven by completion markers: each worker sends
//! [`WorkerReport::Finished`] as the very last thing it ever emits, and the
//! aggregator stops exactly when it has seen one marker per worker. A marker
//! is a dedicated enum variant, so it can never be confused with a transfer
//! failure.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::io::BufRead;
use std::thread;
use tracing::error;

use crate::error::Result;
use crate::item::WorkItem;
use crate::options::PipelineOptions;
use crate::source::feed_work_items;
use crate::transfer::{Copier, TransferError};

/// One value on the results queue.
enum WorkerReport {
    /// Outcome of a single item.
    Outcome {
        item: WorkItem,
        result: std::result::Result<(), TransferError>,
    },
    /// Completion marker: the sending worker will emit nothing further.
    Finished,
}

/// Aggregate counts from a completed run.
///
/// `items_seen` counts transfer outcomes only — completion markers are
/// bookkeeping and never show up in the totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Number of work items whose transfer was attempted
    pub items_seen: u64,
    /// Number of those that succeeded
    pub items_succeeded: u64,
}

impl RunReport {
    /// Number of items whose transfer failed.
    pub fn items_failed(&self) -> u64 {
        self.items_seen - self.items_succeeded
    }
}

/// Run the pipeline to completion.
///
/// Reads the tab-separated manifest from `input`, copies every listed object
/// through `copier` with `options.workers` concurrent workers, and returns
/// the aggregate counts. Per-item failures are logged as they happen and
/// reflected in the report; they never abort the run.
///
/// # Errors
///
/// Returns an error only for the fatal class: a structurally malformed
/// manifest line or an input read failure. Items queued before the bad line
/// are still transferred (and logged) before the error is returned, so the
/// counts observable in the log remain accurate; the report itself is
/// discarded on this path.
pub fn run<R: BufRead + Send>(
    input: R,
    copier: &Copier,
    options: &PipelineOptions,
) -> Result<RunReport> {
    let workers = options.workers.max(1);
    // 2x capacity keeps workers fed (and the aggregator unstalled) without
    // letting a huge manifest pile up in memory.
    let (work_tx, work_rx) = bounded::<WorkItem>(2 * workers);
    let (report_tx, report_rx) = bounded::<WorkerReport>(2 * workers);

    thread::scope(|scope| {
        let producer = scope.spawn(move || feed_work_items(input, &work_tx));

        for _ in 0..workers {
            let work_rx = work_rx.clone();
            let report_tx = report_tx.clone();
            scope.spawn(move || worker_loop(&work_rx, &report_tx, copier, options));
        }
        // The aggregator must observe the queues closing once the producer
        // and workers are done, so the originals are dropped here.
        drop(work_rx);
        drop(report_tx);

        let report = aggregate(&report_rx, workers);

        match producer.join() {
            Ok(produced) => produced.map(|_| report),
            Err(panic) => std::panic::resume_unwind(panic),
        }
    })
}

/// One worker: pull, transfer, report, repeat; marker on the way out.
fn worker_loop(
    work_rx: &Receiver<WorkItem>,
    report_tx: &Sender<WorkerReport>,
    copier: &Copier,
    options: &PipelineOptions,
) {
    while !options.is_cancelled() {
        let Ok(item) = work_rx.recv() else {
            break;
        };
        let result = copier.copy(&item);
        if report_tx.send(WorkerReport::Outcome { item, result }).is_err() {
            break;
        }
    }
    // Always the last value this worker emits, even when cancelled, so the
    // aggregator's remaining-workers count reaches zero deterministically.
    let _ = report_tx.send(WorkerReport::Finished);
}

/// Consume the results queue until every worker has reported completion.
fn aggregate(report_rx: &Receiver<WorkerReport>, workers: usize) -> RunReport {
    let mut remaining = workers;
    let mut report = RunReport::default();

    while remaining > 0 {
        let Ok(message) = report_rx.recv() else {
            // Senders vanished before N markers arrived. That would take a
            // worker skipping its marker, which worker_loop cannot do; treat
            // it as an internal defect rather than hanging.
            debug_assert!(false, "results queue closed with {remaining} workers remaining");
            error!(remaining, "results queue closed before all workers finished");
            break;
        };
        match message {
            WorkerReport::Finished => remaining -= 1,
            WorkerReport::Outcome { item, result } => {
                report.items_seen += 1;
                match result {
                    Ok(()) => report.items_succeeded += 1,
                    Err(err) => {
                        error!(container = %item.container, key = %item.key, error = %err, "transfer failed");
                    }
                }
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ObjectBody, ObjectSink, ObjectSource, SinkError, SourceError, UploadOptions};
    use std::io::{Cursor, Read};
    use std::result::Result;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    /// Source that serves a fixed payload for every key, or fails on request.
    struct StubSource {
        fail: bool,
        reads: AtomicU64,
    }

    impl StubSource {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                fail: false,
                reads: AtomicU64::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                fail: true,
                reads: AtomicU64::new(0),
            })
        }
    }

    impl ObjectSource for StubSource {
        fn read(&self, _container: &str, _key: &str) -> Result<ObjectBody, SourceError> {
            self.reads.fetch_add(1, Ordering::Relaxed);
            if self.fail {
                Err(SourceError::NotFound)
            } else {
                Ok(Box::new(Cursor::new(b"payload".to_vec())))
            }
        }
    }

    /// Sink recording every write, optionally refusing them all.
    struct StubSink {
        refuse: bool,
        written: Mutex<Vec<(String, String)>>,
    }

    impl StubSink {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                refuse: false,
                written: Mutex::new(Vec::new()),
            })
        }

        fn refusing() -> Arc<Self> {
            Arc::new(Self {
                refuse: true,
                written: Mutex::new(Vec::new()),
            })
        }
    }

    impl ObjectSink for StubSink {
        fn write(
            &self,
            container: &str,
            key: &str,
            mut body: ObjectBody,
            _options: &UploadOptions,
        ) -> Result<(), SinkError> {
            let mut sunk = Vec::new();
            body.read_to_end(&mut sunk)
                .map_err(|e| SinkError::Transient(Box::new(e)))?;
            if self.refuse {
                return Err(SinkError::Permission("unreachable destination".into()));
            }
            self.written
                .lock()
                .unwrap()
                .push((container.to_string(), key.to_string()));
            Ok(())
        }
    }

    fn copier(source: Arc<StubSource>, sink: Arc<StubSink>) -> Copier {
        Copier::new(source, sink, UploadOptions::default())
    }

    fn manifest(items: usize) -> String {
        (0..items)
            .map(|i| format!("bucket.{i}\tkey%20{i}\n"))
            .collect()
    }

    #[test]
    fn test_counts_match_manifest_size() {
        for workers in [1, 2, 7] {
            let sink = StubSink::ok();
            let copier = copier(StubSource::ok(), sink.clone());
            let options = PipelineOptions::default().with_workers(workers);

            let report = run(Cursor::new(manifest(25)), &copier, &options).unwrap();

            assert_eq!(report.items_seen, 25, "workers={workers}");
            assert_eq!(report.items_succeeded, 25, "workers={workers}");
            assert_eq!(report.items_failed(), 0);
            assert_eq!(sink.written.lock().unwrap().len(), 25);
        }
    }

    #[test]
    fn test_no_item_duplicated_or_skipped() {
        let sink = StubSink::ok();
        let copier = copier(StubSource::ok(), sink.clone());
        let options = PipelineOptions::default().with_workers(4);

        run(Cursor::new(manifest(100)), &copier, &options).unwrap();

        let mut keys: Vec<String> = sink
            .written
            .lock()
            .unwrap()
            .iter()
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 100);
    }

    #[test]
    fn test_empty_manifest_completes_with_zero_counts() {
        let copier = copier(StubSource::ok(), StubSink::ok());
        let options = PipelineOptions::default().with_workers(3);

        let report = run(Cursor::new(String::new()), &copier, &options).unwrap();

        assert_eq!(report, RunReport::default());
    }

    #[test]
    fn test_all_transfers_failing_still_completes() {
        let copier = copier(StubSource::ok(), StubSink::refusing());
        let options = PipelineOptions::default().with_workers(3);

        let report = run(Cursor::new(manifest(10)), &copier, &options).unwrap();

        assert_eq!(report.items_seen, 10);
        assert_eq!(report.items_succeeded, 0);
        assert_eq!(report.items_failed(), 10);
    }

    #[test]
    fn test_missing_objects_are_per_item_failures() {
        let copier = copier(StubSource::failing(), StubSink::ok());
        let options = PipelineOptions::default().with_workers(2);

        let report = run(Cursor::new(manifest(6)), &copier, &options).unwrap();

        assert_eq!(report.items_seen, 6);
        assert_eq!(report.items_succeeded, 0);
    }

    #[test]
    fn test_undecodable_key_fails_item_not_run() {
        let sink = StubSink::ok();
        let copier = copier(StubSource::ok(), sink.clone());
        let options = PipelineOptions::default().with_workers(2);

        let input = "bucket\tgood-key\nbucket\tbad%zz\nbucket\tother-key\n";
        let report = run(Cursor::new(input.to_string()), &copier, &options).unwrap();

        assert_eq!(report.items_seen, 3);
        assert_eq!(report.items_succeeded, 2);
        assert_eq!(sink.written.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_serial_and_parallel_runs_agree() {
        let serial = {
            let copier = copier(StubSource::failing(), StubSink::ok());
            run(
                Cursor::new(manifest(17)),
                &copier,
                &PipelineOptions::default().with_workers(1),
            )
            .unwrap()
        };
        let parallel = {
            let copier = copier(StubSource::failing(), StubSink::ok());
            run(
                Cursor::new(manifest(17)),
                &copier,
                &PipelineOptions::default().with_workers(8),
            )
            .unwrap()
        };
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_malformed_line_aborts_run() {
        let sink = StubSink::ok();
        let copier = copier(StubSource::ok(), sink.clone());
        let options = PipelineOptions::default().with_workers(2);

        let input = "good\tkey1\ngood\tkey2\nonly-one-field\ngood\tkey3\n";
        let err = run(Cursor::new(input.to_string()), &copier, &options).unwrap_err();

        assert!(matches!(
            err,
            crate::Error::FieldCount { line: 3, fields: 1 }
        ));
        // The two well-formed lines before the bad one were already queued
        // and are allowed to complete.
        assert!(sink.written.lock().unwrap().len() <= 2);
    }

    #[test]
    fn test_more_workers_than_items() {
        let copier = copier(StubSource::ok(), StubSink::ok());
        let options = PipelineOptions::default().with_workers(16);

        let report = run(Cursor::new(manifest(3)), &copier, &options).unwrap();

        assert_eq!(report.items_seen, 3);
        assert_eq!(report.items_succeeded, 3);
    }

    #[test]
    fn test_pre_cancelled_run_terminates() {
        let source = StubSource::ok();
        let copier = copier(source.clone(), StubSink::ok());
        let cancel = Arc::new(AtomicBool::new(true));
        let options = PipelineOptions::default()
            .with_workers(4)
            .cancel_token(cancel);

        // Must not hang even though no worker will pull anything.
        let report = run(Cursor::new(manifest(50)), &copier, &options).unwrap();

        assert_eq!(report.items_seen, 0);
        assert_eq!(source.reads.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_cancelled_mid_run_still_reports_marker_per_worker() {
        struct CancellingSink {
            cancel: Arc<AtomicBool>,
        }
        impl ObjectSink for CancellingSink {
            fn write(
                &self,
                _container: &str,
                _key: &str,
                mut body: ObjectBody,
                _options: &UploadOptions,
            ) -> Result<(), SinkError> {
                let mut sunk = Vec::new();
                body.read_to_end(&mut sunk)
                    .map_err(|e| SinkError::Transient(Box::new(e)))?;
                // Flip the flag from inside a transfer: remaining workers
                // must still drain to completion markers.
                self.cancel.store(true, Ordering::Relaxed);
                Ok(())
            }
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let copier = Copier::new(
            StubSource::ok(),
            Arc::new(CancellingSink {
                cancel: cancel.clone(),
            }),
            UploadOptions::default(),
        );
        let options = PipelineOptions::default()
            .with_workers(3)
            .cancel_token(cancel);

        let report = run(Cursor::new(manifest(200)), &copier, &options).unwrap();

        // At least one item went through before the flag flipped; the run
        // ended early but cleanly.
        assert!(report.items_succeeded >= 1);
        assert!(report.items_seen <= 200);
        assert_eq!(report.items_seen, report.items_succeeded);
    }
}
