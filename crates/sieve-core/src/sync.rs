//! Coalescing, single-flight write-back queue for read markers.
//!
//! Marks accumulated while a sync request is outstanding are batched into
//! the next request instead of each triggering its own round trip, so at
//! most one request is ever in flight and batches can never arrive out of
//! order.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::reference::ReferenceItem;
use crate::transport::{Transport, WriteTarget, read_payload};
use crate::warning::{Warning, WarningPresenter};

/// Pending read markers and the single-flight guard.
#[derive(Debug, Default)]
struct ReadQueue {
    pending: HashSet<String>,
    in_flight: bool,
}

/// What one `flush` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was pending and nothing is in flight.
    Clean,
    /// Every pending marker was written successfully.
    Flushed,
    /// Another flush holds the in-flight guard; queued urls will ride its
    /// follow-up batch.
    Busy,
    /// A write failed; its batch is back in the queue and the sync warning
    /// is up.
    Failed,
}

enum Begin {
    Idle,
    Busy,
    Batch(Vec<String>),
}

/// Owns the set of not-yet-uploaded read markers and pushes them to the
/// sieve resource in serialized, coalesced batches.
pub struct ReadStateSynchronizer<T: Transport> {
    transport: Arc<T>,
    warnings: Arc<dyn WarningPresenter>,
    queue: Mutex<ReadQueue>,
    /// Bumped each time a flush settles, so `drain` can wait without polling.
    settled: watch::Sender<u64>,
    enabled: bool,
}

impl<T: Transport> ReadStateSynchronizer<T> {
    /// With `enabled` false (the service's demo mode) read flags are still
    /// set locally but nothing is queued or sent.
    pub fn new(transport: Arc<T>, warnings: Arc<dyn WarningPresenter>, enabled: bool) -> Self {
        Self {
            transport,
            warnings,
            queue: Mutex::new(ReadQueue::default()),
            settled: watch::channel(0).0,
            enabled,
        }
    }

    /// Record that `item` has been read.
    ///
    /// Idempotent: an already-read item is left untouched and not re-queued.
    /// Returns true when the url was queued and a flush should follow.
    pub fn mark_read(&self, item: &ReferenceItem) -> bool {
        if !item.mark_read() {
            return false;
        }
        if !self.enabled {
            return false;
        }
        let mut queue = self.queue.lock().expect("read queue lock");
        queue.pending.insert(item.url().to_string());
        true
    }

    /// Mark `item` read and run the flush on a background task, so callers
    /// inside the UI loop never wait on the network.
    pub fn mark_read_and_flush(self: Arc<Self>, item: &Arc<ReferenceItem>) {
        if self.mark_read(item) {
            tokio::spawn(async move {
                self.flush().await;
            });
        }
    }

    /// Whether the queue is empty with no flush in flight.
    pub fn is_clean(&self) -> bool {
        let queue = self.queue.lock().expect("read queue lock");
        queue.pending.is_empty() && !queue.in_flight
    }

    /// Push pending read markers to the server.
    ///
    /// Single-flight: when another flush is in flight this returns `Busy`
    /// immediately; the queued urls will be picked up by that flush's
    /// follow-up batch. Urls marked while a request is outstanding are
    /// drained into further requests before the guard is released.
    ///
    /// On failure the batch is restored into the queue and the guard is
    /// released, so a later mark or flush retries it.
    pub async fn flush(&self) -> FlushOutcome {
        let mut batch = match self.begin() {
            Begin::Idle => return FlushOutcome::Clean,
            Begin::Busy => return FlushOutcome::Busy,
            Begin::Batch(batch) => batch,
        };
        loop {
            let result = self
                .transport
                .write(WriteTarget::Sieve, read_payload(&batch))
                .await;
            match result {
                Ok(()) => {
                    self.warnings.hide_warning(Warning::SyncFailed);
                    let mut queue = self.queue.lock().expect("read queue lock");
                    if queue.pending.is_empty() {
                        queue.in_flight = false;
                        drop(queue);
                        self.settle();
                        return FlushOutcome::Flushed;
                    }
                    batch = queue.pending.drain().collect();
                }
                Err(err) => {
                    log::warn!("read-state sync failed ({} urls): {err}", batch.len());
                    self.warnings.show_warning(Warning::SyncFailed);
                    let mut queue = self.queue.lock().expect("read queue lock");
                    queue.pending.extend(batch);
                    queue.in_flight = false;
                    drop(queue);
                    self.settle();
                    return FlushOutcome::Failed;
                }
            }
        }
    }

    /// Flush until the queue is clean, waiting out any in-flight request.
    ///
    /// Used by the reload path. Never returns `Busy`: resolves `Clean` or
    /// `Flushed` once every marker has been written, `Failed` as soon as a
    /// flush attempt fails.
    pub async fn drain(&self) -> FlushOutcome {
        let mut seen = self.settled.subscribe();
        loop {
            match self.flush().await {
                FlushOutcome::Busy => {
                    if seen.changed().await.is_err() {
                        return FlushOutcome::Clean;
                    }
                }
                outcome => return outcome,
            }
        }
    }

    fn begin(&self) -> Begin {
        if !self.enabled {
            return Begin::Idle;
        }
        let mut queue = self.queue.lock().expect("read queue lock");
        if queue.in_flight {
            return Begin::Busy;
        }
        if queue.pending.is_empty() {
            return Begin::Idle;
        }
        queue.in_flight = true;
        Begin::Batch(queue.pending.drain().collect())
    }

    fn settle(&self) {
        self.settled.send_modify(|n| *n += 1);
    }

    #[cfg(test)]
    fn pending_urls(&self) -> Vec<String> {
        let queue = self.queue.lock().expect("read queue lock");
        let mut urls: Vec<String> = queue.pending.iter().cloned().collect();
        urls.sort();
        urls
    }
}
