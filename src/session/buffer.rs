//! Session write buffer
//!
//! State shared between a [`Session`](super::Session) and its background
//! flusher.
//!
//! ## Locking
//! - `send_lock`: held for the whole of a transmission, from taking the
//!   buffered operations until their outcomes are recorded. Batches therefore
//!   reach the engine in apply order, and whoever holds it knows nothing else
//!   is in flight.
//! - `buffer`: short critical sections only; never held across an engine call.
//!
//! Lock order is always `send_lock` → `buffer`.

use std::mem;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::client::ClientInner;
use crate::error::RowError;
use crate::operation::WriteOperation;
use crate::protocol::{Request, Response};

use super::FlushMode;

/// Buffered operations and accumulated background outcomes
pub(super) struct Buffer {
    pub(super) pending: Vec<WriteOperation>,
    pub(super) in_flight: usize,
    pub(super) mode: FlushMode,
    pub(super) max_ops: usize,
    /// Failures of background batches since the last flush
    pub(super) errors: Vec<RowError>,
    /// Successes of background batches since the last flush
    pub(super) background_succeeded: usize,
}

/// Outcome of one transmission
#[derive(Debug, Default)]
pub(super) struct BatchOutcome {
    pub(super) failures: Vec<RowError>,
    pub(super) succeeded: usize,
}

impl BatchOutcome {
    fn merge(&mut self, other: BatchOutcome) {
        self.failures.extend(other.failures);
        self.succeeded += other.succeeded;
    }
}

pub(super) struct SessionShared {
    pub(super) client: Arc<ClientInner>,
    pub(super) buffer: Mutex<Buffer>,
    send_lock: Mutex<()>,
}

impl SessionShared {
    pub(super) fn new(client: Arc<ClientInner>, mode: FlushMode, max_ops: usize) -> Self {
        Self {
            client,
            buffer: Mutex::new(Buffer {
                pending: Vec::new(),
                in_flight: 0,
                mode,
                max_ops,
                errors: Vec::new(),
                background_succeeded: 0,
            }),
            send_lock: Mutex::new(()),
        }
    }

    pub(super) fn lock_send(&self) -> MutexGuard<'_, ()> {
        self.send_lock.lock()
    }

    /// Take everything buffered and transmit it. The caller must hold the
    /// send lock (passed as proof).
    pub(super) fn send_buffered(&self, _send: &MutexGuard<'_, ()>) -> BatchOutcome {
        let ops = {
            let mut buffer = self.buffer.lock();
            let ops = mem::take(&mut buffer.pending);
            buffer.in_flight += ops.len();
            ops
        };
        if ops.is_empty() {
            return BatchOutcome::default();
        }

        let count = ops.len();
        let outcome = self.transmit(ops);
        self.buffer.lock().in_flight -= count;

        tracing::debug!(
            operations = count,
            failed = outcome.failures.len(),
            "write batch acknowledged"
        );
        outcome
    }

    /// Flush from the background worker: failures are kept for the next
    /// `flush()` or `pending_errors()` call
    pub(super) fn background_flush(&self) {
        if self.client.is_closed() {
            return;
        }
        let send = self.lock_send();
        let outcome = self.send_buffered(&send);
        if outcome.failures.is_empty() && outcome.succeeded == 0 {
            return;
        }
        if !outcome.failures.is_empty() {
            tracing::warn!(
                failed = outcome.failures.len(),
                succeeded = outcome.succeeded,
                "background flush had failed operations"
            );
        }

        let mut buffer = self.buffer.lock();
        buffer.errors.extend(outcome.failures);
        buffer.background_succeeded += outcome.succeeded;
    }

    /// Send operations in order, one request per run of same-table operations
    fn transmit(&self, ops: Vec<WriteOperation>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        let mut ops = ops.into_iter().peekable();

        while let Some(first) = ops.next() {
            let table_id = first.table().id().to_string();
            let mut group = vec![first];
            while let Some(next) = ops.next_if(|op| op.table().id() == table_id) {
                group.push(next);
            }
            outcome.merge(self.transmit_group(table_id, group));
        }
        outcome
    }

    fn transmit_group(&self, table_id: String, group: Vec<WriteOperation>) -> BatchOutcome {
        let request = Request::Write {
            table_id,
            operations: group.iter().map(WriteOperation::to_row_operation).collect(),
        };

        match self.client.call(request).and_then(Response::into_row_errors) {
            Ok(row_errors) => {
                let mut failed = vec![None; group.len()];
                for (idx, status) in row_errors {
                    if let Some(slot) = failed.get_mut(idx) {
                        *slot = Some(status);
                    } else {
                        tracing::warn!(idx, "engine reported an error for an unknown operation");
                    }
                }

                let mut outcome = BatchOutcome::default();
                for (op, status) in group.into_iter().zip(failed) {
                    match status {
                        Some(status) => outcome.failures.push(RowError::new(op, status)),
                        None => outcome.succeeded += 1,
                    }
                }
                outcome
            }
            Err(status) => {
                tracing::warn!(%status, operations = group.len(), "write request failed");
                BatchOutcome {
                    failures: group
                        .into_iter()
                        .map(|op| RowError::new(op, status.clone()))
                        .collect(),
                    succeeded: 0,
                }
            }
        }
    }
}
