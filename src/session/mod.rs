//! Session Module
//!
//! Buffers write operations and sends them to the engine according to a
//! [`FlushMode`].
//!
//! ## States
//! ```text
//!            apply                flush / background batch
//!   ┌──────┐ ─────▶ ┌───────────┐ ───────────────────────▶ ┌──────────┐
//!   │ Idle │        │ Buffering │                          │ Flushing │
//!   └──────┘ ◀───────────────────────────────────────────── └──────────┘
//!       │                 acknowledged
//!       └──── close ────▶ Closed
//! ```
//!
//! ## Flush Modes
//! - `AutoFlushSync`: `apply` sends the operation and waits for it.
//! - `AutoFlushBackground`: `apply` buffers; a dedicated worker sends batches
//!   when the buffer reaches `mutation_buffer_max_ops` and on every flush
//!   interval. Failures are kept until the next `flush()`.
//! - `ManualFlush`: `apply` buffers without limit until `flush()`.
//!
//! Operations applied to one session reach the engine in apply order.

mod buffer;
mod flusher;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::client::ClientInner;
use crate::error::{FlushError, KuduError, Result, RowError, ValidationError};
use crate::operation::WriteOperation;

use buffer::{BatchOutcome, SessionShared};
use flusher::{BackgroundFlusher, MIN_FLUSH_INTERVAL};

/// When buffered operations are transmitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FlushMode {
    AutoFlushSync = 0,
    AutoFlushBackground = 1,
    ManualFlush = 2,
}

impl fmt::Display for FlushMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FlushMode::AutoFlushSync => "AUTO_FLUSH_SYNC",
            FlushMode::AutoFlushBackground => "AUTO_FLUSH_BACKGROUND",
            FlushMode::ManualFlush => "MANUAL_FLUSH",
        };
        f.write_str(name)
    }
}

/// A buffered write session.
///
/// Every method takes `&mut self`: one session serves one caller at a time.
/// Sharing a session between threads requires external synchronization.
///
/// ```compile_fail
/// fn apply_shared(session: &kudu_client::Session, op: kudu_client::WriteOperation) {
///     session.apply(op).unwrap();
/// }
/// ```
///
/// A session must be closed to guarantee buffered operations are sent. In
/// `ManualFlush` mode, [`close`](Session::close) refuses to close while
/// operations are still buffered; dropping an unclosed session discards them
/// and logs a warning.
pub struct Session {
    shared: Arc<SessionShared>,
    flusher: Option<BackgroundFlusher>,
    flush_interval: Duration,
    closed: bool,
}

impl Session {
    pub(crate) fn new(client: Arc<ClientInner>) -> Self {
        let config = client.config().clone();
        let mut session = Self {
            shared: Arc::new(SessionShared::new(
                client,
                FlushMode::AutoFlushSync,
                config.mutation_buffer_max_ops.max(1),
            )),
            flusher: None,
            flush_interval: config.flush_interval(),
            closed: false,
        };
        if config.default_flush_mode != FlushMode::AutoFlushSync {
            if let Err(e) = session.set_flush_mode(config.default_flush_mode) {
                tracing::warn!("keeping AUTO_FLUSH_SYNC for new session: {}", e);
            }
        }
        session
    }

    pub fn flush_mode(&self) -> FlushMode {
        self.shared.buffer.lock().mode
    }

    /// Change the flush mode. Only allowed while nothing is buffered or in
    /// flight.
    pub fn set_flush_mode(&mut self, mode: FlushMode) -> Result<()> {
        self.ensure_open()?;
        {
            let mut buffer = self.shared.buffer.lock();
            if buffer.mode == mode {
                return Ok(());
            }
            if !buffer.pending.is_empty() || buffer.in_flight > 0 {
                return Err(KuduError::InvalidState(format!(
                    "cannot change flush mode to {} with {} buffered and {} in-flight operations",
                    mode,
                    buffer.pending.len(),
                    buffer.in_flight
                )));
            }
            buffer.mode = mode;
        }

        match mode {
            FlushMode::AutoFlushBackground => {
                let flusher =
                    BackgroundFlusher::spawn(Arc::clone(&self.shared), self.flush_interval);
                match flusher {
                    Ok(flusher) => self.flusher = Some(flusher),
                    Err(e) => {
                        self.shared.buffer.lock().mode = FlushMode::AutoFlushSync;
                        return Err(e);
                    }
                }
            }
            _ => self.stop_flusher()?,
        }

        tracing::debug!(%mode, "session flush mode changed");
        Ok(())
    }

    /// Background flush period. Takes effect immediately if the background
    /// flusher is running. Intervals shorter than one millisecond are raised
    /// to it.
    pub fn set_flush_interval(&mut self, interval: Duration) -> Result<()> {
        let interval = interval.max(MIN_FLUSH_INTERVAL);
        self.flush_interval = interval;
        if self.flusher.is_some() {
            self.stop_flusher()?;
            self.flusher = Some(BackgroundFlusher::spawn(
                Arc::clone(&self.shared),
                interval,
            )?);
        }
        Ok(())
    }

    pub fn flush_interval(&self) -> Duration {
        self.flush_interval
    }

    /// Buffered operations that trigger a background flush (minimum 1)
    pub fn set_mutation_buffer_max_ops(&mut self, max_ops: usize) {
        self.shared.buffer.lock().max_ops = max_ops.max(1);
    }

    /// Validate and buffer (or, in `AutoFlushSync`, send) an operation
    pub fn apply(&mut self, op: WriteOperation) -> Result<()> {
        self.ensure_open()?;
        if !op.table().belongs_to(&self.shared.client) {
            return Err(ValidationError::InvalidOperation(format!(
                "{} targets a table opened by a different client",
                op
            ))
            .into());
        }
        self.ensure_client_open()?;
        op.validate()?;

        let (mode, should_trigger, over_limit) = {
            let mut buffer = self.shared.buffer.lock();
            buffer.pending.push(op);
            let len = buffer.pending.len();
            (
                buffer.mode,
                len >= buffer.max_ops,
                len >= buffer.max_ops.saturating_mul(2),
            )
        };

        match mode {
            FlushMode::AutoFlushSync => {
                let send = self.shared.lock_send();
                let outcome = self.shared.send_buffered(&send);
                Self::outcome_to_result(outcome)
            }
            FlushMode::ManualFlush => Ok(()),
            FlushMode::AutoFlushBackground => {
                if over_limit {
                    // Worker is behind; apply back-pressure on the caller
                    self.shared.background_flush();
                } else if should_trigger {
                    if let Some(flusher) = &self.flusher {
                        flusher.trigger();
                    }
                }
                Ok(())
            }
        }
    }

    /// Send everything buffered and wait until all outstanding operations,
    /// including a background batch in flight, are acknowledged.
    ///
    /// Fails with a composite [`FlushError`] naming every failed operation
    /// since the previous flush; the remaining operations were applied.
    /// Once the client is closed, buffered operations are kept and the flush
    /// fails with [`KuduError::InvalidState`].
    pub fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.has_pending_operations() {
            self.ensure_client_open()?;
        }
        let send = self.shared.lock_send();
        let mut outcome = self.shared.send_buffered(&send);

        let (mut failures, background_succeeded) = {
            let mut buffer = self.shared.buffer.lock();
            let failures = std::mem::take(&mut buffer.errors);
            let succeeded = std::mem::replace(&mut buffer.background_succeeded, 0);
            (failures, succeeded)
        };
        drop(send);

        failures.append(&mut outcome.failures);
        outcome.failures = failures;
        outcome.succeeded += background_succeeded;
        Self::outcome_to_result(outcome)
    }

    /// Flush and release the session.
    ///
    /// In `ManualFlush` mode with buffered operations this is an error and the
    /// session stays open: flush them, or drop them with
    /// [`discard_buffered`](Session::discard_buffered), first. The same holds
    /// in any mode once the client is closed. Closing an already closed
    /// session does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        {
            let buffer = self.shared.buffer.lock();
            if buffer.mode == FlushMode::ManualFlush && !buffer.pending.is_empty() {
                return Err(KuduError::InvalidState(format!(
                    "cannot close session with {} unflushed operations in {} mode",
                    buffer.pending.len(),
                    FlushMode::ManualFlush
                )));
            }
            if !buffer.pending.is_empty() {
                self.ensure_client_open()?;
            }
        }

        let flushed = self.flush();
        let stopped = self.stop_flusher();
        self.closed = true;
        tracing::debug!("session closed");

        match (flushed, stopped) {
            (Err(e), Err(cleanup)) => {
                tracing::error!("error stopping background flusher after failed flush: {}", cleanup);
                Err(e)
            }
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Ok(()), Ok(())) => Ok(()),
        }
    }

    /// Drain failures recorded by background batches since the last flush
    pub fn pending_errors(&mut self) -> Vec<RowError> {
        std::mem::take(&mut self.shared.buffer.lock().errors)
    }

    pub fn count_pending_errors(&self) -> usize {
        self.shared.buffer.lock().errors.len()
    }

    pub fn count_buffered_operations(&self) -> usize {
        self.shared.buffer.lock().pending.len()
    }

    /// Whether any operation is buffered or in flight
    pub fn has_pending_operations(&self) -> bool {
        let buffer = self.shared.buffer.lock();
        !buffer.pending.is_empty() || buffer.in_flight > 0
    }

    /// Drop every buffered operation without sending it; returns how many
    pub fn discard_buffered(&mut self) -> usize {
        let discarded = std::mem::take(&mut self.shared.buffer.lock().pending).len();
        if discarded > 0 {
            tracing::info!(operations = discarded, "discarded buffered operations");
        }
        discarded
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(KuduError::InvalidState("the session is closed".to_string()));
        }
        Ok(())
    }

    fn ensure_client_open(&self) -> Result<()> {
        if self.shared.client.is_closed() {
            return Err(KuduError::InvalidState(
                "the client connection has been closed".to_string(),
            ));
        }
        Ok(())
    }

    fn stop_flusher(&mut self) -> Result<()> {
        match self.flusher.take() {
            Some(flusher) => flusher.shutdown(),
            None => Ok(()),
        }
    }

    fn outcome_to_result(outcome: BatchOutcome) -> Result<()> {
        if outcome.failures.is_empty() {
            Ok(())
        } else {
            Err(FlushError::new(outcome.failures, outcome.succeeded).into())
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.stop_flusher() {
            tracing::error!("{}", e);
        }
        let discarded = self.shared.buffer.lock().pending.len();
        if discarded > 0 {
            tracing::warn!(
                operations = discarded,
                "session dropped without close; buffered operations discarded"
            );
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let buffer = self.shared.buffer.lock();
        f.debug_struct("Session")
            .field("flush_mode", &buffer.mode)
            .field("buffered", &buffer.pending.len())
            .field("in_flight", &buffer.in_flight)
            .field("pending_errors", &buffer.errors.len())
            .field("closed", &self.closed)
            .finish()
    }
}
