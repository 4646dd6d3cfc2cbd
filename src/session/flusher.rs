//! Background Flusher
//!
//! One worker thread per session in AUTO_FLUSH_BACKGROUND mode. It flushes
//! when signalled (buffer reached its threshold) and on every tick of the
//! flush interval, and exits on shutdown. It only touches the session through
//! the synchronized [`SessionShared`].

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender, TrySendError};

use crate::error::{KuduError, Result};

use super::buffer::SessionShared;

/// Shortest tick the worker accepts; a zero interval would spin
pub(super) const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy)]
enum Signal {
    Flush,
    Shutdown,
}

pub(super) struct BackgroundFlusher {
    signal: Sender<Signal>,
    handle: Option<JoinHandle<()>>,
}

impl BackgroundFlusher {
    pub(super) fn spawn(shared: Arc<SessionShared>, interval: Duration) -> Result<Self> {
        let interval = interval.max(MIN_FLUSH_INTERVAL);
        // Capacity 1: repeated flush requests coalesce while one is pending
        let (signal, receiver) = channel::bounded(1);
        let handle = thread::Builder::new()
            .name("kudu-session-flusher".to_string())
            .spawn(move || run(shared, receiver, interval))
            .map_err(|e| {
                KuduError::InvalidState(format!("failed to start background flusher: {}", e))
            })?;

        tracing::debug!(interval_ms = interval.as_millis() as u64, "background flusher started");
        Ok(Self {
            signal,
            handle: Some(handle),
        })
    }

    /// Ask for a flush without waiting for it
    pub(super) fn trigger(&self) {
        match self.signal.try_send(Signal::Flush) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => {
                tracing::warn!("background flusher is no longer running");
            }
        }
    }

    /// Stop the worker and wait for it. A batch in flight completes first.
    pub(super) fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        // A disconnected channel means the worker already exited
        let _ = self.signal.send(Signal::Shutdown);
        handle
            .join()
            .map_err(|_| KuduError::InvalidState("background flusher panicked".to_string()))?;
        tracing::debug!("background flusher stopped");
        Ok(())
    }
}

impl Drop for BackgroundFlusher {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::error!("{}", e);
        }
    }
}

fn run(shared: Arc<SessionShared>, signals: Receiver<Signal>, interval: Duration) {
    let ticker = channel::tick(interval);
    loop {
        crossbeam::select! {
            recv(signals) -> signal => match signal {
                Ok(Signal::Flush) => shared.background_flush(),
                Ok(Signal::Shutdown) | Err(_) => break,
            },
            recv(ticker) -> _ => shared.background_flush(),
        }
    }
}
