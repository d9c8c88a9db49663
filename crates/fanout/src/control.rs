//! Session control - the sanctioned ways to interfere with a running session
//!
//! A [`SessionControl`] is available before the session starts and stays
//! valid after it ends. It can stop the read side (cooperative cancellation)
//! or detach single sinks.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use contracts::ContractError;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::metrics::{MetricsSnapshot, SinkMetrics};

/// Lifecycle state of one sink within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkStatus {
    /// Receives every chunk
    Live,
    /// Write reaction detached through [`SessionControl::detach_sink`]
    Detached,
    /// Stopped after a write failure (detach policy)
    Failed,
    /// Handle closed at end-of-stream
    Closed,
}

impl SinkStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SinkStatus::Live,
            1 => SinkStatus::Detached,
            2 => SinkStatus::Failed,
            _ => SinkStatus::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            SinkStatus::Live => 0,
            SinkStatus::Detached => 1,
            SinkStatus::Failed => 2,
            SinkStatus::Closed => 3,
        }
    }
}

/// State shared between a sink worker, the engine and session controls
#[derive(Debug)]
pub(crate) struct SinkState {
    index: usize,
    name: String,
    close_on_end: bool,
    status: AtomicU8,
    detach_tx: watch::Sender<bool>,
    failure: Mutex<Option<ContractError>>,
    close_error: Mutex<Option<String>>,
    metrics: SinkMetrics,
}

impl SinkState {
    pub(crate) fn new(index: usize, name: impl Into<String>, close_on_end: bool) -> Arc<Self> {
        let (detach_tx, _) = watch::channel(false);
        Arc::new(Self {
            index,
            name: name.into(),
            close_on_end,
            status: AtomicU8::new(SinkStatus::Live.as_u8()),
            detach_tx,
            failure: Mutex::new(None),
            close_error: Mutex::new(None),
            metrics: SinkMetrics::new(),
        })
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn close_on_end(&self) -> bool {
        self.close_on_end
    }

    pub(crate) fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    pub(crate) fn status(&self) -> SinkStatus {
        SinkStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub(crate) fn is_live(&self) -> bool {
        self.status() == SinkStatus::Live
    }

    pub(crate) fn set_status(&self, status: SinkStatus) {
        self.status.store(status.as_u8(), Ordering::Release);
    }

    /// Move from `Live` to `to`; false when the sink was no longer live
    fn leave_live(&self, to: SinkStatus) -> bool {
        self.status
            .compare_exchange(
                SinkStatus::Live.as_u8(),
                to.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Detach the write reaction
    pub(crate) fn request_detach(&self) -> bool {
        let detached = self.leave_live(SinkStatus::Detached);
        self.detach_tx.send_replace(true);
        detached
    }

    /// Stop feeding the sink after a failed write
    pub(crate) fn mark_failed(&self) {
        self.leave_live(SinkStatus::Failed);
        self.detach_tx.send_replace(true);
    }

    pub(crate) fn is_detach_requested(&self) -> bool {
        *self.detach_tx.borrow()
    }

    /// Resolves once the write reaction has been detached
    pub(crate) async fn detach_requested(&self) {
        let mut rx = self.detach_tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here
        let _ = rx.wait_for(|detached| *detached).await;
    }

    pub(crate) fn record_failure(&self, error: ContractError) {
        self.metrics.inc_failure_count();
        let mut slot = self.failure.lock().unwrap_or_else(|e| e.into_inner());
        slot.get_or_insert(error);
    }

    pub(crate) fn take_failure(&self) -> Option<ContractError> {
        self.failure
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    /// Keep a close failure of a sink that had already left the session
    pub(crate) fn record_close_error(&self, error: &impl std::fmt::Display) {
        let mut slot = self.close_error.lock().unwrap_or_else(|e| e.into_inner());
        slot.get_or_insert_with(|| error.to_string());
    }

    pub(crate) fn close_error(&self) -> Option<String> {
        self.close_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[derive(Debug)]
pub(crate) struct SessionShared {
    reader_detach: watch::Sender<bool>,
    reading: AtomicBool,
    sinks: Vec<Arc<SinkState>>,
}

impl SessionShared {
    pub(crate) fn new(sinks: Vec<Arc<SinkState>>) -> Arc<Self> {
        let (reader_detach, _) = watch::channel(false);
        Arc::new(Self {
            reader_detach,
            reading: AtomicBool::new(false),
            sinks,
        })
    }

    pub(crate) fn sinks(&self) -> &[Arc<SinkState>] {
        &self.sinks
    }

    pub(crate) fn set_reading(&self, reading: bool) {
        self.reading.store(reading, Ordering::Release);
    }
}

/// Handle for cancelling or inspecting a session
#[derive(Debug, Clone)]
pub struct SessionControl {
    shared: Arc<SessionShared>,
}

impl SessionControl {
    pub(crate) fn new(shared: Arc<SessionShared>) -> Self {
        Self { shared }
    }

    /// Detach the source's read reaction
    ///
    /// No chunk is read after this call. A chunk already handed to the sinks
    /// is still delivered and acknowledged; the session then ends without
    /// applying end-of-stream close policies.
    pub fn detach_reader(&self) {
        if !self.shared.reader_detach.send_replace(true) {
            info!("Reader detached");
        }
    }

    pub fn is_reader_detached(&self) -> bool {
        *self.shared.reader_detach.borrow()
    }

    /// Whether the session is still reading from its source
    pub fn is_reading(&self) -> bool {
        self.shared.reading.load(Ordering::Acquire)
    }

    /// Detach the write reaction of sink `index`
    ///
    /// A pending write of the current chunk is abandoned, so this sink may end
    /// up with less data than the others. The session records the sink as
    /// detached instead of stalling on it. Returns false when the index is
    /// unknown or the sink was not live.
    pub fn detach_sink(&self, index: usize) -> bool {
        let Some(sink) = self.shared.sinks.get(index) else {
            return false;
        };
        let detached = sink.request_detach();
        if detached {
            info!(sink = %sink.name(), index, "Sink detached");
        } else {
            debug!(sink = %sink.name(), index, "Sink already inactive");
        }
        detached
    }

    pub fn sink_count(&self) -> usize {
        self.shared.sinks.len()
    }

    pub fn sink_status(&self, index: usize) -> Option<SinkStatus> {
        self.shared.sinks.get(index).map(|s| s.status())
    }

    pub fn sink_metrics(&self, index: usize) -> Option<MetricsSnapshot> {
        self.shared.sinks.get(index).map(|s| s.metrics().snapshot())
    }

    /// Resolves once the reader has been detached
    pub(crate) async fn reader_detached(&self) {
        let mut rx = self.shared.reader_detach.subscribe();
        // The sender lives in the shared state held by `self`
        let _ = rx.wait_for(|detached| *detached).await;
    }
}
