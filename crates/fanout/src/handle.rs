//! SinkHandle - one sink's write reaction, running as its own worker task
//!
//! The engine hands each chunk to every live worker together with the chunk's
//! barrier. A worker performs one full write of the chunk and then arrives at
//! the barrier, whatever the outcome of the write.

use std::sync::Arc;

use bytes::Bytes;
use contracts::{ContractError, WriteHandle};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::barrier::ChunkBarrier;
use crate::control::{SinkState, SinkStatus};
use crate::error::FanOutError;
use crate::metrics::MetricsSnapshot;

/// One chunk handed to a sink worker
#[derive(Debug)]
pub(crate) struct Delivery {
    pub(crate) chunk: Bytes,
    pub(crate) barrier: Arc<ChunkBarrier>,
}

#[derive(Debug)]
enum SinkCommand {
    Chunk(Delivery),
    Close {
        reply: oneshot::Sender<Result<(), ContractError>>,
    },
}

/// Handle to a running sink worker
pub struct SinkHandle {
    /// State shared with the worker and session controls
    state: Arc<SinkState>,
    /// Channel to send commands to the worker
    tx: mpsc::Sender<SinkCommand>,
    /// Worker task handle
    worker_handle: JoinHandle<()>,
}

impl SinkHandle {
    /// Spawn the worker task owning `handle`
    pub(crate) fn spawn<W: WriteHandle + 'static>(handle: W, state: Arc<SinkState>) -> Self {
        // At most one chunk is ever in flight, so one slot is enough
        let (tx, rx) = mpsc::channel(1);

        let worker_state = Arc::clone(&state);
        let worker_handle = tokio::spawn(async move {
            sink_worker(handle, rx, worker_state).await;
        });

        Self {
            state,
            tx,
            worker_handle,
        }
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        self.state.name()
    }

    /// Position in the session's sink list
    pub fn index(&self) -> usize {
        self.state.index()
    }

    pub fn status(&self) -> SinkStatus {
        self.state.status()
    }

    /// Get current metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.state.metrics().snapshot()
    }

    pub(crate) fn state(&self) -> &Arc<SinkState> {
        &self.state
    }

    /// Hand a chunk to the worker
    ///
    /// If the worker is gone the barrier is released on its behalf so the
    /// session never waits for a sink that cannot answer.
    pub(crate) async fn deliver(&self, delivery: Delivery) -> Result<(), FanOutError> {
        if let Err(mpsc::error::SendError(command)) =
            self.tx.send(SinkCommand::Chunk(delivery)).await
        {
            if let SinkCommand::Chunk(delivery) = command {
                delivery.barrier.arrive();
            }
            error!(sink = %self.name(), "Sink worker closed unexpectedly");
            return Err(FanOutError::WorkerLost {
                sink: self.name().to_string(),
            });
        }
        Ok(())
    }

    /// Stop the worker, closing the sink's handle first when `close` is set
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name()))]
    pub(crate) async fn shutdown(self, close: bool) -> Result<(), FanOutError> {
        let SinkHandle {
            state,
            tx,
            worker_handle,
        } = self;

        let result = if close {
            close_handle(&state, &tx).await
        } else {
            Ok(())
        };

        // Drop sender to signal worker to stop
        drop(tx);
        if let Err(e) = worker_handle.await {
            error!(sink = %state.name(), error = ?e, "Worker task panicked");
        }
        debug!(sink = %state.name(), "SinkHandle shutdown complete");
        result
    }
}

async fn close_handle(
    state: &SinkState,
    tx: &mpsc::Sender<SinkCommand>,
) -> Result<(), FanOutError> {
    let lost = || FanOutError::WorkerLost {
        sink: state.name().to_string(),
    };

    let (reply, reply_rx) = oneshot::channel();
    tx.send(SinkCommand::Close { reply })
        .await
        .map_err(|_| lost())?;

    match reply_rx.await {
        Ok(Ok(())) => {
            if state.is_live() {
                state.set_status(SinkStatus::Closed);
            }
            debug!(sink = %state.name(), "Sink handle closed");
            Ok(())
        }
        Ok(Err(e)) => Err(FanOutError::close(state.name(), e)),
        Err(_) => Err(lost()),
    }
}

/// Worker task that writes chunks to one sink
#[instrument(
    name = "sink_worker_loop",
    skip(handle, rx, state),
    fields(sink = %state.name(), index = state.index())
)]
async fn sink_worker<W: WriteHandle>(
    mut handle: W,
    mut rx: mpsc::Receiver<SinkCommand>,
    state: Arc<SinkState>,
) {
    debug!("Sink worker started");

    while let Some(command) = rx.recv().await {
        match command {
            SinkCommand::Chunk(delivery) => {
                write_chunk(&mut handle, &delivery, &state).await;
                drop(delivery.chunk);
                delivery.barrier.arrive();
            }
            SinkCommand::Close { reply } => {
                let result = handle.close().await;
                // Requester gone means nobody cares about the outcome
                let _ = reply.send(result);
            }
        }
    }

    debug!("Sink worker stopped");
}

async fn write_chunk<W: WriteHandle>(handle: &mut W, delivery: &Delivery, state: &SinkState) {
    let seq = delivery.barrier.seq();

    if state.is_detach_requested() {
        state.metrics().inc_skipped_count();
        debug!(chunk = seq, "Sink detached, chunk skipped");
        return;
    }

    let outcome = tokio::select! {
        biased;
        _ = state.detach_requested() => None,
        result = handle.write(&delivery.chunk) => Some(result),
    };

    match outcome {
        None => {
            state.metrics().inc_skipped_count();
            warn!(chunk = seq, "Write abandoned, sink detached mid-chunk");
        }
        Some(Ok(())) => {
            state.metrics().record_write(delivery.chunk.len());
            observability::record_sink_write(state.name(), true);
        }
        Some(Err(e)) => {
            error!(chunk = seq, error = %e, "Write failed");
            observability::record_sink_write(state.name(), false);
            state.record_failure(e);
        }
    }
}
