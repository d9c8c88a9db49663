//! FanOut - the fan-out engine
//!
//! Drains one source chunk by chunk and hands every chunk to all live sinks.
//! The next chunk is not read before every sink has finished with the current
//! one, so at most one chunk is ever in flight and all sinks observe the
//! stream in lockstep. Throughput is bounded by the slowest sink.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use contracts::{
    ContractError, EngineConfig, ReadEnd, ReadHandle, Readable, SinkFailurePolicy, WriteEnd,
    Writable,
};
use observability::RunningStats;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::barrier::ChunkBarrier;
use crate::control::{SessionControl, SessionShared, SinkState};
use crate::error::FanOutError;
use crate::handle::{Delivery, SinkHandle};
use crate::report::{SessionOutcome, SessionReport, SinkReport};

/// Engine configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct FanOutConfig {
    /// What a failed sink write does to the session
    pub on_sink_error: SinkFailurePolicy,
}

impl From<&EngineConfig> for FanOutConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            on_sink_error: config.on_sink_error,
        }
    }
}

type StartFn = Box<dyn FnOnce(Arc<SinkState>) -> SinkHandle + Send>;

/// A captured sink whose worker has not been spawned yet
struct PendingSink {
    state: Arc<SinkState>,
    start: StartFn,
}

impl PendingSink {
    fn capture<W: Writable>(index: usize, sink: &W) -> Result<Self, ContractError> {
        let end = WriteEnd::capture(sink)?;
        let state = SinkState::new(
            index,
            contracts::WriteHandle::name(&end.handle),
            end.close_on_end,
        );
        let handle = end.handle;
        Ok(Self {
            state,
            start: Box::new(move |state| SinkHandle::spawn(handle, state)),
        })
    }

    fn start(self) -> SinkHandle {
        (self.start)(self.state)
    }
}

/// Builder for creating a FanOut
///
/// Endpoints are captured as they are added. Capture failures are kept and
/// reported by [`build`](Self::build), before anything has been spawned.
pub struct FanOutBuilder<R> {
    config: FanOutConfig,
    source: Result<ReadEnd<R>, ContractError>,
    sinks: Vec<PendingSink>,
    first_error: Option<ContractError>,
}

impl<R: ReadHandle + 'static> FanOutBuilder<R> {
    /// Create a new FanOutBuilder reading from `source`
    pub fn new<S>(source: S) -> Self
    where
        S: Readable<Reader = R>,
    {
        Self {
            config: FanOutConfig::default(),
            source: ReadEnd::capture(&source),
            sinks: Vec::new(),
            first_error: None,
        }
    }

    pub fn config(mut self, config: FanOutConfig) -> Self {
        self.config = config;
        self
    }

    pub fn on_sink_error(mut self, policy: SinkFailurePolicy) -> Self {
        self.config.on_sink_error = policy;
        self
    }

    /// Append a sink
    ///
    /// The same endpoint may be added more than once; every instance is fed
    /// independently.
    pub fn sink<W: Writable>(mut self, sink: W) -> Self {
        match PendingSink::capture(self.sinks.len(), &sink) {
            Ok(pending) => self.sinks.push(pending),
            Err(e) => {
                self.first_error.get_or_insert(e);
            }
        }
        self
    }

    /// Append several sinks in order
    pub fn sinks<I, W>(self, sinks: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Writable,
    {
        sinks.into_iter().fold(self, |builder, sink| builder.sink(sink))
    }

    /// Finish capturing
    ///
    /// # Errors
    /// `FanOutError::Contract` when the source or any sink failed to provide
    /// its handle
    #[instrument(name = "fanout_builder_build", skip(self), fields(sink_count = self.sinks.len()))]
    pub fn build(self) -> Result<FanOut<R>, FanOutError> {
        let source = self.source?;
        if let Some(e) = self.first_error {
            return Err(e.into());
        }

        let shared = SessionShared::new(self.sinks.iter().map(|s| Arc::clone(&s.state)).collect());

        Ok(FanOut {
            config: self.config,
            source,
            sinks: self.sinks,
            shared,
        })
    }
}

/// A ready-to-run fan-out session
pub struct FanOut<R> {
    config: FanOutConfig,
    source: ReadEnd<R>,
    sinks: Vec<PendingSink>,
    shared: Arc<SessionShared>,
}

impl<R: ReadHandle + 'static> FanOut<R> {
    /// Start building a session reading from `source`
    pub fn builder<S>(source: S) -> FanOutBuilder<R>
    where
        S: Readable<Reader = R>,
    {
        FanOutBuilder::new(source)
    }

    /// Control handle for this session
    pub fn control(&self) -> SessionControl {
        SessionControl::new(Arc::clone(&self.shared))
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Run the session until end-of-stream or cancellation
    ///
    /// Transport failures are not retried; they end the session and are
    /// returned as errors.
    #[instrument(
        name = "fanout_run",
        skip(self),
        fields(source = %self.source.handle.name(), sinks = self.sinks.len())
    )]
    pub async fn run(self) -> Result<SessionReport, FanOutError> {
        let FanOut {
            config,
            source,
            sinks,
            shared,
        } = self;

        let started = Instant::now();
        let handles: Vec<SinkHandle> = sinks.into_iter().map(PendingSink::start).collect();
        info!(sinks = handles.len(), "Fan-out session started");

        let mut session = Session {
            config,
            reader: source,
            sinks: handles,
            control: SessionControl::new(Arc::clone(&shared)),
            chunks: 0,
            bytes: 0,
            chunk_sizes: RunningStats::default(),
        };

        shared.set_reading(true);
        let pumped = session.pump().await;
        shared.set_reading(false);

        let result = session.finish(pumped).await;
        match &result {
            Ok(outcome) => {
                observability::record_session_finished(outcome.as_str());
                info!(
                    outcome = outcome.as_str(),
                    chunks = session.chunks,
                    bytes = session.bytes,
                    "Fan-out session finished"
                );
            }
            Err(e) => {
                observability::record_session_finished("failed");
                error!(error = %e, chunks = session.chunks, "Fan-out session failed");
            }
        }

        let outcome = result?;
        Ok(SessionReport {
            outcome,
            chunks: session.chunks,
            bytes: session.bytes,
            elapsed: started.elapsed(),
            chunk_bytes: session.chunk_sizes.summary(),
            sinks: shared
                .sinks()
                .iter()
                .map(|state| SinkReport {
                    index: state.index(),
                    name: state.name().to_string(),
                    status: state.status(),
                    close_on_end: state.close_on_end(),
                    metrics: state.metrics().snapshot(),
                    close_error: state.close_error(),
                })
                .collect(),
        })
    }

    /// Spawn the session as a background task
    pub fn spawn(self) -> SessionHandle {
        let control = self.control();
        let join = tokio::spawn(self.run());
        SessionHandle { control, join }
    }
}

/// Handle to a spawned session
pub struct SessionHandle {
    control: SessionControl,
    join: JoinHandle<Result<SessionReport, FanOutError>>,
}

impl SessionHandle {
    pub fn control(&self) -> &SessionControl {
        &self.control
    }

    /// Wait for the session to finish
    pub async fn join(self) -> Result<SessionReport, FanOutError> {
        self.join.await?
    }
}

/// Run a fan-out of `source` into `sinks` with the default configuration
///
/// # Example
///
/// ```no_run
/// use fanout::{run, IoHandle, Pipe};
///
/// # async fn demo() -> Result<(), fanout::FanOutError> {
/// let left = Pipe::new();
/// let right = Pipe::new();
/// let report = run(IoHandle::stdin(), vec![left.clone(), right.clone()]).await?;
/// println!("{} bytes duplicated", report.bytes);
/// # Ok(())
/// # }
/// ```
pub async fn run<S, W>(source: S, sinks: Vec<W>) -> Result<SessionReport, FanOutError>
where
    S: Readable,
    W: Writable,
{
    FanOut::builder(source).sinks(sinks).build()?.run().await
}

/// Runtime state of one running session
struct Session<R> {
    config: FanOutConfig,
    reader: ReadEnd<R>,
    sinks: Vec<SinkHandle>,
    control: SessionControl,
    chunks: u64,
    bytes: u64,
    chunk_sizes: RunningStats,
}

impl<R: ReadHandle> Session<R> {
    /// Read and distribute chunks until end-of-stream or cancellation
    async fn pump(&mut self) -> Result<SessionOutcome, FanOutError> {
        loop {
            let drained = tokio::select! {
                biased;
                _ = self.control.reader_detached() => {
                    debug!(chunks = self.chunks, "Reader detached, stopping");
                    return Ok(SessionOutcome::Cancelled);
                }
                drained = self.reader.handle.drain_available() => drained,
            };

            let chunk =
                drained.map_err(|e| FanOutError::source_read(self.reader.handle.name(), e))?;

            if chunk.is_empty() {
                debug!(chunks = self.chunks, "End-of-stream observed");
                return Ok(SessionOutcome::EndOfStream);
            }

            self.dispatch(chunk).await?;
        }
    }

    /// Hand one chunk to every live sink and wait for all of them
    async fn dispatch(&mut self, chunk: Bytes) -> Result<(), FanOutError> {
        let seq = self.chunks;
        let len = chunk.len();
        self.chunks += 1;
        self.bytes += len as u64;
        self.chunk_sizes.push(len as f64);

        let live: Vec<&SinkHandle> = self.sinks.iter().filter(|s| s.state().is_live()).collect();
        observability::record_chunk_dispatched(len, live.len());

        if live.is_empty() {
            trace!(chunk = seq, bytes = len, "No live sinks, chunk discarded");
            return Ok(());
        }

        let barrier = ChunkBarrier::new(seq, live.len());
        let mut lost = None;
        for sink in &live {
            let delivery = Delivery {
                chunk: chunk.clone(),
                barrier: Arc::clone(&barrier),
            };
            if let Err(e) = sink.deliver(delivery).await {
                lost.get_or_insert(e);
            }
        }
        drop(chunk);

        barrier.wait().await;
        trace!(chunk = seq, bytes = len, sinks = live.len(), "Chunk acknowledged");

        if let Some(e) = lost {
            return Err(e);
        }
        self.collect_failures(seq)
    }

    /// Apply the failure policy to sinks whose write of chunk `seq` failed
    fn collect_failures(&self, seq: u64) -> Result<(), FanOutError> {
        for sink in &self.sinks {
            let Some(source) = sink.state().take_failure() else {
                continue;
            };

            match self.config.on_sink_error {
                SinkFailurePolicy::Abort => {
                    return Err(FanOutError::SinkWrite {
                        sink: sink.name().to_string(),
                        index: sink.index(),
                        chunk: seq,
                        source,
                    });
                }
                SinkFailurePolicy::Detach => {
                    sink.state().mark_failed();
                    warn!(
                        sink = %sink.name(),
                        index = sink.index(),
                        chunk = seq,
                        error = %source,
                        "Sink write failed, sink detached"
                    );
                }
            }
        }
        Ok(())
    }

    /// Apply close policies (end-of-stream only) and stop every worker
    async fn finish(
        &mut self,
        pumped: Result<SessionOutcome, FanOutError>,
    ) -> Result<SessionOutcome, FanOutError> {
        let end_of_stream = matches!(pumped, Ok(SessionOutcome::EndOfStream));
        let mut first_error = None;

        if end_of_stream && self.reader.close_on_end {
            if let Err(e) = self.reader.handle.close().await {
                first_error.get_or_insert(FanOutError::close(self.reader.handle.name(), e));
            } else {
                debug!(source = %self.reader.handle.name(), "Source handle closed");
            }
        }

        for sink in std::mem::take(&mut self.sinks) {
            let close = end_of_stream && sink.state().close_on_end();
            let state = Arc::clone(sink.state());
            let was_live = state.is_live();
            match sink.shutdown(close).await {
                Ok(()) => {}
                Err(e) if was_live => {
                    error!(error = %e, "Sink shutdown failed");
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    // Departed sinks never fail the run
                    warn!(
                        sink = %state.name(),
                        status = ?state.status(),
                        error = %e,
                        "Close of departed sink failed"
                    );
                    state.record_close_error(&e);
                }
            }
        }

        let outcome = pumped?;
        match first_error {
            Some(e) => Err(e),
            None => Ok(outcome),
        }
    }
}
