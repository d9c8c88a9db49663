//! # FanOut
//!
//! Streaming tee engine.
//!
//! Responsibilities:
//! - drain one readable source chunk by chunk
//! - write every chunk to all live sinks, in lockstep
//! - apply per-endpoint close-on-end policies when the source is exhausted
//! - expose session control (reader / sink detach) and a final report

pub mod barrier;
pub mod control;
pub mod endpoints;
pub mod engine;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod report;

pub use barrier::ChunkBarrier;
pub use contracts::{
    CloseOnEnd, PolicyExt, ReadClose, ReadHandle, Readable, SinkFailurePolicy, WriteClose,
    WriteHandle, Writable,
};
pub use control::{SessionControl, SinkStatus};
pub use endpoints::{IoHandle, Pipe, PipeReader, PipeWriter, open_blueprint, open_sink, open_source};
pub use engine::{FanOut, FanOutBuilder, FanOutConfig, SessionHandle, run};
pub use error::FanOutError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use report::{SessionOutcome, SessionReport, SinkReport};
