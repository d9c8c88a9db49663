//! Session report - what one fan-out session did

use observability::StatsSummary;
use serde::Serialize;
use std::time::Duration;

use crate::control::SinkStatus;
use crate::error::FanOutError;
use crate::metrics::MetricsSnapshot;

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// The source reported end-of-stream; close policies were applied
    EndOfStream,
    /// The reader was detached; no close policy was applied
    Cancelled,
}

impl SessionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionOutcome::EndOfStream => "end_of_stream",
            SessionOutcome::Cancelled => "cancelled",
        }
    }
}

/// Per-sink summary
#[derive(Debug, Clone, Serialize)]
pub struct SinkReport {
    pub index: usize,
    pub name: String,
    pub status: SinkStatus,
    pub close_on_end: bool,
    pub metrics: MetricsSnapshot,
    /// Close failure of a sink that was already detached or failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_error: Option<String>,
}

/// Summary of a finished session
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    /// Chunks read from the source
    pub chunks: u64,
    /// Bytes read from the source
    pub bytes: u64,
    pub elapsed: Duration,
    /// Distribution of chunk sizes as drained from the source
    pub chunk_bytes: StatsSummary,
    pub sinks: Vec<SinkReport>,
}

impl SessionReport {
    /// Sinks that received only a prefix of the stream
    pub fn incomplete_sinks(&self) -> impl Iterator<Item = &SinkReport> {
        self.sinks
            .iter()
            .filter(move |s| s.metrics.bytes_written < self.bytes)
    }

    /// Whether every sink received every byte
    pub fn is_complete(&self) -> bool {
        self.incomplete_sinks().next().is_none()
    }

    /// Turn a partial fan-out into an error
    ///
    /// # Errors
    /// `FanOutError::PartialFanOut` naming every sink that missed data
    pub fn ensure_complete(self) -> Result<Self, FanOutError> {
        let sinks: Vec<String> = self.incomplete_sinks().map(|s| s.name.clone()).collect();
        if sinks.is_empty() {
            Ok(self)
        } else {
            Err(FanOutError::PartialFanOut { sinks })
        }
    }

    /// Source throughput in bytes per second
    pub fn throughput(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.bytes as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}
