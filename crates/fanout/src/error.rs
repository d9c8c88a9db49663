//! Fan-out error types

use thiserror::Error;

use contracts::ContractError;

/// Fan-out specific errors
#[derive(Debug, Error)]
pub enum FanOutError {
    /// An argument does not satisfy the endpoint contract
    ///
    /// Raised while capturing endpoints, before any task is spawned.
    #[error("endpoint contract violated: {0}")]
    Contract(#[from] ContractError),

    /// Endpoint creation error
    #[error("failed to open endpoint '{name}': {message}")]
    Open { name: String, message: String },

    /// Draining the source failed
    #[error("source '{source_name}' read failed: {source}")]
    SourceRead {
        source_name: String,
        #[source]
        source: ContractError,
    },

    /// A sink write failed under the abort policy
    #[error("sink '{sink}' (#{index}) failed writing chunk {chunk}: {source}")]
    SinkWrite {
        sink: String,
        index: usize,
        chunk: u64,
        #[source]
        source: ContractError,
    },

    /// Closing an endpoint at end-of-stream failed
    #[error("failed to close '{endpoint}': {source}")]
    Close {
        endpoint: String,
        #[source]
        source: ContractError,
    },

    /// Some sinks received only a prefix of the stream
    #[error("partial fan-out: sinks {sinks:?} missed data")]
    PartialFanOut { sinks: Vec<String> },

    /// A sink worker task went away
    #[error("worker for sink '{sink}' terminated unexpectedly")]
    WorkerLost { sink: String },

    /// The spawned session task panicked or was aborted
    #[error("session task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl FanOutError {
    /// Create an endpoint open error
    pub fn open(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Open {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a source read error
    pub fn source_read(source_name: impl Into<String>, source: ContractError) -> Self {
        Self::SourceRead {
            source_name: source_name.into(),
            source,
        }
    }

    /// Create a close error
    pub fn close(endpoint: impl Into<String>, source: ContractError) -> Self {
        Self::Close {
            endpoint: endpoint.into(),
            source,
        }
    }
}
