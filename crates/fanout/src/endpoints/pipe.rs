//! Pipe - in-process unidirectional pipe endpoint
//!
//! A pipe is both a source (its read end) and a sink (its write end). The
//! write end is closed at end-of-stream by default so downstream readers see
//! EOF; the read end is left open because this process does not own it
//! exclusively.

use contracts::{ContractError, Readable, Writable};
use tokio::io::{ReadHalf, SimplexStream, WriteHalf};

use super::io::IoHandle;

/// Bytes buffered inside a pipe before writers wait for readers
pub const DEFAULT_PIPE_CAPACITY: usize = 64 * 1024;

pub type PipeReader = IoHandle<ReadHalf<SimplexStream>>;
pub type PipeWriter = IoHandle<WriteHalf<SimplexStream>>;

/// In-process pipe with distinct read and write handles
#[derive(Debug, Clone)]
pub struct Pipe {
    reader: PipeReader,
    writer: PipeWriter,
}

impl Pipe {
    pub fn new() -> Self {
        Self::named("pipe")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::with_capacity(name, DEFAULT_PIPE_CAPACITY)
    }

    /// Create a pipe buffering at most `capacity` bytes
    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        let name = name.into();
        let (read_half, write_half) = tokio::io::simplex(capacity.max(1));
        Self {
            reader: IoHandle::new(name.clone(), read_half),
            writer: IoHandle::new(name, write_half),
        }
    }

    pub fn name(&self) -> &str {
        self.reader.name()
    }

    /// Read handle, shared with every clone of this pipe
    pub fn read_end(&self) -> &PipeReader {
        &self.reader
    }

    /// Write handle, shared with every clone of this pipe
    pub fn write_end(&self) -> &PipeWriter {
        &self.writer
    }
}

impl Default for Pipe {
    fn default() -> Self {
        Self::new()
    }
}

impl Readable for Pipe {
    type Reader = PipeReader;

    fn close_on_read_end(&self) -> bool {
        false
    }

    fn reader(&self) -> Result<Self::Reader, ContractError> {
        self.reader.reader()
    }
}

impl Writable for Pipe {
    type Writer = PipeWriter;

    fn close_on_write_end(&self) -> bool {
        true
    }

    fn writer(&self) -> Result<Self::Writer, ContractError> {
        self.writer.writer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::PolicyExt;

    #[test]
    fn test_pipe_defaults() {
        let pipe = Pipe::new();
        assert!(!pipe.close_on_read_end());
        assert!(pipe.close_on_write_end());
        assert_eq!(pipe.name(), "pipe");
    }

    #[test]
    fn test_decorating_pipe_leaves_original() {
        let pipe = Pipe::named("p");
        let decorated = pipe.clone().with_close(true);

        assert!(decorated.close_on_read_end());
        assert!(!pipe.close_on_read_end());
        assert!(decorated.inner().close_on_write_end());
    }

    #[tokio::test]
    async fn test_pipe_round_trip() {
        let pipe = Pipe::new();
        pipe.write_end().write_bytes(&b"through"[..]).await.unwrap();
        pipe.write_end().shutdown().await.unwrap();

        assert_eq!(pipe.read_end().read_to_end().await.unwrap(), b"through");
    }

    #[tokio::test]
    async fn test_closed_write_end_rejects_capture() {
        let pipe = Pipe::new();
        pipe.write_end().shutdown().await.unwrap();

        assert!(pipe.writer().is_err());
        assert!(pipe.reader().is_ok());
    }
}
