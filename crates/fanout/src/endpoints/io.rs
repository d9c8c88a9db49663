//! IoHandle - direct handle endpoint
//!
//! Wraps a tokio reader or writer. The endpoint is its own handle and both
//! close flags default to `false`, so standard streams are never closed
//! behind the caller's back. Clones share the underlying stream; closing
//! one clone closes it for all of them.

use std::fmt;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use contracts::{ContractError, HandleSide, ReadHandle, Readable, Writable, WriteHandle};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, Stderr, Stdin, Stdout};
use tokio::sync::Mutex;

/// Default upper bound for a single drain
pub const DEFAULT_READ_CAPACITY: usize = 64 * 1024;

/// Shared handle over a tokio stream
pub struct IoHandle<T> {
    name: Arc<str>,
    io: Arc<Mutex<Option<T>>>,
    read_capacity: usize,
}

impl<T> Clone for IoHandle<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            io: Arc::clone(&self.io),
            read_capacity: self.read_capacity,
        }
    }
}

impl<T> fmt::Debug for IoHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IoHandle")
            .field("name", &self.name)
            .field("read_capacity", &self.read_capacity)
            .finish_non_exhaustive()
    }
}

impl<T> IoHandle<T> {
    /// Wrap `io` under the given name
    pub fn new(name: impl Into<String>, io: T) -> Self {
        let name: String = name.into();
        Self {
            name: name.into(),
            io: Arc::new(Mutex::new(Some(io))),
            read_capacity: DEFAULT_READ_CAPACITY,
        }
    }

    /// Bound the number of bytes taken per drain
    pub fn with_read_capacity(mut self, capacity: usize) -> Self {
        self.read_capacity = capacity.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn read_capacity(&self) -> usize {
        self.read_capacity
    }

    pub async fn is_closed(&self) -> bool {
        self.io.lock().await.is_none()
    }

    /// Closed check that does not wait for a busy handle
    fn ensure_open(&self, side: HandleSide) -> Result<(), ContractError> {
        match self.io.try_lock() {
            Ok(guard) if guard.is_none() => Err(ContractError::handle_unavailable(
                self.name(),
                side,
                "handle already closed",
            )),
            _ => Ok(()),
        }
    }
}

impl IoHandle<Stdin> {
    /// Process standard input
    pub fn stdin() -> Self {
        Self::new("stdin", tokio::io::stdin())
    }
}

impl IoHandle<Stdout> {
    /// Process standard output
    pub fn stdout() -> Self {
        Self::new("stdout", tokio::io::stdout())
    }
}

impl IoHandle<Stderr> {
    /// Process standard error
    pub fn stderr() -> Self {
        Self::new("stderr", tokio::io::stderr())
    }
}

impl<T> IoHandle<T>
where
    T: AsyncRead + Unpin + Send + 'static,
{
    /// Drain until end-of-stream and return everything read
    pub async fn read_to_end(&self) -> Result<Vec<u8>, ContractError> {
        let mut handle = self.clone();
        let mut out = Vec::new();
        loop {
            let chunk = ReadHandle::drain_available(&mut handle).await?;
            if chunk.is_empty() {
                return Ok(out);
            }
            out.extend_from_slice(&chunk);
        }
    }
}

impl<T> IoHandle<T>
where
    T: AsyncWrite + Unpin + Send + 'static,
{
    /// Write and flush `data` through a shared reference
    pub async fn write_bytes(&self, data: impl Into<Bytes>) -> Result<(), ContractError> {
        let mut handle = self.clone();
        WriteHandle::write(&mut handle, &data.into()).await
    }

    /// Shut the writer down through a shared reference
    pub async fn shutdown(&self) -> Result<(), ContractError> {
        let mut handle = self.clone();
        WriteHandle::close(&mut handle).await
    }
}

impl<T> ReadHandle for IoHandle<T>
where
    T: AsyncRead + Unpin + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn drain_available(&mut self) -> Result<Bytes, ContractError> {
        let mut guard = self.io.lock().await;
        let io = guard
            .as_mut()
            .ok_or_else(|| ContractError::closed(&*self.name))?;

        let mut buf = BytesMut::with_capacity(self.read_capacity);
        io.read_buf(&mut buf).await?;
        Ok(buf.freeze())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        // Dropping the reader releases it; closing twice is harmless
        self.io.lock().await.take();
        Ok(())
    }
}

impl<T> WriteHandle for IoHandle<T>
where
    T: AsyncWrite + Unpin + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, chunk: &Bytes) -> Result<(), ContractError> {
        let mut guard = self.io.lock().await;
        let io = guard
            .as_mut()
            .ok_or_else(|| ContractError::closed(&*self.name))?;

        io.write_all(chunk).await?;
        io.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        let mut guard = self.io.lock().await;
        if let Some(mut io) = guard.take() {
            io.shutdown().await?;
        }
        Ok(())
    }
}

impl<T> Readable for IoHandle<T>
where
    T: AsyncRead + Unpin + Send + 'static,
{
    type Reader = IoHandle<T>;

    fn close_on_read_end(&self) -> bool {
        false
    }

    fn reader(&self) -> Result<Self::Reader, ContractError> {
        self.ensure_open(HandleSide::Read)?;
        Ok(self.clone())
    }
}

impl<T> Writable for IoHandle<T>
where
    T: AsyncWrite + Unpin + Send + 'static,
{
    type Writer = IoHandle<T>;

    fn close_on_write_end(&self) -> bool {
        false
    }

    fn writer(&self) -> Result<Self::Writer, ContractError> {
        self.ensure_open(HandleSide::Write)?;
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_direct_handle_defaults() {
        let (a, _b) = duplex(64);
        let handle = IoHandle::new("duplex", a);

        assert!(!handle.close_on_read_end());
        assert!(!handle.close_on_write_end());
        assert_eq!(handle.read_capacity(), DEFAULT_READ_CAPACITY);
    }

    #[tokio::test]
    async fn test_drain_returns_available_bytes() {
        let (a, b) = duplex(64);
        let writer = IoHandle::new("w", a);
        let mut reader = IoHandle::new("r", b).with_read_capacity(4);

        writer.write_bytes(&b"hello"[..]).await.unwrap();

        let first = ReadHandle::drain_available(&mut reader).await.unwrap();
        assert_eq!(&first[..], b"hell");
        let second = ReadHandle::drain_available(&mut reader).await.unwrap();
        assert_eq!(&second[..], b"o");
    }

    #[tokio::test]
    async fn test_write_close_signals_end_of_stream() {
        let (a, b) = duplex(64);
        let writer = IoHandle::new("w", a);
        let reader = IoHandle::new("r", b);

        writer.write_bytes(&b"bye"[..]).await.unwrap();
        writer.shutdown().await.unwrap();

        assert_eq!(reader.read_to_end().await.unwrap(), b"bye");
        assert!(writer.is_closed().await);
    }

    #[tokio::test]
    async fn test_closed_handle_rejects_io_and_capture() {
        let (a, _b) = duplex(64);
        let handle = IoHandle::new("w", a);
        let clone = handle.clone();

        handle.shutdown().await.unwrap();
        handle.shutdown().await.unwrap();

        let err = clone.write_bytes(&b"late"[..]).await.unwrap_err();
        assert!(err.is_closed());
        assert!(matches!(
            clone.writer(),
            Err(ContractError::HandleUnavailable {
                side: HandleSide::Write,
                ..
            })
        ));
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let (a, _b) = duplex(1);
        let handle = IoHandle::new("r", a).with_read_capacity(0);
        assert_eq!(handle.read_capacity(), 1);
    }
}
