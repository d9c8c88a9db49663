//! Endpoint capability - what the fan-out engine requires of its source and sinks
//!
//! An endpoint is any value that can hand out a channel handle together with a
//! close-on-end-of-stream flag. The engine captures both exactly once, when a
//! session starts; later changes to the endpoint value have no effect on a
//! running session.

use bytes::Bytes;

use crate::ContractError;

/// Readable channel handle
///
/// `drain_available` waits until the handle is readable and returns whatever
/// bytes are available at that moment. An empty buffer means end-of-stream.
#[trait_variant::make(ReadHandle: Send)]
pub trait LocalReadHandle {
    /// Handle name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Drain the bytes currently available
    ///
    /// # Errors
    /// Returns the transport failure reported by the underlying channel
    async fn drain_available(&mut self) -> Result<Bytes, ContractError>;

    /// Close the handle
    async fn close(&mut self) -> Result<(), ContractError>;
}

/// Writable channel handle
#[trait_variant::make(WriteHandle: Send)]
pub trait LocalWriteHandle {
    /// Handle name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write the whole chunk
    ///
    /// Either every byte of `chunk` is transferred or an error is returned.
    async fn write(&mut self, chunk: &Bytes) -> Result<(), ContractError>;

    /// Close the handle
    async fn close(&mut self) -> Result<(), ContractError>;
}

/// A value usable as a fan-out source
pub trait Readable {
    /// Handle type drained by the engine
    type Reader: ReadHandle + 'static;

    /// Whether the read handle is closed when end-of-stream is observed
    fn close_on_read_end(&self) -> bool;

    /// Produce the read handle
    ///
    /// # Errors
    /// `ContractError::HandleUnavailable` when the endpoint cannot be read from
    fn reader(&self) -> Result<Self::Reader, ContractError>;
}

/// A value usable as a fan-out sink
pub trait Writable {
    /// Handle type written by the engine
    type Writer: WriteHandle + 'static;

    /// Whether the write handle is closed when end-of-stream is observed
    fn close_on_write_end(&self) -> bool;

    /// Produce the write handle
    ///
    /// # Errors
    /// `ContractError::HandleUnavailable` when the endpoint cannot be written to
    fn writer(&self) -> Result<Self::Writer, ContractError>;
}

/// Read handle and close flag captured from a [`Readable`]
#[derive(Debug)]
pub struct ReadEnd<R> {
    pub handle: R,
    pub close_on_end: bool,
}

impl<R: ReadHandle + 'static> ReadEnd<R> {
    /// Capture handle and flag from a source, querying each once
    pub fn capture<S>(source: &S) -> Result<Self, ContractError>
    where
        S: Readable<Reader = R> + ?Sized,
    {
        let close_on_end = source.close_on_read_end();
        let handle = source.reader()?;
        Ok(Self {
            handle,
            close_on_end,
        })
    }
}

/// Write handle and close flag captured from a [`Writable`]
#[derive(Debug)]
pub struct WriteEnd<W> {
    pub handle: W,
    pub close_on_end: bool,
}

impl<W: WriteHandle + 'static> WriteEnd<W> {
    /// Capture handle and flag from a sink, querying each once
    pub fn capture<S>(sink: &S) -> Result<Self, ContractError>
    where
        S: Writable<Writer = W> + ?Sized,
    {
        let close_on_end = sink.close_on_write_end();
        let handle = sink.writer()?;
        Ok(Self {
            handle,
            close_on_end,
        })
    }
}

impl<T: Readable + ?Sized> Readable for &T {
    type Reader = T::Reader;

    fn close_on_read_end(&self) -> bool {
        (**self).close_on_read_end()
    }

    fn reader(&self) -> Result<Self::Reader, ContractError> {
        (**self).reader()
    }
}

impl<T: Writable + ?Sized> Writable for &T {
    type Writer = T::Writer;

    fn close_on_write_end(&self) -> bool {
        (**self).close_on_write_end()
    }

    fn writer(&self) -> Result<Self::Writer, ContractError> {
        (**self).writer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HandleSide;
    use std::cell::Cell;

    #[derive(Debug)]
    struct NullHandle;

    impl ReadHandle for NullHandle {
        fn name(&self) -> &str {
            "null"
        }

        async fn drain_available(&mut self) -> Result<Bytes, ContractError> {
            Ok(Bytes::new())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    /// Counts how often its properties are queried
    struct CountingSource {
        flag_reads: Cell<u32>,
        handle_reads: Cell<u32>,
        available: bool,
    }

    impl Readable for CountingSource {
        type Reader = NullHandle;

        fn close_on_read_end(&self) -> bool {
            self.flag_reads.set(self.flag_reads.get() + 1);
            true
        }

        fn reader(&self) -> Result<NullHandle, ContractError> {
            self.handle_reads.set(self.handle_reads.get() + 1);
            if self.available {
                Ok(NullHandle)
            } else {
                Err(ContractError::handle_unavailable(
                    "counting",
                    HandleSide::Read,
                    "not readable",
                ))
            }
        }
    }

    #[test]
    fn test_capture_queries_once() {
        let source = CountingSource {
            flag_reads: Cell::new(0),
            handle_reads: Cell::new(0),
            available: true,
        };

        let end = ReadEnd::capture(&source).unwrap();
        assert!(end.close_on_end);
        assert_eq!(source.flag_reads.get(), 1);
        assert_eq!(source.handle_reads.get(), 1);
    }

    #[test]
    fn test_capture_reports_unavailable_handle() {
        let source = CountingSource {
            flag_reads: Cell::new(0),
            handle_reads: Cell::new(0),
            available: false,
        };

        let err = ReadEnd::capture(&source).unwrap_err();
        assert!(matches!(
            err,
            ContractError::HandleUnavailable {
                side: HandleSide::Read,
                ..
            }
        ));
    }

    #[test]
    fn test_capture_through_reference() {
        let source = CountingSource {
            flag_reads: Cell::new(0),
            handle_reads: Cell::new(0),
            available: true,
        };
        let by_ref = &source;

        let end = ReadEnd::capture(&by_ref).unwrap();
        assert!(end.close_on_end);
        assert_eq!(source.handle_reads.get(), 1);
    }
}
