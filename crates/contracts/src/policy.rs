//! Close-policy decorators
//!
//! Wrap an endpoint to replace its close-on-end-of-stream flag. The wrapped
//! value is never modified: it stays reachable through `inner()` with its own
//! flags, and the decorator hands out exactly the same handle.
//!
//! Decorators compose. Wrapping a decorated value overrides only the flag the
//! outer decorator targets; the other side passes through unchanged.
//!
//! ```
//! use contracts::{PolicyExt, Readable, Writable};
//! # use contracts::{ContractError, ReadHandle, WriteHandle};
//! # use bytes::Bytes;
//! # struct H;
//! # impl ReadHandle for H {
//! #     fn name(&self) -> &str { "h" }
//! #     async fn drain_available(&mut self) -> Result<Bytes, ContractError> { Ok(Bytes::new()) }
//! #     async fn close(&mut self) -> Result<(), ContractError> { Ok(()) }
//! # }
//! # impl WriteHandle for H {
//! #     fn name(&self) -> &str { "h" }
//! #     async fn write(&mut self, _: &Bytes) -> Result<(), ContractError> { Ok(()) }
//! #     async fn close(&mut self) -> Result<(), ContractError> { Ok(()) }
//! # }
//! # struct Duplex;
//! # impl Readable for Duplex {
//! #     type Reader = H;
//! #     fn close_on_read_end(&self) -> bool { false }
//! #     fn reader(&self) -> Result<H, ContractError> { Ok(H) }
//! # }
//! # impl Writable for Duplex {
//! #     type Writer = H;
//! #     fn close_on_write_end(&self) -> bool { true }
//! #     fn writer(&self) -> Result<H, ContractError> { Ok(H) }
//! # }
//! let endpoint = Duplex.with_close(true).with_write_close(false);
//! assert!(endpoint.close_on_read_end());
//! assert!(!endpoint.close_on_write_end());
//! ```

use crate::{ContractError, Readable, Writable};

/// Overrides the read-side close flag
#[derive(Debug, Clone)]
pub struct ReadClose<E> {
    inner: E,
    close: bool,
}

impl<E> ReadClose<E> {
    pub fn new(inner: E, close: bool) -> Self {
        Self { inner, close }
    }

    /// The undecorated endpoint
    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: Readable> Readable for ReadClose<E> {
    type Reader = E::Reader;

    fn close_on_read_end(&self) -> bool {
        self.close
    }

    fn reader(&self) -> Result<Self::Reader, ContractError> {
        self.inner.reader()
    }
}

impl<E: Writable> Writable for ReadClose<E> {
    type Writer = E::Writer;

    fn close_on_write_end(&self) -> bool {
        self.inner.close_on_write_end()
    }

    fn writer(&self) -> Result<Self::Writer, ContractError> {
        self.inner.writer()
    }
}

/// Overrides the write-side close flag
#[derive(Debug, Clone)]
pub struct WriteClose<E> {
    inner: E,
    close: bool,
}

impl<E> WriteClose<E> {
    pub fn new(inner: E, close: bool) -> Self {
        Self { inner, close }
    }

    /// The undecorated endpoint
    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: Readable> Readable for WriteClose<E> {
    type Reader = E::Reader;

    fn close_on_read_end(&self) -> bool {
        self.inner.close_on_read_end()
    }

    fn reader(&self) -> Result<Self::Reader, ContractError> {
        self.inner.reader()
    }
}

impl<E: Writable> Writable for WriteClose<E> {
    type Writer = E::Writer;

    fn close_on_write_end(&self) -> bool {
        self.close
    }

    fn writer(&self) -> Result<Self::Writer, ContractError> {
        self.inner.writer()
    }
}

/// Overrides both close flags of an endpoint that is source and sink at once
#[derive(Debug, Clone)]
pub struct CloseOnEnd<E> {
    inner: E,
    close: bool,
}

impl<E> CloseOnEnd<E> {
    pub fn new(inner: E, close: bool) -> Self {
        Self { inner, close }
    }

    /// The undecorated endpoint
    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: Readable> Readable for CloseOnEnd<E> {
    type Reader = E::Reader;

    fn close_on_read_end(&self) -> bool {
        self.close
    }

    fn reader(&self) -> Result<Self::Reader, ContractError> {
        self.inner.reader()
    }
}

impl<E: Writable> Writable for CloseOnEnd<E> {
    type Writer = E::Writer;

    fn close_on_write_end(&self) -> bool {
        self.close
    }

    fn writer(&self) -> Result<Self::Writer, ContractError> {
        self.inner.writer()
    }
}

/// Builder-style access to the decorators
pub trait PolicyExt: Sized {
    /// Replace the read-side close flag
    fn with_read_close(self, close: bool) -> ReadClose<Self>
    where
        Self: Readable,
    {
        ReadClose::new(self, close)
    }

    /// Replace the write-side close flag
    fn with_write_close(self, close: bool) -> WriteClose<Self>
    where
        Self: Writable,
    {
        WriteClose::new(self, close)
    }

    /// Replace both close flags
    fn with_close(self, close: bool) -> CloseOnEnd<Self>
    where
        Self: Readable + Writable,
    {
        CloseOnEnd::new(self, close)
    }
}

impl<T> PolicyExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ReadHandle, WriteHandle};
    use bytes::Bytes;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Token(u32);

    impl ReadHandle for Token {
        fn name(&self) -> &str {
            "token"
        }

        async fn drain_available(&mut self) -> Result<Bytes, ContractError> {
            Ok(Bytes::new())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    impl WriteHandle for Token {
        fn name(&self) -> &str {
            "token"
        }

        async fn write(&mut self, _chunk: &Bytes) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    /// Pipe-like endpoint: read side left open, write side closed
    #[derive(Debug, Clone)]
    struct FakePipe {
        id: u32,
    }

    impl Readable for FakePipe {
        type Reader = Token;

        fn close_on_read_end(&self) -> bool {
            false
        }

        fn reader(&self) -> Result<Token, ContractError> {
            Ok(Token(self.id))
        }
    }

    impl Writable for FakePipe {
        type Writer = Token;

        fn close_on_write_end(&self) -> bool {
            true
        }

        fn writer(&self) -> Result<Token, ContractError> {
            Ok(Token(self.id + 1000))
        }
    }

    #[test]
    fn test_read_close_overrides_read_side_only() {
        let decorated = FakePipe { id: 1 }.with_read_close(true);

        assert!(decorated.close_on_read_end());
        assert!(decorated.close_on_write_end());
        assert!(!decorated.inner().close_on_read_end());
    }

    #[test]
    fn test_write_close_overrides_write_side_only() {
        let decorated = FakePipe { id: 1 }.with_write_close(false);

        assert!(!decorated.close_on_read_end());
        assert!(!decorated.close_on_write_end());
        assert!(decorated.inner().close_on_write_end());
    }

    #[test]
    fn test_close_overrides_both_sides() {
        let pipe = FakePipe { id: 1 };
        let decorated = pipe.clone().with_close(true);

        assert!(decorated.close_on_read_end());
        assert!(decorated.close_on_write_end());

        // Original value keeps its defaults
        assert!(!pipe.close_on_read_end());
        assert!(pipe.close_on_write_end());
    }

    #[test]
    fn test_decorator_keeps_handles() {
        let decorated = FakePipe { id: 7 }.with_close(false);

        assert_eq!(decorated.reader().unwrap(), Token(7));
        assert_eq!(decorated.writer().unwrap(), Token(1007));
    }

    #[test]
    fn test_chained_decoration_targets_one_flag() {
        let both = FakePipe { id: 1 }.with_close(true);
        let chained = both.clone().with_write_close(false);

        assert!(chained.close_on_read_end());
        assert!(!chained.close_on_write_end());

        // Inner decoration unchanged
        assert!(chained.inner().close_on_write_end());
        assert!(both.close_on_write_end());
    }

    #[test]
    fn test_outer_override_wins() {
        let chained = FakePipe { id: 1 }
            .with_read_close(true)
            .with_read_close(false);

        assert!(!chained.close_on_read_end());
        assert!(chained.inner().close_on_read_end());
    }
}
