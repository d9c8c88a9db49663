//! Built-in endpoints
//!
//! - [`IoHandle`]: any tokio reader/writer used directly as its own handle
//! - [`Pipe`]: in-process pipe with distinct read and write handles
//! - [`open_source`] / [`open_sink`]: endpoints described by a blueprint

mod config;
mod io;
mod pipe;

pub use self::config::{
    open_blueprint, open_sink, open_source, ConfiguredSink, ConfiguredSource, DynReader,
    DynWriter,
};
pub use self::io::IoHandle;
pub use self::pipe::{Pipe, PipeReader, PipeWriter};
