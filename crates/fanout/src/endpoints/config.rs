//! Endpoints built from a `TeeBlueprint`

use std::path::Path;

use contracts::{
    PolicyExt, ReadClose, SinkConfig, SinkKind, SourceConfig, SourceKind, TeeBlueprint,
    WriteClose,
};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, instrument};

use super::io::IoHandle;
use crate::engine::{FanOut, FanOutConfig};
use crate::error::FanOutError;

pub type DynReader = Box<dyn AsyncRead + Send + Unpin>;
pub type DynWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Source opened from configuration, with its effective close flag
pub type ConfiguredSource = ReadClose<IoHandle<DynReader>>;

/// Sink opened from configuration, with its effective close flag
pub type ConfiguredSink = WriteClose<IoHandle<DynWriter>>;

/// Open the configured source
///
/// Standard input is left open at end-of-stream unless overridden; files and
/// connections opened here are closed.
#[instrument(name = "fanout_open_source", skip(config), fields(kind = ?config.kind))]
pub async fn open_source(
    config: &SourceConfig,
    read_capacity: usize,
) -> Result<ConfiguredSource, FanOutError> {
    let (handle, default_close): (IoHandle<DynReader>, bool) = match config.kind {
        SourceKind::Stdin => (
            IoHandle::new("stdin", Box::new(tokio::io::stdin()) as DynReader),
            false,
        ),
        SourceKind::File => {
            let path = required_path("source", config.path.as_deref())?;
            let file = File::open(path)
                .await
                .map_err(|e| FanOutError::open(path.display().to_string(), e.to_string()))?;
            (
                IoHandle::new(
                    format!("file:{}", path.display()),
                    Box::new(file) as DynReader,
                ),
                true,
            )
        }
        SourceKind::Tcp => {
            let addr = required_addr("source", config.addr.as_deref())?;
            let stream = TcpStream::connect(addr)
                .await
                .map_err(|e| FanOutError::open(addr, e.to_string()))?;
            (
                IoHandle::new(format!("tcp:{addr}"), Box::new(stream) as DynReader),
                true,
            )
        }
    };

    let close = config.close_on_end.unwrap_or(default_close);
    debug!(source = %handle.name(), close_on_end = close, "Source opened");
    Ok(handle
        .with_read_capacity(read_capacity)
        .with_read_close(close))
}

/// Open one configured sink
///
/// Standard streams are left open at end-of-stream unless overridden; files
/// and connections are closed.
#[instrument(
    name = "fanout_open_sink",
    skip(config),
    fields(sink = %config.name, kind = ?config.kind)
)]
pub async fn open_sink(config: &SinkConfig) -> Result<ConfiguredSink, FanOutError> {
    let name = config.name.clone();
    let (handle, default_close): (IoHandle<DynWriter>, bool) = match config.kind {
        SinkKind::Stdout => (
            IoHandle::new(name, Box::new(tokio::io::stdout()) as DynWriter),
            false,
        ),
        SinkKind::Stderr => (
            IoHandle::new(name, Box::new(tokio::io::stderr()) as DynWriter),
            false,
        ),
        SinkKind::File => {
            let path = required_path(&config.name, config.path.as_deref())?;
            let file = open_output_file(path, config.append)
                .await
                .map_err(|e| FanOutError::open(&config.name, e.to_string()))?;
            (IoHandle::new(name, Box::new(file) as DynWriter), true)
        }
        SinkKind::Tcp => {
            let addr = required_addr(&config.name, config.addr.as_deref())?;
            let stream = TcpStream::connect(addr)
                .await
                .map_err(|e| FanOutError::open(&config.name, e.to_string()))?;
            (IoHandle::new(name, Box::new(stream) as DynWriter), true)
        }
    };

    let close = config.close_on_end.unwrap_or(default_close);
    debug!(sink = %handle.name(), close_on_end = close, "Sink opened");
    Ok(handle.with_write_close(close))
}

/// Open every endpoint of a blueprint and capture them into a session
#[instrument(name = "fanout_open_blueprint", skip(blueprint), fields(sinks = blueprint.sinks.len()))]
pub async fn open_blueprint(
    blueprint: &TeeBlueprint,
) -> Result<FanOut<IoHandle<DynReader>>, FanOutError> {
    let source = open_source(&blueprint.source, blueprint.engine.read_capacity).await?;

    let mut sinks = Vec::with_capacity(blueprint.sinks.len());
    for sink_config in &blueprint.sinks {
        sinks.push(open_sink(sink_config).await?);
    }

    FanOut::builder(source)
        .config(FanOutConfig::from(&blueprint.engine))
        .sinks(sinks)
        .build()
}

async fn open_output_file(path: &Path, append: bool) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true);
    if append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }
    options.open(path).await
}

fn required_path<'a>(endpoint: &str, path: Option<&'a Path>) -> Result<&'a Path, FanOutError> {
    path.ok_or_else(|| FanOutError::open(endpoint, "missing 'path'"))
}

fn required_addr<'a>(endpoint: &str, addr: Option<&'a str>) -> Result<&'a str, FanOutError> {
    addr.ok_or_else(|| FanOutError::open(endpoint, "missing 'addr'"))
}
