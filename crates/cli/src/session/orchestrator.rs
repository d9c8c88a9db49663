//! Session orchestrator - opens endpoints and drives one fan-out session.

use contracts::TeeBlueprint;
use fanout::{SessionControl, SessionReport};
use tracing::{info, warn};

use crate::error::Result;

/// One configured fan-out session
pub struct Session {
    blueprint: TeeBlueprint,
}

impl Session {
    pub fn new(blueprint: TeeBlueprint) -> Self {
        Self { blueprint }
    }

    /// Run until end-of-stream, failure, or a shutdown signal
    ///
    /// A signal detaches the reader; the chunk in flight is still delivered
    /// and the report comes back with outcome `cancelled`.
    pub async fn run(self) -> Result<SessionReport> {
        let fan_out = fanout::open_blueprint(&self.blueprint).await?;
        info!(
            source = ?self.blueprint.source.kind,
            sinks = fan_out.sink_count(),
            policy = ?self.blueprint.engine.on_sink_error,
            "Endpoints opened"
        );

        let session = fan_out.spawn();
        let watcher = tokio::spawn(cancel_on_signal(session.control().clone()));

        let result = session.join().await;
        watcher.abort();

        Ok(result?)
    }
}

async fn cancel_on_signal(control: SessionControl) {
    shutdown_signal().await;
    warn!("Received shutdown signal, detaching reader...");
    control.detach_reader();
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
