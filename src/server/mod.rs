//! # Raw TCP Print Server
//!
//! Listens on the raw printing port and decodes each connection as one
//! ESC/POS job stream.
//!
//! ## Usage
//!
//! ```bash
//! recibo serve --listen 0.0.0.0:9100 --paper 80mm
//! ```
//!
//! Then point any ESC/POS client at the host, e.g.
//! `printf 'Hello\n\x1dV\x00' | nc localhost 9100`.
//!
//! Every connection runs in its own task with its own decoder and printer
//! state. Nothing is shared between connections except the read-only config.

mod connection;
mod state;

pub use connection::{handle, spool_name};
pub use state::{DEFAULT_LISTEN_ADDR, OutputFormat, ServerConfig};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info, warn};

use crate::error::ReciboError;

/// Pause after a failed accept (e.g. out of file descriptors).
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Bind the configured address and serve until Ctrl-C.
///
/// ## Example
///
/// ```no_run
/// use recibo::server::{serve, ServerConfig};
///
/// # async fn example() -> Result<(), recibo::ReciboError> {
/// let config = ServerConfig {
///     listen_addr: "127.0.0.1:9100".to_string(),
///     ..ServerConfig::default()
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), ReciboError> {
    let listener = TcpListener::bind(&config.listen_addr).await.map_err(|e| {
        ReciboError::Transport(format!("Failed to bind to {}: {}", config.listen_addr, e))
    })?;

    info!(
        addr = %listener.local_addr()?,
        paper = config.paper.name(),
        format = ?config.format,
        "ESC/POS printer emulator listening"
    );

    run(listener, config, shutdown_signal()).await
}

/// Accept connections on `listener` until `shutdown` resolves, then signal
/// every open connection to finish and wait for them.
pub async fn run(
    listener: TcpListener,
    config: ServerConfig,
    shutdown: impl Future<Output = ()>,
) -> Result<(), ReciboError> {
    let config = Arc::new(config);
    let (stop, stopped) = watch::channel(false);
    let mut tasks = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    info!(%peer, "connection accepted");
                    tasks.spawn(handle(stream, peer, Arc::clone(&config), stopped.clone()));
                }
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            },
            Some(done) = tasks.join_next(), if !tasks.is_empty() => finished(done),
        }
    }

    info!(open = tasks.len(), "shutting down");
    // Receivers outlive the send only if connections are still open.
    let _ = stop.send(true);
    while let Some(done) = tasks.join_next().await {
        finished(done);
    }
    Ok(())
}

fn finished(done: Result<Result<(), ReciboError>, JoinError>) {
    match done {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "connection failed"),
        Err(e) => error!(error = %e, "connection task panicked"),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
