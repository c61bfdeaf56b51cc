//! One TCP connection: read, decode, render, answer status requests.

use std::fs::File;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, info, instrument, trace};

use super::state::ServerConfig;
use crate::error::ReciboError;
use crate::protocol::{Decoder, Event, commands::STATUS_ONLINE};
use crate::render::Renderer;

/// Socket read buffer size.
const READ_BUF: usize = 4096;

/// Wraps the output renderer and collects the bytes owed to the host.
struct Responder<R> {
    inner: R,
    replies: Vec<u8>,
}

impl<R: Renderer> Renderer for Responder<R> {
    fn render(&mut self, event: Event) -> Result<(), ReciboError> {
        if let Event::StatusQuery(n) = event {
            debug!(n, "status request");
            self.replies.push(STATUS_ONLINE);
        }
        self.inner.render(event)
    }

    fn finish(&mut self) -> Result<(), ReciboError> {
        self.inner.finish()
    }
}

/// Spool file name for a connection: `<timestamp>-<peer>.<ext>`.
pub fn spool_name(at: DateTime<Local>, peer: SocketAddr, extension: &str) -> String {
    let peer = peer.to_string().replace([':', '[', ']'], "_");
    format!("{}-{}.{}", at.format("%Y%m%dT%H%M%S%.3f"), peer, extension)
}

/// Spool file for the connection, or stdout shared with every other
/// connection. Renderers write synchronously, one record or one receipt
/// per `write_all`.
fn open_output(
    config: &ServerConfig,
    peer: SocketAddr,
) -> io::Result<(Box<dyn Write + Send>, Option<PathBuf>)> {
    match &config.spool_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let path = dir.join(spool_name(Local::now(), peer, config.format.extension()));
            Ok((Box::new(File::create(&path)?), Some(path)))
        }
        None => Ok((Box::new(io::stdout()), None)),
    }
}

/// Read one chunk. `Ok(None)` means the idle timeout expired.
async fn read_chunk(
    stream: &mut TcpStream,
    buf: &mut [u8],
    idle: Option<Duration>,
) -> io::Result<Option<usize>> {
    match idle {
        Some(limit) => match tokio::time::timeout(limit, stream.read(buf)).await {
            Ok(read) => read.map(Some),
            Err(_) => Ok(None),
        },
        None => stream.read(buf).await.map(Some),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Serve one connection until the peer closes, the idle timeout expires, or
/// shutdown is signalled. The decoder is closed on every path, so buffered
/// text is rendered even when the socket fails.
#[instrument(name = "connection", skip_all, fields(peer = %peer))]
pub async fn handle(
    mut stream: TcpStream,
    peer: SocketAddr,
    config: Arc<ServerConfig>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), ReciboError> {
    let (out, spool) = open_output(&config, peer)?;
    // Records on the shared stdout carry their peer.
    let tag = spool.is_none().then_some(peer);
    let responder = Responder {
        inner: config.renderer(out, tag),
        replies: Vec::new(),
    };
    let mut decoder = Decoder::new(responder).with_policy(config.policy);
    if let Some(limit) = config.max_text_run {
        decoder = decoder.with_max_run(limit);
    }

    let pumped = pump(&mut stream, &mut decoder, config.idle_timeout(), &mut shutdown).await;

    let bytes = decoder.offset();
    decoder.close()?;
    info!(bytes, "connection closed");

    if bytes == 0
        && let Some(path) = spool
    {
        remove_empty(&path);
    }
    pumped
}

async fn pump<R: Renderer>(
    stream: &mut TcpStream,
    decoder: &mut Decoder<Responder<R>>,
    idle: Option<Duration>,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<(), ReciboError> {
    let mut buf = vec![0u8; READ_BUF];
    if *shutdown.borrow() {
        return Ok(());
    }

    loop {
        let read = tokio::select! {
            read = read_chunk(stream, &mut buf, idle) => read?,
            _ = shutdown.changed() => {
                info!("server shutting down");
                return Ok(());
            }
        };
        let n = match read {
            None => {
                info!("idle timeout");
                return Ok(());
            }
            Some(0) => return Ok(()),
            Some(n) => n,
        };

        trace!(len = n, data = %hex(&buf[..n]), "received");
        decoder.feed(&buf[..n])?;

        let replies = std::mem::take(&mut decoder.renderer_mut().replies);
        if !replies.is_empty() {
            stream.write_all(&replies).await?;
        }
    }
}

fn remove_empty(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        debug!(path = %path.display(), error = %e, "could not remove empty spool file");
    }
}
