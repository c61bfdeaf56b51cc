//! TCP round trips against a live server on an ephemeral port.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use recibo::{
    ReciboError,
    protocol::commands::{self, STATUS_ONLINE},
    server::{self, OutputFormat, ServerConfig},
};

struct TestServer {
    addr: SocketAddr,
    spool: PathBuf,
    stop: oneshot::Sender<()>,
    task: JoinHandle<Result<(), ReciboError>>,
}

impl TestServer {
    async fn start(name: &str, config: ServerConfig) -> Self {
        let spool = std::env::temp_dir().join(format!("recibo-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&spool);

        let config = ServerConfig {
            spool_dir: Some(spool.clone()),
            ansi: false,
            ..config
        };
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = oneshot::channel::<()>();
        let task = tokio::spawn(server::run(listener, config, async {
            let _ = stopped.await;
        }));

        Self {
            addr,
            spool,
            stop,
            task,
        }
    }

    /// Stop the server, wait for every connection, and return the spool files.
    async fn stop(self) -> Vec<String> {
        self.stop.send(()).unwrap();
        self.task.await.unwrap().unwrap();
        let files = spooled(&self.spool);
        let _ = std::fs::remove_dir_all(&self.spool);
        files
    }
}

fn spooled(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<String> = entries
        .map(|entry| std::fs::read_to_string(entry.unwrap().path()).unwrap())
        .collect();
    files.sort();
    files
}

/// Send a status request and wait for the reply, so everything written
/// before it has been decoded.
async fn sync(stream: &mut TcpStream) {
    stream
        .write_all(&commands::status_request(1))
        .await
        .unwrap();
    let mut reply = [0u8; 1];
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply[0], STATUS_ONLINE);
}

#[tokio::test]
async fn test_status_request_gets_online_reply() {
    let server = TestServer::start("status", ServerConfig::default()).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    sync(&mut stream).await;
    sync(&mut stream).await;
    drop(stream);

    server.stop().await;
}

#[tokio::test]
async fn test_realtime_request_gets_no_reply() {
    let server = TestServer::start("enq", ServerConfig::default()).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(&[commands::DLE, commands::ENQ, 2]).await.unwrap();
    sync(&mut stream).await;
    stream.shutdown().await.unwrap();
    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).await.unwrap();
    assert!(rest.is_empty());

    server.stop().await;
}

#[tokio::test]
async fn test_job_is_spooled_as_receipt() {
    let server = TestServer::start("receipt", ServerConfig::default()).await;

    let mut job = commands::init();
    job.extend(commands::align(1));
    job.extend(b"HELLO\n");
    job.extend(commands::cut(false));
    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(&job).await.unwrap();
    stream.shutdown().await.unwrap();
    let mut rest = Vec::new();
    stream.read_to_end(&mut rest).await.unwrap();

    let files = server.stop().await;
    assert_eq!(files.len(), 1);
    let receipt = &files[0];
    assert!(receipt.starts_with('┌'));
    assert!(receipt.contains(&format!("│ {}HELLO{} │", " ".repeat(21), " ".repeat(22))));
    assert!(receipt.contains(&"-".repeat(48)));
}

#[tokio::test]
async fn test_shutdown_flushes_pending_text() {
    let server = TestServer::start("shutdown", ServerConfig::default()).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(b"unfinished line").await.unwrap();
    sync(&mut stream).await;

    // The connection is still open when the server stops.
    let files = server.stop().await;
    assert_eq!(files.len(), 1);
    assert!(files[0].contains("unfinished line"));
    drop(stream);
}

#[tokio::test]
async fn test_connections_do_not_share_state() {
    let config = ServerConfig {
        format: OutputFormat::Json,
        ..ServerConfig::default()
    };
    let server = TestServer::start("isolation", config).await;

    let mut bold = TcpStream::connect(server.addr).await.unwrap();
    bold.write_all(&commands::bold(true)).await.unwrap();
    bold.write_all(b"loud").await.unwrap();
    sync(&mut bold).await;

    let mut plain = TcpStream::connect(server.addr).await.unwrap();
    plain.write_all(b"quiet").await.unwrap();
    sync(&mut plain).await;

    drop(bold);
    drop(plain);
    let files = server.stop().await;
    assert_eq!(files.len(), 2);

    let texts: Vec<Value> = files
        .iter()
        .flat_map(|file| file.lines())
        .map(|line| serde_json::from_str::<Value>(line).unwrap())
        .filter(|record| record["event"] == "text")
        .collect();
    assert_eq!(texts.len(), 2);
    for record in texts {
        let expect_bold = record["text"] == "loud";
        assert_eq!(record["style"]["bold"], expect_bold);
    }
}

#[tokio::test]
async fn test_idle_timeout_closes_connection() {
    let config = ServerConfig {
        idle_timeout_secs: Some(1),
        ..ServerConfig::default()
    };
    let server = TestServer::start("idle", config).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    let mut buf = [0u8; 8];
    let read = tokio::time::timeout(Duration::from_secs(10), stream.read(&mut buf))
        .await
        .expect("server should close an idle connection");
    assert_eq!(read.unwrap(), 0);

    // Nothing was sent, so no spool file is left behind.
    let files = server.stop().await;
    assert!(files.is_empty());
}
