//! Server configuration.

use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ReciboError;
use crate::printer::Paper;
use crate::protocol::ParamPolicy;
use crate::render::{Charset, JsonRenderer, ReceiptRenderer, Renderer};

/// Conventional raw printing port.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:9100";

/// How decoded jobs are written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Framed text receipts.
    #[default]
    Receipt,
    /// One JSON object per event.
    Json,
}

impl OutputFormat {
    /// Spool file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Receipt => "txt",
            Self::Json => "jsonl",
        }
    }
}

/// Server configuration.
///
/// Every field has a default, so a config file only needs the values it changes:
///
/// ```
/// use recibo::printer::Paper;
/// use recibo::server::ServerConfig;
///
/// let config: ServerConfig = serde_json::from_str(r#"{"paper": "58mm"}"#)?;
/// assert_eq!(config.paper, Paper::Mm58);
/// assert_eq!(config.listen_addr, "0.0.0.0:9100");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:9100")
    pub listen_addr: String,
    pub paper: Paper,
    pub format: OutputFormat,
    pub charset: Charset,
    /// Write each connection's output to a file here instead of stdout.
    pub spool_dir: Option<PathBuf>,
    /// ANSI styles in receipt output.
    pub ansi: bool,
    /// `[unsupported ...]` lines in receipt output.
    pub markers: bool,
    pub policy: ParamPolicy,
    /// Close a connection after this many seconds without data.
    pub idle_timeout_secs: Option<u64>,
    /// Split text runs longer than this many bytes. Unlimited by default.
    pub max_text_run: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            paper: Paper::default(),
            format: OutputFormat::default(),
            charset: Charset::default(),
            spool_dir: None,
            ansi: true,
            markers: true,
            policy: ParamPolicy::default(),
            idle_timeout_secs: None,
            max_text_run: None,
        }
    }
}

impl ServerConfig {
    /// Load a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ReciboError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ReciboError::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| ReciboError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }

    /// Build the configured renderer over `out`. JSON records are tagged
    /// with `peer` when one is given.
    pub fn renderer<W>(&self, out: W, peer: Option<SocketAddr>) -> Box<dyn Renderer + Send>
    where
        W: Write + Send + 'static,
    {
        match self.format {
            OutputFormat::Receipt => Box::new(
                ReceiptRenderer::new(out, self.paper)
                    .charset(self.charset)
                    .ansi(self.ansi)
                    .markers(self.markers),
            ),
            OutputFormat::Json => {
                let json = JsonRenderer::new(out).charset(self.charset);
                match peer {
                    Some(peer) => Box::new(json.peer(peer.to_string())),
                    None => Box::new(json),
                }
            }
        }
    }
}
