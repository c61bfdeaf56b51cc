//! # Recibo CLI
//!
//! Command-line interface for the ESC/POS printer emulator.
//!
//! ## Usage
//!
//! ```bash
//! # Emulate a printer on the raw printing port
//! recibo serve
//!
//! # 58mm paper, spool each job to a file
//! recibo serve --paper 58mm --spool ./jobs
//!
//! # Emit JSON Lines instead of receipts
//! recibo serve --format json
//!
//! # Decode a captured job offline
//! recibo decode capture.bin
//! cat capture.bin | recibo decode -
//! ```

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use recibo::{
    ReciboError,
    printer::Paper,
    protocol::{Decoder, ParamPolicy},
    render::Charset,
    server::{self, OutputFormat, ServerConfig},
};

/// Recibo - ESC/POS receipt printer emulator
#[derive(Parser, Debug)]
#[command(name = "recibo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log every decoded command (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Listen for print jobs over raw TCP
    Serve {
        /// Address to listen on [default: 0.0.0.0:9100]
        #[arg(long)]
        listen: Option<String>,

        /// Write each connection's output to a file in this directory
        #[arg(long, value_name = "DIR")]
        spool: Option<PathBuf>,

        /// Close connections idle for this many seconds
        #[arg(long, value_name = "SECS")]
        idle_timeout: Option<u64>,

        #[command(flatten)]
        render: RenderArgs,
    },
    /// Decode a captured byte stream ("-" for stdin)
    Decode {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        render: RenderArgs,
    },
}

/// Options shared by `serve` and `decode`.
#[derive(Args, Debug)]
struct RenderArgs {
    /// JSON config file; flags given here override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Paper width: 58mm or 80mm [default: 80mm]
    #[arg(long, value_parser = Paper::parse)]
    paper: Option<Paper>,

    /// Output format [default: receipt]
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// How text bytes are decoded [default: cp437]
    #[arg(long, value_enum)]
    charset: Option<Charset>,

    /// Plain text receipts without ANSI styles
    #[arg(long)]
    no_ansi: bool,

    /// Omit [unsupported ...] lines from receipts
    #[arg(long)]
    no_markers: bool,

    /// Reject out-of-range parameters instead of clamping them
    #[arg(long)]
    strict: bool,
}

impl RenderArgs {
    fn load(&self) -> Result<ServerConfig, ReciboError> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        if let Some(paper) = self.paper {
            config.paper = paper;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(charset) = self.charset {
            config.charset = charset;
        }
        if self.no_ansi {
            config.ansi = false;
        }
        if self.no_markers {
            config.markers = false;
        }
        if self.strict {
            config.policy = ParamPolicy::Reject;
        }
        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "recibo=debug" } else { "recibo=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(io::stderr)
        .init();
}

fn run(command: Commands) -> Result<(), ReciboError> {
    match command {
        Commands::Serve {
            listen,
            spool,
            idle_timeout,
            render,
        } => {
            let mut config = render.load()?;
            if let Some(listen) = listen {
                config.listen_addr = listen;
            }
            if spool.is_some() {
                config.spool_dir = spool;
            }
            if idle_timeout.is_some() {
                config.idle_timeout_secs = idle_timeout;
            }

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(config))
        }
        Commands::Decode { input, render } => {
            let config = render.load()?;
            decode(&input, &config)
        }
    }
}

/// Stream a capture through the decoder, rendering to stdout.
fn decode(input: &Path, config: &ServerConfig) -> Result<(), ReciboError> {
    let mut reader: Box<dyn Read> = if input == Path::new("-") {
        Box::new(io::stdin().lock())
    } else {
        Box::new(File::open(input).map_err(|e| {
            ReciboError::Config(format!("Cannot open {}: {}", input.display(), e))
        })?)
    };

    let mut decoder = Decoder::new(config.renderer(io::stdout(), None)).with_policy(config.policy);
    if let Some(limit) = config.max_text_run {
        decoder = decoder.with_max_run(limit);
    }
    let mut buf = vec![0u8; 4096];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        decoder.feed(&buf[..n])?;
    }

    let bytes = decoder.offset();
    decoder.close()?;
    info!(bytes, input = %input.display(), "decoded");
    Ok(())
}
