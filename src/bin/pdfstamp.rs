//! CLI binary for edgequake-pdfstamp.
//!
//! A thin shim over the library crate: `serve` runs the HTTP service,
//! `stamp` runs the same pipeline on local files, and `request` builds the
//! binary request body for (or sends it to) a running service.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_pdfstamp::{
    client, server, stamp_to_file, wire, PdfiumEngine, StampConfig, StampConfigBuilder,
    StampRequest,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the service on port 8080
  pdfstamp serve

  # Stamp a local file
  pdfstamp stamp contract.pdf -o signed.pdf \
      --signature sig.png --signature-keyword "Signed:" \
      --date 2024-05-01 --date-keyword "Date:" \
      --field name=Alice

  # Send the same request to a running service
  pdfstamp request contract.pdf -o signed.pdf --url http://localhost:8080 \
      --seal seal.png --seal-keyword "Seal:"

  # Only build the binary request body
  pdfstamp request contract.pdf -o request.bin --date today --date-keyword "Date:"

ENVIRONMENT VARIABLES:
  PDFSTAMP_HOST / PDFSTAMP_PORT   Bind address for `serve`
  PDFSTAMP_PDFIUM_LIB             Directory containing libpdfium
  PDFSTAMP_DATE_FONT              Font used for the date text
  RUST_LOG                        Overrides --verbose / --quiet
"#;

/// Stamp signatures, seals, dates and form values onto PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "pdfstamp",
    version,
    about = "Stamp signatures, seals, dates and form values onto PDFs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDFSTAMP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDFSTAMP_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve `POST /sign` and `GET /health` until Ctrl-C.
    Serve {
        /// Bind address.
        #[arg(long, env = "PDFSTAMP_HOST", default_value = "0.0.0.0")]
        host: String,

        /// Listening port.
        #[arg(short, long, env = "PDFSTAMP_PORT", default_value_t = 8080)]
        port: u16,

        /// Whole-request timeout in seconds.
        #[arg(long, env = "PDFSTAMP_TIMEOUT", default_value_t = 60)]
        timeout: u64,

        /// Largest accepted request body in bytes.
        #[arg(long, env = "PDFSTAMP_MAX_BODY", default_value_t = 64 * 1024 * 1024)]
        max_body: usize,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Stamp a local PDF and write the result.
    Stamp {
        #[command(flatten)]
        request: RequestArgs,

        /// Output PDF path.
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Build a request body, or send it to a running service with --url.
    Request {
        #[command(flatten)]
        request: RequestArgs,

        /// Where to write the body (or, with --url, the stamped PDF).
        #[arg(short, long)]
        output: PathBuf,

        /// Base URL of a running service, e.g. http://localhost:8080.
        #[arg(long, env = "PDFSTAMP_URL")]
        url: Option<String>,

        /// HTTP timeout in seconds.
        #[arg(long, default_value_t = 120)]
        timeout: u64,
    },
}

/// What to stamp.
#[derive(Args, Debug)]
struct RequestArgs {
    /// PDF to stamp.
    input: PathBuf,

    /// Signature image (PNG or JPEG).
    #[arg(long, requires = "signature_keyword")]
    signature: Option<PathBuf>,

    /// Keyword the signature is placed after.
    #[arg(long, requires = "signature")]
    signature_keyword: Option<String>,

    /// Seal image (PNG or JPEG).
    #[arg(long, requires = "seal_keyword")]
    seal: Option<PathBuf>,

    /// Keyword the seal is placed after.
    #[arg(long, requires = "seal")]
    seal_keyword: Option<String>,

    /// Date text to write.
    #[arg(long, requires = "date_keyword")]
    date: Option<String>,

    /// Keyword the date is placed after.
    #[arg(long, requires = "date")]
    date_keyword: Option<String>,

    /// Form value as NAME=VALUE. Repeatable.
    #[arg(long = "field", value_parser = parse_key_val)]
    fields: Vec<(String, String)>,
}

/// How to draw, and with which engine.
#[derive(Args, Debug)]
struct EngineArgs {
    /// Directory containing the pdfium shared library.
    #[arg(long, env = "PDFSTAMP_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Extra TrueType font as NAME=PATH. Repeatable.
    #[arg(long = "font", value_parser = parse_key_val)]
    fonts: Vec<(String, String)>,

    /// Font for the date text.
    #[arg(long, env = "PDFSTAMP_DATE_FONT", default_value = "Helvetica")]
    date_font: String,

    /// Date text size in points.
    #[arg(long, env = "PDFSTAMP_DATE_FONT_SIZE", default_value_t = 12.0)]
    date_font_size: f32,

    /// Vertical shift of the signature in points (positive moves up).
    #[arg(long, env = "PDFSTAMP_SIGNATURE_OFFSET", default_value_t = 0.0, allow_negative_numbers = true)]
    signature_offset: f32,

    /// Signature opacity (0–1).
    #[arg(long, env = "PDFSTAMP_SIGNATURE_OPACITY", default_value_t = 1.0)]
    signature_opacity: f32,

    /// Vertical shift of the seal in points.
    #[arg(long, env = "PDFSTAMP_SEAL_OFFSET", default_value_t = 0.0, allow_negative_numbers = true)]
    seal_offset: f32,

    /// Seal opacity (0–1).
    #[arg(long, env = "PDFSTAMP_SEAL_OPACITY", default_value_t = 1.0)]
    seal_opacity: f32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve {
            host,
            port,
            timeout,
            max_body,
            engine,
        } => {
            let config = engine
                .apply(StampConfig::builder())
                .host(host)
                .port(port)
                .request_timeout_secs(timeout)
                .max_body_bytes(max_body)
                .build()?;
            let engine = Arc::new(bind_engine(&config)?);

            let router = server::build_router(engine, &config);
            let listener = server::bind(&config)
                .await
                .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
            server::serve(listener, router, shutdown_signal())
                .await
                .context("Server failed")?;
        }

        Command::Stamp {
            request,
            output,
            engine,
        } => {
            let config = engine.apply(StampConfig::builder()).build()?;
            let engine = Arc::new(bind_engine(&config)?);
            let request = request.load().await?;

            let written = stamp_to_file(engine, request, &config.style, &output)
                .await
                .context("Stamping failed")?;
            if !cli.quiet {
                eprintln!("Wrote {} bytes to {}", written, output.display());
            }
        }

        Command::Request {
            request,
            output,
            url,
            timeout,
        } => {
            let request = request.load().await?;
            let bytes = match url {
                Some(url) => client::send(&url, &request, timeout)
                    .await
                    .context("Remote stamping failed")?,
                None => wire::encode(&request).context("Failed to encode request")?,
            };
            tokio::fs::write(&output, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            if !cli.quiet {
                eprintln!("Wrote {} bytes to {}", bytes.len(), output.display());
            }
        }
    }

    Ok(())
}

impl EngineArgs {
    /// Copy engine and style flags onto a config builder.
    fn apply(self, builder: StampConfigBuilder) -> StampConfigBuilder {
        let mut builder = builder
            .date_font(self.date_font)
            .date_font_size(self.date_font_size)
            .signature_offset(self.signature_offset)
            .signature_opacity(self.signature_opacity)
            .seal_offset(self.seal_offset)
            .seal_opacity(self.seal_opacity);
        if let Some(dir) = self.pdfium_lib {
            builder = builder.pdfium_library_path(dir);
        }
        for (name, path) in self.fonts {
            builder = builder.font(name, path);
        }
        builder
    }
}

impl RequestArgs {
    /// Read every referenced file into a request.
    async fn load(self) -> Result<StampRequest> {
        let document = read(&self.input).await?;
        if document.is_empty() {
            bail!("{} is empty", self.input.display());
        }
        let mut request = StampRequest::new(document);

        if let (Some(path), Some(keyword)) = (self.signature, self.signature_keyword) {
            request = request.with_signature(read(&path).await?, keyword);
        }
        if let (Some(path), Some(keyword)) = (self.seal, self.seal_keyword) {
            request = request.with_seal(read(&path).await?, keyword);
        }
        if let (Some(date), Some(keyword)) = (self.date, self.date_keyword) {
            request = request.with_date(date, keyword);
        }
        for (name, value) in self.fields {
            request = request.with_field(name, value);
        }
        Ok(request)
    }
}

fn bind_engine(config: &StampConfig) -> Result<PdfiumEngine> {
    let fonts = config.load_fonts()?;
    let engine = PdfiumEngine::bind(config.pdfium_library_path.as_deref(), fonts)?;
    info!("PDF engine ready");
    Ok(engine)
}

async fn read(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Parse `KEY=VALUE`. The value may itself contain `=`.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty name in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, draining in-flight requests");
}
