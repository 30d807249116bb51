//! Certificate verification CLI tool
//!
//! A command-line tool for verifying certificates by code and rendering
//! them with security watermarks.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use chrono::Local;
use clap::{Parser, Subcommand};
use tiny_skia::{Color, Pixmap};
use tracing_subscriber::EnvFilter;

use cert_verify::document::{DecodedDocument, PdfDocument};
use cert_verify::messages;
use cert_verify::protection::{ClipboardSlot, EventHub, MemoryClipboard, ProtectionTargets};
use cert_verify::session::SessionState;
use cert_verify::{apply_watermark, CertificateViewer, ViewerConfig, WatermarkContext};

/// Certificate Verify - Fetch and render verified certificates
#[derive(Parser)]
#[command(name = "cert-verify")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Verify a code and write the watermarked pages to ./out
    cert-verify verify ABC123 --output-dir out

    # Use another backend
    cert-verify verify ABC123 --endpoint http://localhost:8080

    # Watermark a blank A4 page to preview the overlays
    cert-verify watermark -o preview.png

    # Inspect a downloaded certificate
    cert-verify info certificado.pdf")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a certificate code and render its pages
    Verify {
        /// Verification code
        code: String,

        /// Backend base URL (overrides CERT_VERIFY_API_BASE)
        #[arg(long)]
        endpoint: Option<String>,

        /// Directory for the rendered pages
        #[arg(short = 'd', long, default_value = ".")]
        output_dir: PathBuf,

        /// Render scale in pixels per point
        #[arg(long)]
        scale: Option<f32>,

        /// Request timeout in seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout: Option<u64>,
    },

    /// Apply the security watermark to an image
    Watermark {
        /// PNG to watermark (a blank white page if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Width of the blank page
        #[arg(long, default_value_t = 893, conflicts_with = "input")]
        width: u32,

        /// Height of the blank page
        #[arg(long, default_value_t = 1263, conflicts_with = "input")]
        height: u32,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,

        /// Identifier stamped into the overlays
        #[arg(long)]
        document_id: Option<String>,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cert_verify=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Verify {
            code,
            endpoint,
            output_dir,
            scale,
            timeout,
        } => cmd_verify(code, endpoint, output_dir, scale, timeout).await,
        Commands::Watermark {
            input,
            width,
            height,
            output,
            document_id,
        } => cmd_watermark(input, width, height, output, document_id),
        Commands::Info { input } => cmd_info(input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Run one verification session and write the rendered pages
async fn cmd_verify(
    code: String,
    endpoint: Option<String>,
    output_dir: PathBuf,
    scale: Option<f32>,
    timeout: Option<u64>,
) -> anyhow::Result<()> {
    let mut config = ViewerConfig::from_env()?;
    if let Some(endpoint) = endpoint {
        config.api_base = endpoint;
    }
    if let Some(scale) = scale {
        config.render_scale = scale;
    }
    if let Some(secs) = timeout {
        config.timeout = Duration::from_secs(secs);
    }

    // No interactive surface here; the hubs only receive what we dispatch
    let targets = ProtectionTargets {
        document: EventHub::new("document"),
        window: EventHub::new("window"),
        container: EventHub::new("container"),
    };
    let clipboard = Arc::new(ClipboardSlot::new(MemoryClipboard::new()));
    let viewer = CertificateViewer::new(config, targets, clipboard)?;

    let mut updates = viewer.subscribe();
    let handle = viewer.open(Some(&code));

    // Print each new progress checkpoint until the session settles
    let mut shown = None;
    loop {
        let snapshot = updates.borrow_and_update().clone();
        if snapshot.state.is_terminal() {
            break;
        }
        if shown != Some(snapshot.progress) {
            eprintln!("[{:>3}%] {}", snapshot.progress, messages::progress_label(snapshot.progress));
            shown = Some(snapshot.progress);
        }
        if updates.changed().await.is_err() {
            break;
        }
    }
    handle.finished().await;

    let snapshot = viewer.snapshot();
    let pages = match &snapshot.state {
        SessionState::Valid { pages } => pages.clone(),
        SessionState::Invalid { message, detail } => {
            eprintln!("{}", messages::INVALID_TITLE);
            if let Some(detail) = detail {
                eprintln!("{}", detail.suggestion);
                if let Some(url) = detail.help_url() {
                    eprintln!("{}", url);
                }
            }
            return Err(anyhow!("{}", message));
        }
        SessionState::Validating { .. } => return Err(anyhow!(messages::GENERIC)),
    };

    println!("{}", messages::VERIFIED_TITLE);
    println!("{}", messages::VERIFIED_SUBTITLE);

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Cannot create {}", output_dir.display()))?;

    let total = pages.len();
    for page in &pages {
        let pixmap = viewer.render_page(page).await?;
        let path = output_dir.join(format!("page-{:03}.png", page.page_number));
        save_png(&pixmap, &path)?;
        println!("{}: {}", messages::page_caption(page.page_number, total), path.display());
    }

    if let Some(lines) = viewer.footer() {
        for line in lines {
            println!("{}", line);
        }
    }
    if viewer.is_protected() {
        println!("{}", messages::PROTECTED_NOTICE);
    }

    viewer.close();
    Ok(())
}

/// Watermark an existing PNG or a blank page
fn cmd_watermark(
    input: Option<PathBuf>,
    width: u32,
    height: u32,
    output: PathBuf,
    document_id: Option<String>,
) -> anyhow::Result<()> {
    let mut pixmap = match &input {
        Some(path) => Pixmap::load_png(path).with_context(|| format!("Cannot read {}", path.display()))?,
        None => {
            let mut blank = Pixmap::new(width, height)
                .ok_or_else(|| anyhow!("Invalid page size {}x{}", width, height))?;
            blank.fill(Color::WHITE);
            blank
        }
    };

    let context = match document_id {
        Some(id) => WatermarkContext::with_id(id, Local::now()),
        None => WatermarkContext::new(),
    };

    eprintln!("Applying watermark {}...", context.document_id);
    apply_watermark(&mut pixmap, &context)?;
    save_png(&pixmap, &output)?;
    eprintln!("Output: {}", output.display());

    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: PathBuf) -> anyhow::Result<()> {
    if !input.exists() {
        return Err(anyhow!("Input file not found: {}", input.display()));
    }

    let document = PdfDocument::open(&input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", document.page_count());
    for page_number in 1..=document.page_count() {
        let size = document.page_size(page_number)?;
        println!("  Page {}: {} x {} pt", page_number, size.width, size.height);
    }

    if let Some(title) = document.title() {
        println!("Title: {}", title);
    }
    if let Some(author) = document.author() {
        println!("Author: {}", author);
    }

    Ok(())
}

fn save_png(pixmap: &Pixmap, path: &Path) -> anyhow::Result<()> {
    pixmap
        .save_png(path)
        .with_context(|| format!("Cannot write {}", path.display()))
}
