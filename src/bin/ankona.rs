//! CLI binary for ankona.
//!
//! A thin shim over the library crate: `serve` runs the HTTP service,
//! `convert` runs the case-file pipeline once on a local PDF and `extract`
//! prints what the style-reference reader sees in a DOCX.

use anyhow::{Context, Result};
use ankona::config::api_key_from_env;
use ankona::convert::write_atomic;
use ankona::pipeline::extract::extract_markup;
use ankona::server::{serve, AppState};
use ankona::{
    convert_case_file, resolve_model, CaseFileUpload, ConversionProgressCallback, ConversionStage,
    ProgressCallback, ServiceConfig,
};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that names the running stage and logs one line per
/// finished or degraded stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: ConversionStage) {
        self.bar.set_prefix(stage.label());
        self.bar.set_message(match stage {
            ConversionStage::Translate | ConversionStage::Refine => "waiting for Gemini…",
            _ => "",
        });
    }

    fn on_stage_complete(&self, stage: ConversionStage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<24} {}",
            green("✓"),
            stage.label(),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_stage_degraded(&self, stage: ConversionStage, reason: &str) {
        self.bar
            .println(format!("  {} {:<24} {}", yellow("⚠"), stage.label(), dim(reason)));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP service on port 8000
  ankona serve --port 8000

  # Translate one scanned case file
  ankona convert FIR_2024.pdf -o FIR_2024_Translated.docx

  # See what the style reference contributes to refinement
  ankona extract style_reference.docx

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key
  GOOGLE_API_KEY          Fallback when GEMINI_API_KEY is unset
  ANKONA_*                Every flag has an ANKONA_ variant (see --help)
  RUST_LOG                Overrides the log filter
"#;

/// Khata assistant and Bangla legal case-file translator.
#[derive(Parser, Debug)]
#[command(
    name = "ankona",
    version,
    about = "Khata assistant and Bangla legal case-file translator backed by Gemini",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "ANKONA_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "ANKONA_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service.
    Serve(ServeArgs),
    /// Translate a local PDF case file to DOCX.
    Convert(ConvertArgs),
    /// Print the constrained Markdown read from a DOCX.
    Extract {
        /// DOCX file to read.
        input: PathBuf,
    },
}

/// Settings shared by `serve` and `convert`.
#[derive(Args, Debug)]
struct ModelArgs {
    /// Gemini API key. Falls back to GEMINI_API_KEY, then GOOGLE_API_KEY.
    #[arg(long, env = "ANKONA_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini REST base URL.
    #[arg(long, env = "ANKONA_API_BASE_URL")]
    api_base_url: Option<String>,

    /// Model for the schema-mode endpoints.
    #[arg(long, env = "ANKONA_STRUCTURED_MODEL")]
    structured_model: Option<String>,

    /// Model for translation and refinement.
    #[arg(long, env = "ANKONA_DOCUMENT_MODEL")]
    document_model: Option<String>,

    /// DOCX whose structure guides refinement.
    #[arg(long, env = "ANKONA_STYLE_REFERENCE", default_value = "style_reference.docx")]
    style_reference: PathBuf,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Address to bind.
    #[arg(long, env = "ANKONA_HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to bind.
    #[arg(short, long, env = "ANKONA_PORT", default_value_t = 8000)]
    port: u16,

    /// Directory translated documents are saved to.
    #[arg(long, env = "ANKONA_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Do not keep translated documents on disk.
    #[arg(long, env = "ANKONA_NO_PERSIST")]
    no_persist: bool,

    /// Directory served at /static.
    #[arg(long, env = "ANKONA_STATIC_DIR", default_value = "static")]
    static_dir: PathBuf,

    /// Page served at /.
    #[arg(long, env = "ANKONA_LANDING_PAGE", default_value = "static/ai_legal_converter.html")]
    landing_page: PathBuf,

    /// Largest accepted request body, in MiB.
    #[arg(long, env = "ANKONA_MAX_UPLOAD_MB", default_value_t = 20)]
    max_upload_mb: usize,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    #[command(flatten)]
    model: ModelArgs,

    /// Scanned case file (PDF).
    input: PathBuf,

    /// Where to write the DOCX. Default: `<stem>_Translated.docx` next to
    /// the current directory.
    #[arg(short, long, env = "ANKONA_OUTPUT")]
    output: Option<PathBuf>,

    /// Also print the final Markdown to stdout.
    #[arg(long)]
    markdown: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "ANKONA_NO_PROGRESS")]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback a one-off conversion needs, so
    // INFO logs are suppressed while it is shown.
    let spinner = matches!(&cli.command, Command::Convert(args) if !args.no_progress) && !cli.quiet;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || spinner {
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
        Command::Serve(args) => run_serve(args).await,
        Command::Convert(args) => run_convert(args, spinner, cli.quiet).await,
        Command::Extract { input } => run_extract(input).await,
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = apply_model_args(ServiceConfig::builder(), &args.model)
        .output_dir(&args.output_dir)
        .persist_output(!args.no_persist)
        .static_dir(&args.static_dir)
        .landing_page(&args.landing_page)
        .max_upload_bytes(args.max_upload_mb.saturating_mul(1024 * 1024))
        .build()
        .context("Invalid configuration")?;

    let addr = SocketAddr::new(args.host, args.port);
    serve(addr, AppState::new(config))
        .await
        .context("Server failed")
}

async fn run_convert(args: ConvertArgs, show_progress: bool, quiet: bool) -> Result<()> {
    let data = tokio::fs::read(&args.input)
        .await
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let upload = CaseFileUpload::from_path(&args.input, data);

    let progress = show_progress.then(CliProgressCallback::new);
    let mut builder = apply_model_args(ServiceConfig::builder(), &args.model).persist_output(false);
    if let Some(ref cb) = progress {
        builder = builder.progress_callback(Arc::clone(cb) as ProgressCallback);
    }
    let config = builder.build().context("Invalid configuration")?;

    let model = resolve_model(&config);
    let result = convert_case_file(model.as_deref(), &upload, &config).await;
    if let Some(ref cb) = progress {
        cb.finish();
    }
    let doc = result.context("Conversion failed")?;

    let output_path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&doc.filename));
    write_atomic(&output_path, &doc.docx)
        .await
        .context("Failed to write output")?;

    if args.markdown {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(doc.markdown.as_bytes())
            .and_then(|_| handle.write_all(b"\n"))
            .context("Failed to write to stdout")?;
    }

    if !quiet {
        eprintln!(
            "{}  {}  {}ms  →  {}",
            if doc.refined { green("✔") } else { yellow("⚠") },
            if doc.refined { "refined" } else { "draft only" },
            doc.stats.total_ms,
            bold(&output_path.display().to_string()),
        );
    }
    Ok(())
}

async fn run_extract(input: PathBuf) -> Result<()> {
    let bytes = tokio::fs::read(&input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let markup = extract_markup(&bytes);
    if markup.is_empty() {
        anyhow::bail!("No text could be extracted from {}", input.display());
    }
    println!("{markup}");
    Ok(())
}

/// Map the shared model flags onto the builder.
fn apply_model_args(
    mut builder: ankona::ServiceConfigBuilder,
    args: &ModelArgs,
) -> ankona::ServiceConfigBuilder {
    if let Some(key) = args.api_key.clone().or_else(api_key_from_env) {
        builder = builder.api_key(key);
    }
    if let Some(ref url) = args.api_base_url {
        builder = builder.api_base_url(url);
    }
    if let Some(ref m) = args.structured_model {
        builder = builder.structured_model(m);
    }
    if let Some(ref m) = args.document_model {
        builder = builder.document_model(m);
    }
    builder.style_reference(&args.style_reference)
}
