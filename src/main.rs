use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use figref::export::JsonExporter;
use figref::ocr::bridge::TesseractBridge;
use figref::oracle::openai::OpenAiOracle;
use figref::pipeline::{annotate_figure, PipelineConfig};

/// Label the numbered callouts in a patent figure
#[derive(Parser, Debug)]
#[command(name = "figref")]
#[command(version, about = "Resolve patent-figure reference numerals to component names", long_about = None)]
struct Cli {
    /// Path to the figure image (PNG/JPG)
    #[arg(long)]
    image: PathBuf,

    /// Claims or specification text used to derive the naming vocabulary
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Output JSON path
    #[arg(long, default_value = "components.json")]
    out: PathBuf,

    /// Confidence threshold below which names degrade to "unknown"
    #[arg(long, default_value_t = 0.5)]
    conf: f64,

    /// Maximum concurrent oracle calls
    #[arg(long, default_value_t = 4)]
    workers: usize,

    /// Vision model used for per-numeral naming
    #[arg(long, default_value = "gpt-4o")]
    model: String,

    /// Text model used for vocabulary extraction
    #[arg(long, default_value = "gpt-4o-mini")]
    text_model: String,

    /// Per-call timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,

    /// Working directory for OCR intermediates
    #[arg(long, default_value = "figref_work")]
    work_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Input absence is the only fatal condition; check it up front.
    if !cli.image.is_file() {
        anyhow::bail!("figure image does not exist: {}", cli.image.display());
    }
    if let Some(reference) = &cli.reference {
        if !reference.is_file() {
            anyhow::bail!("reference text does not exist: {}", reference.display());
        }
    }
    if !(0.0..=1.0).contains(&cli.conf) {
        anyhow::bail!("--conf must be in [0, 1], got {}", cli.conf);
    }

    let api_key =
        std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY environment variable is not set")?;
    let oracle = OpenAiOracle::new(
        api_key,
        cli.model,
        cli.text_model,
        Duration::from_secs(cli.timeout_secs),
    )?;
    let ocr = TesseractBridge::new(cli.work_dir);

    let config = PipelineConfig {
        image: cli.image,
        reference_text: cli.reference,
        output: cli.out,
        confidence_threshold: cli.conf,
        workers: cli.workers,
    };

    let result = annotate_figure(&config, &ocr, &oracle)?;
    JsonExporter::new(config.output.clone()).export(&result)?;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
