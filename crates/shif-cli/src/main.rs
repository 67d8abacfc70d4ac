mod display;
mod pipeline;

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use shif_ai::{Classify, HttpClassifier, http::DEFAULT_MODEL};
use shif_core::AnalyzerConfig;
use shif_store::ReportFormat;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shif", version, about = "SHIF benefits tariff analyzer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract rules from a tariff document and report contradictions and gaps.
    Analyze {
        /// Tariff document (PDF, or plain text with form-feed page breaks).
        input: PathBuf,
        /// Output directory for report tables and summary.json.
        #[arg(short, long, default_value = "reports")]
        out: PathBuf,
        /// Reference data and thresholds (JSON). Defaults to the built-in set.
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
        /// Base URL of the classifier API. Refinement is skipped when unset.
        #[arg(long, env = "SHIF_CLASSIFIER_URL")]
        classifier_url: Option<String>,
        #[arg(long, env = "SHIF_CLASSIFIER_MODEL", default_value = DEFAULT_MODEL)]
        classifier_model: String,
        #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
    /// Inspect analyzer configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Load and validate a config file.
    Check { path: PathBuf },
    /// Print the built-in config as JSON.
    Default,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Parquet,
    All,
}

impl From<OutputFormat> for ReportFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Csv => ReportFormat::Csv,
            OutputFormat::Parquet => ReportFormat::Parquet,
            OutputFormat::All => ReportFormat::All,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
    tracing::debug!("shif v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze {
            input,
            out,
            config,
            format,
            classifier_url,
            classifier_model,
            api_key,
        } => {
            let config = match &config {
                Some(path) => AnalyzerConfig::load(path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => AnalyzerConfig::builtin()?,
            };

            let classifier = match classifier_url {
                Some(url) => {
                    let Some(key) = api_key else {
                        bail!("--classifier-url needs an API key (--api-key or ANTHROPIC_API_KEY)");
                    };
                    let classifier = HttpClassifier::new(&url, key, classifier_model);
                    tracing::info!(url = %url, model = classifier.model(), "classifier enabled");
                    Some(classifier)
                }
                None => None,
            };

            let stats = pipeline::run_analyze_pipeline(
                &input,
                &out,
                &config,
                format.into(),
                classifier.as_ref().map(|c| c as &dyn Classify),
            )
            .await?;

            display::print_summary(&stats.summary, stats.refine.as_ref(), &stats.written);
            display::print_warnings(&stats.warnings);
            eprintln!("  Done in {:.1}s", stats.elapsed_secs);
        }
        Commands::Config { action } => match action {
            ConfigAction::Check { path } => {
                let config = AnalyzerConfig::load(&path)
                    .with_context(|| format!("loading config {}", path.display()))?;
                println!(
                    "OK: {} ({} diseases, {} expected services, {} facility minimums)",
                    path.display(),
                    config.diseases.len(),
                    config.expected_services.len(),
                    config.facility_minimums.len()
                );
            }
            ConfigAction::Default => {
                println!("{}", AnalyzerConfig::builtin()?.to_json_pretty()?);
            }
        },
    }

    Ok(())
}
