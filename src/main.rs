use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use llm_interface::{parse_json, FallbackOrchestrator, GeminiBackend};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use threadsift::SourceRouter;
use threadsift_core::AppConfig;
use tracing_subscriber::EnvFilter;
use youtube_client::QuotaCounter;

#[derive(Parser)]
#[command(name = "threadsift")]
#[command(about = "Distil Reddit threads and YouTube comment sections for LLM analysis")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract valuable comments from Reddit posts or YouTube videos
    Extract {
        /// Post or video URLs
        #[arg(required = true)]
        urls: Vec<String>,

        /// URLs extracted concurrently per chunk
        #[arg(long, env = "THREADSIFT_CHUNK_SIZE")]
        chunk_size: Option<usize>,
    },

    /// Run a prompt through the model fallback chain
    Analyze {
        /// File holding the prompt text
        #[arg(long)]
        prompt_file: PathBuf,

        /// Try this model before the configured chain
        #[arg(long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("threadsift=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load().context("failed to load configuration")?;

    match cli.command {
        Commands::Extract { urls, chunk_size } => {
            if let Some(chunk_size) = chunk_size {
                config.batch.chunk_size = chunk_size;
                config.validate()?;
            }

            let quota = Arc::new(QuotaCounter::new(config.youtube.daily_quota));
            let router = SourceRouter::from_config(&config, quota)?;
            let outcome = router.batch_extract(&urls, &config.batch).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Analyze { prompt_file, model } => {
            let prompt = std::fs::read_to_string(&prompt_file)
                .with_context(|| format!("failed to read {}", prompt_file.display()))?;

            let backend = Arc::new(GeminiBackend::from_config(&config.llm)?);
            let orchestrator = FallbackOrchestrator::new(backend, config.llm.clone());
            let result = match model {
                Some(model) => orchestrator.analyze_with_model(&prompt, &model).await,
                None => orchestrator.analyze(&prompt).await,
            };

            let parsed = result.analysis.as_deref().and_then(parse_json);
            let output = json!({ "result": result, "parsed": parsed });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
