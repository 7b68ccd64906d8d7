use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use idea_validator::pipeline::PipelineContext;
use idea_validator::{cli, server, transcribe};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();
    let config = args.into_config()?;

    let default_level = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    config.validate()?;
    tracing::info!(
        "🔧 LLM: {} / {}，竞品并发上限 {}",
        config.llm.provider,
        config.llm.model,
        config.discovery.max_concurrency
    );

    let transcriber = transcribe::from_config(&config.transcription)?;
    let context = PipelineContext::new(config)?;

    server::serve(context, transcriber).await
}
