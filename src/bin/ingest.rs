use anyhow::Context;

use email_rag_agent::core::config::{load_dotenv, ConfigService};
use email_rag_agent::llm::OpenAiCompatibleProvider;
use email_rag_agent::logging;
use email_rag_agent::rag::ingest_file;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv().context("Failed to load .env file")?;
    let settings = ConfigService::from_env()
        .load()
        .context("Failed to load configuration")?;
    logging::init(settings.log_dir.as_deref(), "ingest");

    let embedder = OpenAiCompatibleProvider::new(
        "embeddings",
        &settings.embedding_base_url,
        settings.embedding_api_key(),
    );

    let report = ingest_file(&settings, &embedder)
        .await
        .with_context(|| format!("Failed to ingest {}", settings.kb_path.display()))?;

    println!(
        "Vector store built with {} chunks at {}",
        report.chunk_count,
        report.index_dir.display()
    );
    Ok(())
}
