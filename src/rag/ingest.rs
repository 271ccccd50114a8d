//! Knowledge-base ingestion: read → split → embed → persist.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::engine::{RAGEngine, TextChunk};
use super::sqlite::SqliteRagStore;
use super::store::{RagStore, StoredChunk};
use crate::core::config::Settings;
use crate::core::errors::ApiError;
use crate::llm::provider::LlmProvider;

/// Inputs per embeddings request.
pub const EMBED_BATCH_SIZE: usize = 32;

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub chunk_count: usize,
    pub index_dir: PathBuf,
    pub embedding_model: String,
}

/// Builds the index described by `settings`, replacing any existing one.
pub async fn ingest_file(
    settings: &Settings,
    embedder: &dyn LlmProvider,
) -> Result<IngestReport, ApiError> {
    let splitter = RAGEngine::with_sizes(settings.chunk_size, settings.chunk_overlap)?;
    build_vector_store(
        settings.kb_path(),
        settings.index_dir(),
        &splitter,
        embedder,
        &settings.embedding_model_name,
    )
    .await
}

pub async fn build_vector_store(
    kb_path: &Path,
    index_dir: &Path,
    splitter: &RAGEngine,
    embedder: &dyn LlmProvider,
    embedding_model: &str,
) -> Result<IngestReport, ApiError> {
    let text = read_knowledge_base(kb_path).await?;
    let source = kb_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| kb_path.display().to_string());

    let chunks = splitter.collect_from_text(&text, &source);
    if chunks.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Knowledge base file {} has no text to index",
            kb_path.display()
        )));
    }
    tracing::info!(
        chunks = chunks.len(),
        chunk_size = splitter.config().chunk_size,
        chunk_overlap = splitter.config().chunk_overlap,
        "Split knowledge base"
    );

    let embeddings = embed_chunks(&chunks, embedder, embedding_model).await?;

    let staging = staging_dir(index_dir).await?;
    let result = write_index(&staging, &chunks, embeddings, embedding_model).await;
    if let Err(err) = result {
        let _ = tokio::fs::remove_dir_all(&staging).await;
        return Err(err);
    }
    swap_in(&staging, index_dir).await?;

    tracing::info!(
        chunks = chunks.len(),
        index = %index_dir.display(),
        model = embedding_model,
        "Vector store built"
    );

    Ok(IngestReport {
        chunk_count: chunks.len(),
        index_dir: index_dir.to_path_buf(),
        embedding_model: embedding_model.to_string(),
    })
}

async fn read_knowledge_base(kb_path: &Path) -> Result<String, ApiError> {
    if !kb_path.is_file() {
        return Err(ApiError::NotFound(format!(
            "Knowledge base file not found: {}",
            kb_path.display()
        )));
    }
    tokio::fs::read_to_string(kb_path).await.map_err(|e| {
        ApiError::Internal(format!("Cannot read {}: {}", kb_path.display(), e))
    })
}

async fn embed_chunks(
    chunks: &[TextChunk],
    embedder: &dyn LlmProvider,
    embedding_model: &str,
) -> Result<Vec<Vec<f32>>, ApiError> {
    let mut embeddings = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(EMBED_BATCH_SIZE) {
        let inputs: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed(&inputs, embedding_model).await?;
        tracing::debug!(done = embeddings.len() + vectors.len(), total = chunks.len(), "Embedded batch");
        embeddings.extend(vectors);
    }
    Ok(embeddings)
}

async fn write_index(
    dir: &Path,
    chunks: &[TextChunk],
    embeddings: Vec<Vec<f32>>,
    embedding_model: &str,
) -> Result<(), ApiError> {
    let store = SqliteRagStore::create(dir, embedding_model).await?;

    let items = chunks
        .iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| {
            let stored = StoredChunk {
                chunk_id: format!("{}#{}", chunk.source, chunk.chunk_index),
                content: chunk.text.clone(),
                source: chunk.source.clone(),
                chunk_index: chunk.chunk_index,
                start_offset: chunk.start_offset,
            };
            (stored, embedding)
        })
        .collect();

    let inserted = store.insert_batch(items).await;
    store.close().await;
    inserted
}

async fn staging_dir(index_dir: &Path) -> Result<PathBuf, ApiError> {
    let parent = index_parent(index_dir);
    tokio::fs::create_dir_all(&parent).await.map_err(|e| {
        ApiError::Internal(format!("Cannot create {}: {}", parent.display(), e))
    })?;
    sibling(index_dir, "staging")
}

fn index_parent(index_dir: &Path) -> PathBuf {
    match index_dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Hidden sibling of `index_dir`, e.g. `.vector_index.staging-<uuid>`.
fn sibling(index_dir: &Path, tag: &str) -> Result<PathBuf, ApiError> {
    let name = index_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ApiError::Config(format!(
                "Index path {} must name a directory",
                index_dir.display()
            ))
        })?;
    Ok(index_parent(index_dir).join(format!(".{}.{}-{}", name, tag, uuid::Uuid::new_v4())))
}

/// Moves the previous index aside, renames staging into place, then deletes
/// the previous index. A failed rename restores the previous index.
async fn swap_in(staging: &Path, index_dir: &Path) -> Result<(), ApiError> {
    let previous = if tokio::fs::try_exists(index_dir).await.unwrap_or(false) {
        let aside = sibling(index_dir, "previous")?;
        tokio::fs::rename(index_dir, &aside).await.map_err(|e| {
            ApiError::Internal(format!(
                "Cannot move previous index {} aside: {}",
                index_dir.display(),
                e
            ))
        })?;
        Some(aside)
    } else {
        None
    };

    if let Err(e) = tokio::fs::rename(staging, index_dir).await {
        if let Some(aside) = &previous {
            if let Err(restore) = tokio::fs::rename(aside, index_dir).await {
                tracing::error!(
                    previous = %aside.display(),
                    "Cannot restore previous index: {}",
                    restore
                );
            }
        }
        let _ = tokio::fs::remove_dir_all(staging).await;
        return Err(ApiError::Internal(format!(
            "Cannot move new index into {}: {}",
            index_dir.display(),
            e
        )));
    }

    if let Some(aside) = previous {
        if let Err(e) = tokio::fs::remove_dir_all(&aside).await {
            tracing::warn!(previous = %aside.display(), "Cannot remove previous index: {}", e);
        }
    }
    Ok(())
}
