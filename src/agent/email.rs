use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::context::prompt::{self, Persona};
use crate::core::config::Settings;
use crate::core::errors::ApiError;
use crate::llm::{LlmProvider, OpenAiCompatibleProvider};
use crate::rag::context_builder::{self, SourceRef};
use crate::rag::grounding::{self, GroundingReport};
use crate::rag::{ChunkSearchResult, RagStore, SqliteRagStore};

/// Model names and retrieval width for a chain.
#[derive(Debug, Clone)]
pub struct ChainOptions {
    pub chat_model: String,
    pub embedding_model: String,
    pub retrieval_k: usize,
    pub persona: Persona,
}

impl ChainOptions {
    pub fn from_settings(settings: &Settings, persona: &Persona) -> Self {
        Self {
            chat_model: settings.groq_model_name.clone(),
            embedding_model: settings.embedding_model_name.clone(),
            retrieval_k: settings.retrieval_k,
            persona: persona.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftedReply {
    /// Model output, verbatim.
    pub reply: String,
    pub sources: Vec<SourceRef>,
    pub grounding: GroundingReport,
}

/// Where retrieval reads chunks from.
enum IndexSource {
    /// A store owned for the chain's lifetime.
    Fixed(Arc<dyn RagStore>),
    /// An on-disk index, opened per invocation so a re-ingest takes effect
    /// on the next email.
    Directory(PathBuf),
}

/// Retrieve → prompt → generate pipeline over a prebuilt index.
///
/// Built once by the front-end and reused for every email; each invocation is
/// independent.
pub struct EmailReplyChain {
    index: IndexSource,
    embedder: Arc<dyn LlmProvider>,
    chat: Arc<dyn LlmProvider>,
    options: ChainOptions,
    system_prompt: String,
    fallback: String,
}

impl EmailReplyChain {
    /// Opens the index and creates the HTTP providers.
    ///
    /// Fails with `NotFound` when the index has not been built and with
    /// `Config` when no chat credential is set; neither case contacts a
    /// backend.
    pub async fn build(settings: &Settings, persona: &Persona) -> Result<Self, ApiError> {
        let index_dir = settings.index_dir();
        if !SqliteRagStore::exists(index_dir) {
            return Err(ApiError::NotFound(format!(
                "Vector store not found at {}. Run the ingest command first.",
                index_dir.display()
            )));
        }

        if !settings.has_credential() {
            return Err(ApiError::Config(
                "GROQ_API_KEY is not set. Set it in the environment or the config file."
                    .to_string(),
            ));
        }

        let store = SqliteRagStore::open_read_only(index_dir).await?;
        let built_with = store.embedding_model().await;
        store.close().await;
        match built_with? {
            Some(built_with) if built_with != settings.embedding_model_name => {
                tracing::warn!(
                    index_model = %built_with,
                    query_model = %settings.embedding_model_name,
                    "Index was built with a different embedding model; re-run ingest"
                );
            }
            _ => {}
        }

        let embedder = OpenAiCompatibleProvider::new(
            "embeddings",
            &settings.embedding_base_url,
            settings.embedding_api_key(),
        );
        let chat = OpenAiCompatibleProvider::new(
            "groq",
            &settings.groq_base_url,
            Some(settings.groq_api_key.as_str()),
        );

        tracing::info!(
            index = %index_dir.display(),
            chat_model = %settings.groq_model_name,
            embedding_model = %settings.embedding_model_name,
            k = settings.retrieval_k,
            "Email reply chain ready"
        );

        Ok(Self::from_index_dir(
            index_dir,
            Arc::new(embedder),
            Arc::new(chat),
            ChainOptions::from_settings(settings, persona),
        ))
    }

    /// Chain over a fixed store.
    pub fn from_parts(
        store: Arc<dyn RagStore>,
        embedder: Arc<dyn LlmProvider>,
        chat: Arc<dyn LlmProvider>,
        options: ChainOptions,
    ) -> Self {
        Self::assemble(IndexSource::Fixed(store), embedder, chat, options)
    }

    /// Chain that reopens the index in `index_dir` for every invocation.
    pub fn from_index_dir(
        index_dir: impl Into<PathBuf>,
        embedder: Arc<dyn LlmProvider>,
        chat: Arc<dyn LlmProvider>,
        options: ChainOptions,
    ) -> Self {
        Self::assemble(IndexSource::Directory(index_dir.into()), embedder, chat, options)
    }

    fn assemble(
        index: IndexSource,
        embedder: Arc<dyn LlmProvider>,
        chat: Arc<dyn LlmProvider>,
        options: ChainOptions,
    ) -> Self {
        let system_prompt = prompt::build_system_prompt(&options.persona);
        let fallback = prompt::fallback_message(&options.persona);
        Self {
            index,
            embedder,
            chat,
            options,
            system_prompt,
            fallback,
        }
    }

    pub fn options(&self) -> &ChainOptions {
        &self.options
    }

    pub fn fallback_message(&self) -> &str {
        &self.fallback
    }

    pub async fn invoke(&self, email: &str) -> Result<DraftedReply, ApiError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ApiError::BadRequest("Email text is empty.".to_string()));
        }

        let query = self
            .embedder
            .embed(&[email.to_string()], &self.options.embedding_model)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Upstream("Embedding service returned no vector".to_string()))?;

        let hits = self.retrieve(&query).await?;
        let context = context_builder::format_context(&hits);
        tracing::debug!(retrieved = hits.len(), context_chars = context.chars().count(), "Retrieved context");

        let request = prompt::build_request(&self.system_prompt, &context, email);
        let reply = self.chat.chat(request, &self.options.chat_model).await?;

        let grounding = grounding::assess(&reply, &context, &self.fallback);
        tracing::info!(
            fallback = grounding.fallback,
            context_overlap = grounding.context_overlap,
            "Drafted reply"
        );

        Ok(DraftedReply {
            reply,
            sources: context_builder::sources(&hits),
            grounding,
        })
    }

    pub async fn draft_reply(&self, email: &str) -> Result<String, ApiError> {
        self.invoke(email).await.map(|drafted| drafted.reply)
    }

    async fn retrieve(&self, query: &[f32]) -> Result<Vec<ChunkSearchResult>, ApiError> {
        let k = self.options.retrieval_k;
        match &self.index {
            IndexSource::Fixed(store) => store.search(query, k).await,
            IndexSource::Directory(dir) => {
                let store = SqliteRagStore::open_read_only(dir).await?;
                let hits = store.search(query, k).await;
                store.close().await;
                hits
            }
        }
    }
}
