use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::agent::EmailReplyChain;
use crate::context::prompt::Persona;
use crate::core::config::Settings;
use crate::core::errors::ApiError;
use crate::rag::SqliteRagStore;

/// Knowledge-base readiness, as shown in the page sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KbStatus {
    Missing,
    IndexMissing,
    Ready,
}

impl KbStatus {
    pub fn probe(settings: &Settings) -> Self {
        if !settings.kb_path().is_file() {
            KbStatus::Missing
        } else if !SqliteRagStore::exists(settings.index_dir()) {
            KbStatus::IndexMissing
        } else {
            KbStatus::Ready
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            KbStatus::Missing => "Missing",
            KbStatus::IndexMissing => "KB file found, index missing",
            KbStatus::Ready => "Ready",
        }
    }
}

/// Shared state for the web front-end.
///
/// The chain is built once at startup. If that fails, the classified error is
/// kept and returned to every generate request, except that a missing index
/// is retried once the index exists on disk.
pub struct AppState {
    pub settings: Arc<Settings>,
    pub persona: Persona,
    chain: RwLock<Result<Arc<EmailReplyChain>, ApiError>>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub async fn initialize(settings: Settings) -> Arc<Self> {
        let persona = settings.persona();
        let chain = match EmailReplyChain::build(&settings, &persona).await {
            Ok(chain) => Ok(Arc::new(chain)),
            Err(err) => {
                tracing::error!(kind = err.kind(), "Failed to build email reply chain: {}", err.message());
                Err(err)
            }
        };
        Self::with_chain(settings, chain)
    }

    pub fn with_chain(
        settings: Settings,
        chain: Result<Arc<EmailReplyChain>, ApiError>,
    ) -> Arc<Self> {
        Arc::new(AppState {
            persona: settings.persona(),
            settings: Arc::new(settings),
            chain: RwLock::new(chain),
            started_at: Utc::now(),
        })
    }

    pub async fn chain(&self) -> Result<Arc<EmailReplyChain>, ApiError> {
        {
            let cached = self.chain.read().await;
            if !self.should_rebuild(&cached) {
                return cached.clone();
            }
        }

        let mut cached = self.chain.write().await;
        if self.should_rebuild(&cached) {
            tracing::info!(index = %self.settings.index_dir().display(), "Index found, building email reply chain");
            *cached = EmailReplyChain::build(&self.settings, &self.persona)
                .await
                .map(Arc::new);
        }
        cached.clone()
    }

    pub async fn chain_ready(&self) -> bool {
        self.chain().await.is_ok()
    }

    fn should_rebuild(&self, cached: &Result<Arc<EmailReplyChain>, ApiError>) -> bool {
        matches!(cached, Err(ApiError::NotFound(_)))
            && SqliteRagStore::exists(self.settings.index_dir())
    }

    pub fn kb_status(&self) -> KbStatus {
        KbStatus::probe(&self.settings)
    }
}
