use std::sync::Arc;

use axum::extract::State;
use axum::{Form, Json};
use maud::Markup;
use serde::{Deserialize, Serialize};

use crate::agent::DraftedReply;
use crate::core::errors::ApiError;
use crate::rag::context_builder::SourceRef;
use crate::server::page::{self, Banner, BannerLevel, PageView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReplyForm {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub reply: String,
    pub fallback: bool,
    pub context_overlap: f32,
    pub sources: Vec<SourceRef>,
}

impl From<DraftedReply> for ReplyResponse {
    fn from(drafted: DraftedReply) -> Self {
        Self {
            reply: drafted.reply,
            fallback: drafted.grounding.fallback,
            context_overlap: drafted.grounding.context_overlap,
            sources: drafted.sources,
        }
    }
}

pub async fn index(State(state): State<Arc<AppState>>) -> Markup {
    page::render(&state, &PageView::default())
}

pub async fn submit(State(state): State<Arc<AppState>>, Form(form): Form<ReplyForm>) -> Markup {
    let mut view = PageView {
        email: form.email,
        ..Default::default()
    };

    match generate(&state, &view.email).await {
        Ok(drafted) => view.reply = Some(drafted.reply),
        Err(err) => {
            tracing::warn!(kind = err.kind(), "Reply generation failed: {}", err.message());
            view.banner = Some(banner_for(&err));
        }
    }

    page::render(&state, &view)
}

pub async fn api_reply(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReplyRequest>,
) -> Result<Json<ReplyResponse>, ApiError> {
    let drafted = generate(&state, &request.email).await?;
    Ok(Json(drafted.into()))
}

/// Empty input is reported before the chain's own state.
async fn generate(state: &AppState, email: &str) -> Result<DraftedReply, ApiError> {
    if email.trim().is_empty() {
        return Err(ApiError::BadRequest("Email text is empty.".to_string()));
    }
    let chain = state.chain().await?;
    chain.invoke(email).await
}

fn banner_for(err: &ApiError) -> Banner {
    match err {
        ApiError::BadRequest(_) => Banner {
            level: BannerLevel::Warning,
            text: "Please paste a client email first.".to_string(),
        },
        ApiError::NotFound(_) => Banner {
            level: BannerLevel::Error,
            text: "The vector index could not be found. Please run the ingest command once to build it."
                .to_string(),
        },
        ApiError::Config(msg) => Banner {
            level: BannerLevel::Error,
            text: msg.clone(),
        },
        other => Banner {
            level: BannerLevel::Error,
            text: format!(
                "Something went wrong while generating the reply: {}",
                other.message()
            ),
        },
    }
}
