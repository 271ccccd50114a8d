//! In-process providers for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::errors::ApiError;
use crate::llm::provider::LlmProvider;
use crate::llm::types::ChatRequest;

const DIMENSIONS: usize = 256;

type Responder = Box<dyn Fn(&ChatRequest) -> String + Send + Sync>;

/// Bag-of-words hashing embedder plus a scripted chat model.
pub struct FakeProvider {
    responder: Responder,
    fail_embed: bool,
    pub embed_batches: Mutex<Vec<usize>>,
    pub chat_calls: AtomicUsize,
    pub last_request: Mutex<Option<ChatRequest>>,
}

impl FakeProvider {
    pub fn replying(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::with_responder(move |_| reply.clone())
    }

    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&ChatRequest) -> String + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            fail_embed: false,
            embed_batches: Mutex::new(Vec::new()),
            chat_calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn failing_embeddings() -> Self {
        Self {
            fail_embed: true,
            ..Self::replying("")
        }
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_batches.lock().unwrap().len()
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub fn backend_calls(&self) -> usize {
        self.embed_calls() + self.chat_calls()
    }
}

/// Lowercased alphanumeric tokens hashed into a fixed-width count vector.
pub fn hash_embedding(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0_f32; DIMENSIONS];
    for token in text
        .split(|c: char| !(c.is_alphanumeric() || c == '%'))
        .filter(|t| !t.is_empty())
    {
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in token.to_lowercase().bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        vector[(hash % DIMENSIONS as u64) as usize] += 1.0;
    }
    vector
}

#[async_trait]
impl LlmProvider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, ApiError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        let reply = (self.responder)(&request);
        *self.last_request.lock().unwrap() = Some(request);
        Ok(reply)
    }

    async fn embed(&self, inputs: &[String], _model_id: &str) -> Result<Vec<Vec<f32>>, ApiError> {
        self.embed_batches.lock().unwrap().push(inputs.len());
        if self.fail_embed {
            return Err(ApiError::Upstream("embedding service unavailable".to_string()));
        }
        Ok(inputs.iter().map(|text| hash_embedding(text)).collect())
    }
}
