//! Ingestion and reply drafting against mocked embedding and chat endpoints.

use std::path::Path;

use email_rag_agent::agent::EmailReplyChain;
use email_rag_agent::context::prompt::fallback_message;
use email_rag_agent::core::config::Settings;
use email_rag_agent::core::errors::ApiError;
use email_rag_agent::llm::OpenAiCompatibleProvider;
use email_rag_agent::rag::{ingest_file, RagStore, SqliteRagStore};
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::{json, Value};

const KB: &str = "Referral fee: the referral fee is 2% of the transaction value, credited monthly.\n\n\
Account closure: accounts are closed within 7 working days of a signed closure request.\n\n\
KYC: clients must complete KYC with PAN and address proof before trading.";

fn hash_embedding(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0_f32; 128];
    for token in text
        .split(|c: char| !(c.is_alphanumeric() || c == '%'))
        .filter(|t| !t.is_empty())
    {
        let hash = token
            .to_lowercase()
            .bytes()
            .fold(5381_u64, |h, b| h.wrapping_mul(33) ^ b as u64);
        vector[(hash % 128) as usize] += 1.0;
    }
    vector
}

fn embeddings_body(request: &mockito::Request) -> Vec<u8> {
    let payload: Value = serde_json::from_slice(request.body().unwrap()).unwrap();
    let data: Vec<Value> = payload["input"]
        .as_array()
        .unwrap()
        .iter()
        .enumerate()
        .map(|(index, text)| {
            json!({ "index": index, "embedding": hash_embedding(text.as_str().unwrap()) })
        })
        .collect();
    json!({ "data": data }).to_string().into_bytes()
}

async fn mock_embeddings(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", "/embeddings")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body_from_request(embeddings_body)
        .create_async()
        .await
}

fn chat_body(content: &str) -> String {
    json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] }).to_string()
}

fn settings_for(dir: &Path, server_url: &str) -> Settings {
    let kb_path = dir.join("policy.txt");
    std::fs::write(&kb_path, KB).unwrap();
    Settings {
        groq_api_key: "gsk_test".to_string(),
        groq_base_url: server_url.to_string(),
        embedding_base_url: server_url.to_string(),
        embedding_model_name: "all-mpnet-base-v2".to_string(),
        kb_path,
        vectordb_path: dir.join("data").join("vector_index"),
        chunk_size: 100,
        chunk_overlap: 10,
        ..Default::default()
    }
}

async fn ingest(settings: &Settings) -> usize {
    let embedder = OpenAiCompatibleProvider::new(
        "embeddings",
        &settings.embedding_base_url,
        settings.embedding_api_key(),
    );
    ingest_file(settings, &embedder).await.unwrap().chunk_count
}

#[tokio::test]
async fn referral_fee_email_is_answered_from_the_knowledge_base() {
    let mut server = mockito::Server::new_async().await;
    let _embeddings = mock_embeddings(&mut server).await;
    let chat = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer gsk_test")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({ "model": "llama-3.1-8b-instant", "temperature": 0.0 })),
            Matcher::Regex("2% of the transaction value".to_string()),
        ]))
        .with_status(200)
        .with_body(chat_body(
            "Dear Client,\n\nThe referral fee is 2% of the transaction value.\n\nBest regards",
        ))
        .expect(1)
        .create_async()
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let settings = settings_for(tmp.path(), &server.url());
    assert_eq!(ingest(&settings).await, 3);

    let chain = EmailReplyChain::build(&settings, &settings.persona())
        .await
        .unwrap();
    let drafted = chain
        .invoke("Hello, what is the referral fee on a transaction?")
        .await
        .unwrap();

    assert!(drafted.reply.contains("2%"));
    assert!(!drafted.grounding.fallback);
    assert_eq!(drafted.sources.len(), 3);
    assert_eq!(drafted.sources[0].chunk_index, 0);
    chat.assert_async().await;
}

#[tokio::test]
async fn uncovered_email_gets_the_fallback_verbatim() {
    let mut server = mockito::Server::new_async().await;
    let _embeddings = mock_embeddings(&mut server).await;

    let tmp = tempfile::tempdir().unwrap();
    let settings = settings_for(tmp.path(), &server.url());
    let fallback = fallback_message(&settings.persona());
    let _chat = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(chat_body(&fallback))
        .create_async()
        .await;

    ingest(&settings).await;
    let chain = EmailReplyChain::build(&settings, &settings.persona())
        .await
        .unwrap();

    let reply = chain
        .draft_reply("Which mutual fund should I buy for guaranteed returns?")
        .await
        .unwrap();
    assert_eq!(reply, fallback);
}

#[tokio::test]
async fn reingesting_replaces_the_index() {
    let mut server = mockito::Server::new_async().await;
    let _embeddings = mock_embeddings(&mut server).await;

    let tmp = tempfile::tempdir().unwrap();
    let settings = settings_for(tmp.path(), &server.url());
    assert_eq!(ingest(&settings).await, 3);

    std::fs::write(&settings.kb_path, "Brokerage is a flat fee per executed order.").unwrap();
    assert_eq!(ingest(&settings).await, 1);

    let store = SqliteRagStore::open_read_only(settings.index_dir()).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn missing_index_fails_without_contacting_backends() {
    let mut server = mockito::Server::new_async().await;
    let embeddings = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let settings = settings_for(tmp.path(), &server.url());

    let err = EmailReplyChain::build(&settings, &settings.persona())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, ApiError::NotFound(_)));
    embeddings.assert_async().await;
}

#[tokio::test]
async fn chat_backend_failure_propagates_as_upstream() {
    let mut server = mockito::Server::new_async().await;
    let _embeddings = mock_embeddings(&mut server).await;
    let _chat = server
        .mock("POST", "/chat/completions")
        .with_status(503)
        .with_body("over capacity")
        .create_async()
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let settings = settings_for(tmp.path(), &server.url());
    ingest(&settings).await;
    let chain = EmailReplyChain::build(&settings, &settings.persona())
        .await
        .unwrap();

    let err = chain.draft_reply("What is the referral fee?").await.unwrap_err();
    match err {
        ApiError::Upstream(msg) => assert!(msg.contains("503")),
        other => panic!("expected upstream error, got {:?}", other),
    }
}
