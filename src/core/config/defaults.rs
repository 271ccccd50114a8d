//! Built-in configuration values, used when neither the YAML file nor the
//! environment provides one.

pub const GROQ_MODEL_NAME: &str = "llama-3.1-8b-instant";
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

pub const EMBEDDING_MODEL_NAME: &str = "sentence-transformers/all-mpnet-base-v2";
// any OpenAI-compatible /embeddings server (LM Studio, TEI, Ollama, ...)
pub const EMBEDDING_BASE_URL: &str = "http://localhost:1234/v1";

pub const KB_PATH: &str = "Referral & Client Engagement Policy – Internal Knowledge Base (v1.0).txt";
pub const VECTORDB_PATH: &str = "data/vector_index";

pub const RETRIEVAL_K: usize = 4;
pub const CHUNK_SIZE: usize = 800;
pub const CHUNK_OVERLAP: usize = 150;

pub const SIGNER_NAME: &str = "Raghav Kankane";
pub const COMPANY_NAME: &str = "mystockbrokers Pvt Ltd";
pub const FIRM_DESCRIPTION: &str = "an Indian stock broking firm";

pub const HOST: &str = "127.0.0.1";
pub const PORT: u16 = 8501;
