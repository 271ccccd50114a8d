use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::defaults;
use super::service::redact_sensitive_values;
use crate::context::prompt::Persona;

/// Process-wide settings, loaded once at startup and passed explicitly to
/// every constructor that needs them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub groq_api_key: String,
    pub groq_model_name: String,
    pub groq_base_url: String,
    pub embedding_model_name: String,
    pub embedding_base_url: String,
    pub embedding_api_key: String,
    pub kb_path: PathBuf,
    pub vectordb_path: PathBuf,
    pub retrieval_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub signer_name: String,
    pub company_name: String,
    pub firm_description: String,
    pub host: String,
    pub port: u16,
    pub log_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            groq_api_key: String::new(),
            groq_model_name: defaults::GROQ_MODEL_NAME.to_string(),
            groq_base_url: defaults::GROQ_BASE_URL.to_string(),
            embedding_model_name: defaults::EMBEDDING_MODEL_NAME.to_string(),
            embedding_base_url: defaults::EMBEDDING_BASE_URL.to_string(),
            embedding_api_key: String::new(),
            kb_path: PathBuf::from(defaults::KB_PATH),
            vectordb_path: PathBuf::from(defaults::VECTORDB_PATH),
            retrieval_k: defaults::RETRIEVAL_K,
            chunk_size: defaults::CHUNK_SIZE,
            chunk_overlap: defaults::CHUNK_OVERLAP,
            signer_name: defaults::SIGNER_NAME.to_string(),
            company_name: defaults::COMPANY_NAME.to_string(),
            firm_description: defaults::FIRM_DESCRIPTION.to_string(),
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            log_dir: None,
        }
    }
}

impl Settings {
    /// Whether a model API credential is present.
    pub fn has_credential(&self) -> bool {
        !self.groq_api_key.trim().is_empty()
    }

    pub fn persona(&self) -> Persona {
        Persona {
            signer_name: self.signer_name.clone(),
            company_name: self.company_name.clone(),
            firm_description: self.firm_description.clone(),
        }
    }

    pub fn kb_path(&self) -> &Path {
        &self.kb_path
    }

    pub fn index_dir(&self) -> &Path {
        &self.vectordb_path
    }

    pub fn embedding_api_key(&self) -> Option<&str> {
        let key = self.embedding_api_key.trim();
        (!key.is_empty()).then_some(key)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// JSON view with credentials masked, safe to show on the status page.
    pub fn redacted(&self) -> Value {
        let value = serde_json::to_value(self).unwrap_or(Value::Null);
        redact_sensitive_values(&value)
    }
}
