use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::settings::Settings;
use super::validation::validate_config;
use crate::core::errors::ApiError;

/// Names an optional YAML file whose keys mirror the `Settings` fields.
pub const CONFIG_PATH_ENV: &str = "EMAIL_RAG_CONFIG_PATH";

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 8] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "credential",
    "private_key",
    "access_key",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 3] = ["max_tokens", "token_count", "tokens"];

#[derive(Debug, Clone, Copy)]
enum EnvKind {
    Text,
    Integer,
}

/// Environment variable → settings field. Environment wins over the YAML file.
const ENV_OVERRIDES: [(&str, &str, EnvKind); 17] = [
    ("GROQ_API_KEY", "groq_api_key", EnvKind::Text),
    ("GROQ_MODEL_NAME", "groq_model_name", EnvKind::Text),
    ("GROQ_BASE_URL", "groq_base_url", EnvKind::Text),
    ("EMBEDDING_MODEL_NAME", "embedding_model_name", EnvKind::Text),
    ("EMBEDDING_BASE_URL", "embedding_base_url", EnvKind::Text),
    ("EMBEDDING_API_KEY", "embedding_api_key", EnvKind::Text),
    ("KB_PATH", "kb_path", EnvKind::Text),
    ("VECTORDB_PATH", "vectordb_path", EnvKind::Text),
    ("RETRIEVAL_K", "retrieval_k", EnvKind::Integer),
    ("CHUNK_SIZE", "chunk_size", EnvKind::Integer),
    ("CHUNK_OVERLAP", "chunk_overlap", EnvKind::Integer),
    ("SIGNER_NAME", "signer_name", EnvKind::Text),
    ("COMPANY_NAME", "company_name", EnvKind::Text),
    ("FIRM_DESCRIPTION", "firm_description", EnvKind::Text),
    ("HOST", "host", EnvKind::Text),
    ("PORT", "port", EnvKind::Integer),
    ("LOG_DIR", "log_dir", EnvKind::Text),
];

#[derive(Debug, Clone, Default)]
pub struct ConfigService {
    config_path: Option<PathBuf>,
}

impl ConfigService {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }

    pub fn from_env() -> Self {
        let config_path = env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        Self::new(config_path)
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Builds the settings: defaults, then the YAML file (if any), then the
    /// environment. The merged result is validated before it is returned.
    pub fn load(&self) -> Result<Settings, ApiError> {
        let defaults = serde_json::to_value(Settings::default()).map_err(ApiError::internal)?;
        let file_config = match &self.config_path {
            Some(path) => load_yaml_file(path)?,
            None => Value::Object(Map::new()),
        };
        let env_config = env_overrides()?;

        let merged = deep_merge(&deep_merge(&defaults, &file_config), &env_config);
        validate_config(&merged)?;

        let settings: Settings = serde_json::from_value(merged)
            .map_err(|e| ApiError::Config(format!("Invalid configuration: {}", e)))?;

        tracing::debug!(
            config_file = ?self.config_path,
            kb_path = %settings.kb_path.display(),
            index = %settings.vectordb_path.display(),
            "Configuration loaded"
        );
        Ok(settings)
    }
}

/// Loads `.env` from the working directory (or a parent) into the process
/// environment. Variables that are already set keep their values.
pub fn load_dotenv() -> Result<Option<PathBuf>, ApiError> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(err) if err.not_found() => Ok(None),
        Err(err) => Err(ApiError::Config(format!("Cannot load .env file: {}", err))),
    }
}

pub fn load_dotenv_from(path: &Path) -> Result<(), ApiError> {
    dotenvy::from_path(path)
        .map_err(|e| ApiError::Config(format!("Cannot load {}: {}", path.display(), e)))
}

fn load_yaml_file(path: &Path) -> Result<Value, ApiError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        ApiError::Config(format!("Cannot read config file {}: {}", path.display(), e))
    })?;

    let value = serde_yaml::from_str::<Value>(&contents).map_err(|e| {
        ApiError::Config(format!("Cannot parse config file {}: {}", path.display(), e))
    })?;

    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(ApiError::Config(format!(
            "Config file {} must contain a mapping",
            path.display()
        ))),
    }
}

fn env_overrides() -> Result<Value, ApiError> {
    let mut overrides = Map::new();

    for (var, key, kind) in ENV_OVERRIDES {
        let Ok(raw) = env::var(var) else {
            continue;
        };
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let value = match kind {
            EnvKind::Text => Value::String(raw.to_string()),
            EnvKind::Integer => {
                let number = raw.parse::<u64>().map_err(|_| {
                    ApiError::Config(format!("{} must be a non-negative integer, got '{}'", var, raw))
                })?;
                Value::from(number)
            }
        };
        overrides.insert(key.to_string(), value);
    }

    Ok(Value::Object(overrides))
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

pub(crate) fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}
