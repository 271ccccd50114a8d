use serde_json::{Map, Value};

use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    validate_u64_field(root, "retrieval_k", 1, 100)?;
    validate_u64_field(root, "chunk_size", 1, 1_000_000)?;
    validate_u64_field(root, "chunk_overlap", 0, 1_000_000)?;
    validate_u64_field(root, "port", 0, 65_535)?;

    let chunk_size = root.get("chunk_size").and_then(Value::as_u64);
    let chunk_overlap = root.get("chunk_overlap").and_then(Value::as_u64);
    if let (Some(size), Some(overlap)) = (chunk_size, chunk_overlap) {
        if overlap >= size {
            return Err(ApiError::Config(format!(
                "Invalid config: chunk_overlap ({}) must be smaller than chunk_size ({})",
                overlap, size
            )));
        }
    }

    for key in [
        "groq_model_name",
        "embedding_model_name",
        "kb_path",
        "vectordb_path",
        "signer_name",
        "company_name",
        "host",
    ] {
        validate_required_string_field(root, key)?;
    }

    for key in ["groq_base_url", "embedding_base_url"] {
        validate_url_field(root, key)?;
    }

    for key in ["groq_api_key", "embedding_api_key", "firm_description"] {
        validate_optional_string_field(root, key)?;
    }

    if let Some(log_dir) = root.get("log_dir") {
        if !log_dir.is_null() && !log_dir.is_string() {
            return Err(config_type_error("log_dir", "string"));
        }
    }

    Ok(())
}

fn validate_u64_field(
    section: &Map<String, Value>,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(key, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::Config(format!(
            "Invalid config at '{}': must be between {} and {}",
            key, min, max
        )));
    }
    Ok(())
}

fn validate_required_string_field(section: &Map<String, Value>, key: &str) -> Result<(), ApiError> {
    let value = section.get(key).ok_or_else(|| {
        ApiError::Config(format!("Invalid config at '{}': value is required", key))
    })?;
    let Some(text) = value.as_str() else {
        return Err(config_type_error(key, "string"));
    };
    if text.trim().is_empty() {
        return Err(ApiError::Config(format!(
            "Invalid config at '{}': value cannot be empty",
            key
        )));
    }
    Ok(())
}

fn validate_optional_string_field(section: &Map<String, Value>, key: &str) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_str().is_none() {
        return Err(config_type_error(key, "string"));
    }
    Ok(())
}

fn validate_url_field(section: &Map<String, Value>, key: &str) -> Result<(), ApiError> {
    validate_required_string_field(section, key)?;
    let url = section.get(key).and_then(Value::as_str).unwrap_or_default();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ApiError::Config(format!(
            "Invalid config at '{}': '{}' is not an http(s) URL",
            key, url
        )));
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::Config(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Settings;
    use serde_json::json;

    fn default_value() -> Value {
        serde_json::to_value(Settings::default()).unwrap()
    }

    #[test]
    fn defaults_are_valid() {
        validate_config(&default_value()).expect("defaults should validate");
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk_size() {
        let mut config = default_value();
        config["chunk_overlap"] = json!(800);
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ApiError::Config(msg) if msg.contains("chunk_overlap")));
    }

    #[test]
    fn base_urls_need_a_scheme() {
        let mut config = default_value();
        config["groq_base_url"] = json!("api.groq.com/openai/v1");
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn empty_model_name_is_rejected() {
        let mut config = default_value();
        config["embedding_model_name"] = json!("  ");
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn retrieval_k_upper_bound() {
        let mut config = default_value();
        config["retrieval_k"] = json!(101);
        assert!(validate_config(&config).is_err());
        config["retrieval_k"] = json!(100);
        assert!(validate_config(&config).is_ok());
    }
}
