use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::settings::RagSettings;
use super::validation::validate_config;
use crate::core::errors::ApiError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 10] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "private_key",
    "access_key",
    "auth_",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 4] = ["max_tokens", "max_input_tokens", "tokenizer_path", "tokens"];

/// Environment variables that override config keys at startup.
const ENV_OVERRIDES: [(&str, &[&str]); 12] = [
    ("HOST", &["server", "host"]),
    ("PORT", &["server", "port"]),
    ("EMBEDDING_BASE_URL", &["embedding", "base_url"]),
    ("EMBEDDING_MODEL", &["embedding", "model"]),
    ("EMBEDDING_API_KEY", &["embedding", "api_key"]),
    ("PINECONE_API_KEY", &["vector_store", "api_key"]),
    ("PINECONE_INDEX", &["vector_store", "index_name"]),
    ("PINECONE_INDEX_HOST", &["vector_store", "index_host"]),
    ("VECTOR_STORE_PROVIDER", &["vector_store", "provider"]),
    ("LLM_BASE_URL", &["generation", "base_url"]),
    ("LLM_MODEL", &["generation", "model"]),
    ("LLM_API_KEY", &["generation", "api_key"]),
];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("NEXUSFLOW_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    /// Merges `config.yml`, `secrets.yaml` and the process environment.
    pub fn load_config(&self) -> Result<Value, ApiError> {
        let public_config = load_yaml_file(&self.config_path())?;
        let secrets_config = load_yaml_file(&self.secrets_path())?;
        let mut merged = deep_merge(&public_config, &secrets_config);
        apply_env_overrides(&mut merged, |key| env::var(key).ok());
        Ok(merged)
    }

    /// Loads, validates and types the configuration in one step.
    pub fn load_settings(&self) -> Result<(Value, RagSettings), ApiError> {
        let config = self.load_config()?;
        let settings = RagSettings::from_config(&config)?;
        Ok((config, settings))
    }
}

impl RagSettings {
    /// `null` anywhere in the tree (an empty YAML section, `host: ~`) means
    /// "use the default".
    pub fn from_config(config: &Value) -> Result<Self, ApiError> {
        validate_config(config)?;
        serde_json::from_value(strip_nulls(config))
            .map_err(|e| ApiError::BadRequest(format!("Invalid configuration: {}", e)))
    }
}

fn strip_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_nulls).collect()),
        _ => value.clone(),
    }
}

fn load_yaml_file(path: &Path) -> Result<Value, ApiError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ApiError::Internal(format!("Failed to read {}: {}", path.display(), e))
    })?;
    if contents.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let value = serde_yaml::from_str::<Value>(&contents).map_err(|e| {
        ApiError::BadRequest(format!("Failed to parse {}: {}", path.display(), e))
    })?;
    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(ApiError::BadRequest(format!(
            "{} must contain a mapping at the top level",
            path.display()
        ))),
    }
}

pub(crate) fn apply_env_overrides<F>(config: &mut Value, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if !config.is_object() {
        *config = Value::Object(Map::new());
    }

    for (var, path) in ENV_OVERRIDES {
        let Some(raw) = lookup(var) else {
            continue;
        };
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        // Numeric variables stay strings when unparsable so validation reports them.
        let value = match var {
            "PORT" => raw
                .parse::<u64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(raw.to_string())),
            _ => Value::String(raw.to_string()),
        };
        ensure_object_path(config, path, value);
    }
}

fn ensure_object_path(config: &mut Value, path: &[&str], value: Value) {
    if path.is_empty() {
        return;
    }

    let mut current = config;
    for (index, key) in path.iter().enumerate() {
        if index == path.len() - 1 {
            if let Some(map) = current.as_object_mut() {
                map.insert(key.to_string(), value);
            }
            return;
        }

        if !current.get(*key).map(|v| v.is_object()).unwrap_or(false) {
            let Some(map) = current.as_object_mut() else {
                return;
            };
            map.insert((*key).to_string(), Value::Object(Map::new()));
        }

        let Some(next) = current.get_mut(*key) else {
            return;
        };
        current = next;
    }
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

/// Replaces secret-looking values with `****`, recursively.
pub fn redact_sensitive_values(value: &Value) -> Value {
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({
            "server": { "host": "127.0.0.1", "port": 3000 },
            "retrieval": { "top_k": 3 }
        });
        let secrets = json!({
            "vector_store": { "api_key": "pc-secret" },
            "server": { "port": 8080 }
        });

        let merged = deep_merge(&base, &secrets);

        assert_eq!(
            merged,
            json!({
                "server": { "host": "127.0.0.1", "port": 8080 },
                "retrieval": { "top_k": 3 },
                "vector_store": { "api_key": "pc-secret" }
            })
        );
    }

    #[test]
    fn env_overrides_create_nested_keys() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PINECONE_API_KEY", "pc-123"),
            ("EMBEDDING_MODEL", "all-mpnet-base-v2"),
            ("PORT", "8081"),
            ("LLM_MODEL", "  "),
        ]);
        let mut config = json!({ "generation": { "model": "gpt-4o-mini" } });

        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config["vector_store"]["api_key"], "pc-123");
        assert_eq!(config["embedding"]["model"], "all-mpnet-base-v2");
        assert_eq!(config["server"]["port"], 8081);
        // blank values do not clobber the file
        assert_eq!(config["generation"]["model"], "gpt-4o-mini");
    }

    #[test]
    fn unparsable_port_is_left_for_validation() {
        let mut config = json!({});
        apply_env_overrides(&mut config, |key| {
            (key == "PORT").then(|| "not-a-port".to_string())
        });

        assert_eq!(config["server"]["port"], "not-a-port");
        assert!(RagSettings::from_config(&config).is_err());
    }

    #[test]
    fn redact_sensitive_values_replaces_secrets_only() {
        let input = json!({
            "vector_store": { "api_key": "pc-secret", "index_name": "aws-rag" },
            "generation": { "api_key": "sk-live", "max_tokens": 512 },
            "embedding": { "max_input_tokens": 256, "api_key": null }
        });

        let redacted = redact_sensitive_values(&input);

        assert_eq!(
            redacted,
            json!({
                "vector_store": { "api_key": "****", "index_name": "aws-rag" },
                "generation": { "api_key": "****", "max_tokens": 512 },
                "embedding": { "max_input_tokens": 256, "api_key": null }
            })
        );
    }

    #[test]
    fn load_config_merges_files_on_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = Arc::new(AppPaths::with_dirs(
            dir.path().to_path_buf(),
            dir.path().to_path_buf(),
        ));
        fs::write(
            dir.path().join("config.yml"),
            "retrieval:\n  top_k: 5\nvector_store:\n  index_name: aws-rag\n",
        )
        .expect("write config");
        fs::write(&paths.secrets_path, "vector_store:\n  api_key: pc-file\n")
            .expect("write secrets");

        let service = ConfigService::new(paths);
        let public_config = load_yaml_file(&dir.path().join("config.yml")).expect("config");
        let secrets = load_yaml_file(&service.secrets_path()).expect("secrets");
        let merged = deep_merge(&public_config, &secrets);

        assert_eq!(merged["retrieval"]["top_k"], 5);
        assert_eq!(merged["vector_store"]["index_name"], "aws-rag");
        assert_eq!(merged["vector_store"]["api_key"], "pc-file");
    }

    #[test]
    fn empty_sections_fall_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.yml");
        fs::write(
            &path,
            "server:\n  host: ~\n  port: 8081\nembedding:\n  # model: all-mpnet-base-v2\nretrieval:\n  top_k: 3\n",
        )
        .expect("write config");

        let config = load_yaml_file(&path).expect("config");
        assert!(config["embedding"].is_null());

        let settings = RagSettings::from_config(&config).expect("null entries use defaults");
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 8081);
        assert_eq!(settings.embedding.model, "all-MiniLM-L6-v2");
        assert_eq!(settings.embedding.dimension, 384);
        assert_eq!(settings.retrieval.top_k, 3);
    }

    #[test]
    fn null_values_keep_their_defaults() {
        let config = json!({
            "server": { "host": null },
            "vector_store": null,
            "generation": { "api_key": null, "system_prompt": null, "temperature": 0.5 }
        });

        let settings = RagSettings::from_config(&config).expect("valid config");

        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.vector_store.index_name, "aws-rag");
        assert!(settings.generation.api_key.is_none());
        assert!(settings.generation.system_prompt.is_some());
        assert_eq!(settings.generation.temperature, 0.5);
        // the served view keeps the explicit nulls
        assert!(redact_sensitive_values(&config)["generation"]["api_key"].is_null());
    }

    #[test]
    fn malformed_yaml_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.yml");
        fs::write(&path, "retrieval: [unclosed").expect("write config");

        assert!(matches!(load_yaml_file(&path), Err(ApiError::BadRequest(_))));
    }
}
