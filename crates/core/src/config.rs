//! Settings management for the Noctua chat assistant.
//!
//! Settings are resolved once at startup from three layers, later layers
//! winning:
//! - an optional YAML file (`noctua.yaml` or `NOCTUA_CONFIG`)
//! - environment variables
//! - command-line flags (`with_overrides`)
//!
//! Required keys are validated at construction. When any are absent the
//! loader fails with `AppError::MissingConfig` naming every missing key,
//! so one error report is enough to fix the whole environment.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Endpoint of the hosted retrieval service.
pub const KEY_SEARCH_ENDPOINT: &str = "NOCTUA_SEARCH_ENDPOINT";
/// Endpoint of the hosted generation service.
pub const KEY_OPENAI_ENDPOINT: &str = "NOCTUA_OPENAI_ENDPOINT";

const KEY_SEARCH_AGENT: &str = "NOCTUA_SEARCH_AGENT";
const KEY_SEARCH_INDEX: &str = "NOCTUA_SEARCH_INDEX";
const KEY_GPT_DEPLOYMENT: &str = "NOCTUA_GPT_DEPLOYMENT";
const KEY_EMBEDDING_DEPLOYMENT: &str = "NOCTUA_EMBEDDING_DEPLOYMENT";
const KEY_API_KEY: &str = "NOCTUA_API_KEY";
const KEY_IDENTITY_CLIENT_ID: &str = "NOCTUA_IDENTITY_CLIENT_ID";
const KEY_IDENTITY_ENDPOINT: &str = "NOCTUA_IDENTITY_ENDPOINT";
const KEY_RETRIEVAL_TOP: &str = "NOCTUA_RETRIEVAL_TOP";
const KEY_RERANKER_THRESHOLD: &str = "NOCTUA_RERANKER_THRESHOLD";
const KEY_STORAGE_CONTAINER: &str = "NOCTUA_STORAGE_CONTAINER";
const KEY_SQL_CONNECTION: &str = "NOCTUA_SQL_CONNECTION";

const DEFAULT_SEARCH_AGENT: &str = "earth-knowledge-agent";
const DEFAULT_SEARCH_INDEX: &str = "earth-at-night";
const DEFAULT_GPT_DEPLOYMENT: &str = "gpt-4o";
const DEFAULT_RETRIEVAL_TOP: u32 = 5;
const DEFAULT_RERANKER_THRESHOLD: f32 = 2.5;

/// Resolved application settings.
///
/// Required fields are plain `String`s: if construction succeeded they are
/// present and non-empty. Optional fields stay `Option` and gate features.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Retrieval service base URL (required)
    pub search_endpoint: String,

    /// Generation service base URL (required)
    pub openai_endpoint: String,

    /// Knowledge agent queried for passages
    pub search_agent: String,

    /// Logical index behind the agent
    pub search_index: String,

    /// Chat-completion deployment backing generation
    pub gpt_deployment: String,

    /// Embedding deployment, recorded for display only. Embedding calls are
    /// made by the external indexing pipeline, never by this program.
    pub embedding_deployment: Option<String>,

    /// Static API secret, if configured
    pub api_key: Option<String>,

    /// User-assigned managed identity client id, if configured
    pub identity_client_id: Option<String>,

    /// Override for the ambient token endpoint
    pub identity_endpoint: Option<String>,

    /// Result-count limit sent to the retrieval service
    pub retrieval_top: u32,

    /// Minimum reranker score a passage must reach to be used as context
    pub reranker_threshold: f32,

    /// Blob container holding source documents (enables ingestion reporting)
    pub storage_container: Option<String>,

    /// SQL connection string (enables analytics reporting)
    pub sql_connection: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Raw YAML config file structure. All keys optional; the environment and
/// CLI flags fill in or override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(rename = "searchEndpoint")]
    search_endpoint: Option<String>,
    #[serde(rename = "openaiEndpoint")]
    openai_endpoint: Option<String>,
    #[serde(rename = "searchAgent")]
    search_agent: Option<String>,
    #[serde(rename = "searchIndex")]
    search_index: Option<String>,
    #[serde(rename = "gptDeployment")]
    gpt_deployment: Option<String>,
    #[serde(rename = "embeddingDeployment")]
    embedding_deployment: Option<String>,
    #[serde(rename = "identityClientId")]
    identity_client_id: Option<String>,
    #[serde(rename = "identityEndpoint")]
    identity_endpoint: Option<String>,
    #[serde(rename = "retrievalTop")]
    retrieval_top: Option<u32>,
    #[serde(rename = "rerankerThreshold")]
    reranker_threshold: Option<f32>,
    #[serde(rename = "storageContainer")]
    storage_container: Option<String>,
    #[serde(rename = "sqlConnection")]
    sql_connection: Option<String>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Settings {
    /// Load settings from the environment, on top of an optional YAML file.
    ///
    /// Environment variables:
    /// - `NOCTUA_SEARCH_ENDPOINT` (required): retrieval service URL
    /// - `NOCTUA_OPENAI_ENDPOINT` (required): generation service URL
    /// - `NOCTUA_SEARCH_AGENT`, `NOCTUA_SEARCH_INDEX`: agent/index names
    /// - `NOCTUA_GPT_DEPLOYMENT`: chat model deployment
    /// - `NOCTUA_API_KEY`, `NOCTUA_IDENTITY_CLIENT_ID`,
    ///   `NOCTUA_IDENTITY_ENDPOINT`: credential material
    /// - `NOCTUA_RETRIEVAL_TOP`, `NOCTUA_RERANKER_THRESHOLD`: retrieval knobs
    /// - `NOCTUA_STORAGE_CONTAINER`, `NOCTUA_SQL_CONNECTION`: optional
    ///   features
    /// - `NOCTUA_CONFIG`: path to a YAML settings file
    /// - `RUST_LOG`, `NO_COLOR`: logging behavior
    ///
    /// Fails with `AppError::MissingConfig` listing every absent required
    /// key. Empty-string values count as absent.
    pub fn load() -> AppResult<Self> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::from_sources(&env)
    }

    /// Build settings from an explicit key/value map. Split out from
    /// `load()` so tests can run without mutating process environment.
    pub fn from_sources(env: &HashMap<String, String>) -> AppResult<Self> {
        let file = Self::load_file(env)?;

        let get = |key: &str, from_file: &Option<String>| -> Option<String> {
            env.get(key)
                .filter(|v| !v.trim().is_empty())
                .cloned()
                .or_else(|| from_file.clone().filter(|v| !v.trim().is_empty()))
        };

        // Accumulate every missing required key before failing.
        let mut missing = Vec::new();

        let search_endpoint = get(KEY_SEARCH_ENDPOINT, &file.search_endpoint)
            .unwrap_or_else(|| {
                missing.push(KEY_SEARCH_ENDPOINT.to_string());
                String::new()
            });
        let openai_endpoint = get(KEY_OPENAI_ENDPOINT, &file.openai_endpoint)
            .unwrap_or_else(|| {
                missing.push(KEY_OPENAI_ENDPOINT.to_string());
                String::new()
            });

        if !missing.is_empty() {
            return Err(AppError::MissingConfig(missing));
        }

        let retrieval_top = match get(KEY_RETRIEVAL_TOP, &None) {
            Some(raw) => raw.parse::<u32>().map_err(|_| {
                AppError::Config(format!("{} must be an integer, got '{}'", KEY_RETRIEVAL_TOP, raw))
            })?,
            None => file.retrieval_top.unwrap_or(DEFAULT_RETRIEVAL_TOP),
        };

        let reranker_threshold = match get(KEY_RERANKER_THRESHOLD, &None) {
            Some(raw) => raw.parse::<f32>().map_err(|_| {
                AppError::Config(format!(
                    "{} must be a number, got '{}'",
                    KEY_RERANKER_THRESHOLD, raw
                ))
            })?,
            None => file.reranker_threshold.unwrap_or(DEFAULT_RERANKER_THRESHOLD),
        };

        let mut settings = Self {
            search_endpoint: search_endpoint.trim_end_matches('/').to_string(),
            openai_endpoint: openai_endpoint.trim_end_matches('/').to_string(),
            search_agent: get(KEY_SEARCH_AGENT, &file.search_agent)
                .unwrap_or_else(|| DEFAULT_SEARCH_AGENT.to_string()),
            search_index: get(KEY_SEARCH_INDEX, &file.search_index)
                .unwrap_or_else(|| DEFAULT_SEARCH_INDEX.to_string()),
            gpt_deployment: get(KEY_GPT_DEPLOYMENT, &file.gpt_deployment)
                .unwrap_or_else(|| DEFAULT_GPT_DEPLOYMENT.to_string()),
            embedding_deployment: get(KEY_EMBEDDING_DEPLOYMENT, &file.embedding_deployment),
            api_key: get(KEY_API_KEY, &None),
            identity_client_id: get(KEY_IDENTITY_CLIENT_ID, &file.identity_client_id),
            identity_endpoint: get(KEY_IDENTITY_ENDPOINT, &file.identity_endpoint),
            retrieval_top,
            reranker_threshold,
            storage_container: get(KEY_STORAGE_CONTAINER, &file.storage_container),
            sql_connection: get(KEY_SQL_CONNECTION, &file.sql_connection),
            log_level: env.get("RUST_LOG").cloned(),
            verbose: false,
            no_color: env.contains_key("NO_COLOR"),
        };

        if settings.log_level.is_none() {
            settings.log_level = file.logging.as_ref().and_then(|l| l.level.clone());
        }
        if let Some(color) = file.logging.as_ref().and_then(|l| l.color) {
            if !settings.no_color {
                settings.no_color = !color;
            }
        }

        Ok(settings)
    }

    /// Read the YAML settings file if one exists.
    fn load_file(env: &HashMap<String, String>) -> AppResult<SettingsFile> {
        let path = env
            .get("NOCTUA_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("noctua.yaml"));

        if !path.exists() {
            return Ok(SettingsFile::default());
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| {
            AppError::Config(format!("Failed to read settings file {:?}: {}", path, e))
        })?;

        serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse settings file {:?}: {}", path, e))
        })
    }

    /// Apply CLI overrides, giving flags precedence over environment and
    /// file values.
    pub fn with_overrides(
        mut self,
        search_endpoint: Option<String>,
        openai_endpoint: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(endpoint) = search_endpoint {
            self.search_endpoint = endpoint.trim_end_matches('/').to_string();
        }

        if let Some(endpoint) = openai_endpoint {
            self.openai_endpoint = endpoint.trim_end_matches('/').to_string();
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Whether the ingestion-facing feature set is configured.
    pub fn storage_enabled(&self) -> bool {
        self.storage_container.is_some()
    }

    /// Whether the analytics-facing feature set is configured.
    pub fn analytics_enabled(&self) -> bool {
        self.sql_connection.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_env() -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert(
            KEY_SEARCH_ENDPOINT.to_string(),
            "https://search.example.net".to_string(),
        );
        env.insert(
            KEY_OPENAI_ENDPOINT.to_string(),
            "https://openai.example.net/".to_string(),
        );
        // Steer the file layer away from any noctua.yaml in the cwd.
        env.insert("NOCTUA_CONFIG".to_string(), "/nonexistent/noctua.yaml".to_string());
        env
    }

    #[test]
    fn test_defaults_applied() {
        let settings = Settings::from_sources(&base_env()).unwrap();
        assert_eq!(settings.search_agent, "earth-knowledge-agent");
        assert_eq!(settings.search_index, "earth-at-night");
        assert_eq!(settings.gpt_deployment, "gpt-4o");
        assert_eq!(settings.retrieval_top, 5);
        assert_eq!(settings.reranker_threshold, 2.5);
        assert!(!settings.storage_enabled());
        assert!(!settings.analytics_enabled());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let settings = Settings::from_sources(&base_env()).unwrap();
        assert_eq!(settings.openai_endpoint, "https://openai.example.net");
    }

    #[test]
    fn test_missing_keys_all_reported() {
        let mut env = HashMap::new();
        env.insert("NOCTUA_CONFIG".to_string(), "/nonexistent/noctua.yaml".to_string());
        let err = Settings::from_sources(&env).unwrap_err();
        match err {
            AppError::MissingConfig(keys) => {
                assert_eq!(keys.len(), 2);
                assert!(keys.contains(&KEY_SEARCH_ENDPOINT.to_string()));
                assert!(keys.contains(&KEY_OPENAI_ENDPOINT.to_string()));
            }
            other => panic!("Expected MissingConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut env = base_env();
        env.insert(KEY_SEARCH_ENDPOINT.to_string(), "   ".to_string());
        let err = Settings::from_sources(&env).unwrap_err();
        match err {
            AppError::MissingConfig(keys) => {
                assert_eq!(keys, vec![KEY_SEARCH_ENDPOINT.to_string()]);
            }
            other => panic!("Expected MissingConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_threshold_rejected() {
        let mut env = base_env();
        env.insert(KEY_RERANKER_THRESHOLD.to_string(), "high".to_string());
        assert!(matches!(
            Settings::from_sources(&env),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_with_overrides() {
        let settings = Settings::from_sources(&base_env()).unwrap().with_overrides(
            Some("https://other.example.net/".to_string()),
            None,
            None,
            true,
            false,
        );

        assert_eq!(settings.search_endpoint, "https://other.example.net");
        assert!(settings.verbose);
        assert_eq!(settings.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_yaml_file_overridden_by_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noctua.yaml");
        std::fs::write(
            &path,
            "searchEndpoint: https://file.example.net\nsearchAgent: file-agent\nrerankerThreshold: 1.0\n",
        )
        .unwrap();

        let mut env = base_env();
        env.insert(
            "NOCTUA_CONFIG".to_string(),
            path.to_string_lossy().to_string(),
        );

        let settings = Settings::from_sources(&env).unwrap();
        // env endpoint wins over the file value
        assert_eq!(settings.search_endpoint, "https://search.example.net");
        // file fills keys the env leaves unset
        assert_eq!(settings.search_agent, "file-agent");
        assert_eq!(settings.reranker_threshold, 1.0);
    }
}
