use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co";
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_SUMMARIZATION_MODEL: &str = "facebook/bart-large-cnn";
const DEFAULT_QA_MODEL: &str = "deepset/roberta-base-squad2";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the Rusty Digest server and CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Backend used to produce abstractive summaries.
    pub summarization_provider: SummarizationProvider,
    /// Base URL of the Hugging Face compatible inference endpoint.
    pub inference_url: String,
    /// Optional bearer token sent to the inference endpoint.
    pub inference_api_token: Option<String>,
    /// Summarization model identifier passed to the provider.
    pub summarization_model: String,
    /// Extractive question-answering model identifier.
    pub qa_model: String,
    /// Upper bound on summary length, in the model's native unit.
    pub summary_max_length: usize,
    /// Lower bound on summary length, in the model's native unit.
    pub summary_min_length: usize,
    /// Base URL of the Ollama runtime when it serves summaries.
    pub ollama_url: String,
    /// Number of characters shown in the extracted text preview.
    pub preview_chars: usize,
    /// Largest accepted upload body for the HTTP surface.
    pub max_upload_bytes: usize,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Supported summarization backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarizationProvider {
    /// Hugging Face Inference API (or a self-hosted server speaking the same protocol).
    #[default]
    HuggingFace,
    /// Local Ollama runtime.
    Ollama,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset so that `.env` templates with empty entries fall back
    /// to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let summarization_provider = get("SUMMARIZATION_PROVIDER")
            .map(|value| {
                value.parse().map_err(|()| {
                    ConfigError::InvalidValue("SUMMARIZATION_PROVIDER".to_string())
                })
            })
            .transpose()?
            .unwrap_or_default();

        let summary_max_length =
            parse_optional(get("SUMMARY_MAX_LENGTH"), "SUMMARY_MAX_LENGTH")?.unwrap_or(150);
        let summary_min_length =
            parse_optional(get("SUMMARY_MIN_LENGTH"), "SUMMARY_MIN_LENGTH")?.unwrap_or(30);
        if summary_max_length == 0 || summary_min_length > summary_max_length {
            return Err(ConfigError::InvalidValue("SUMMARY_MIN_LENGTH".into()));
        }

        Ok(Self {
            summarization_provider,
            inference_url: get("INFERENCE_URL").unwrap_or_else(|| DEFAULT_INFERENCE_URL.into()),
            inference_api_token: get("INFERENCE_API_TOKEN"),
            summarization_model: get("SUMMARIZATION_MODEL")
                .unwrap_or_else(|| DEFAULT_SUMMARIZATION_MODEL.into()),
            qa_model: get("QA_MODEL").unwrap_or_else(|| DEFAULT_QA_MODEL.into()),
            summary_max_length,
            summary_min_length,
            ollama_url: get("OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.into()),
            preview_chars: parse_optional(get("PREVIEW_CHARS"), "PREVIEW_CHARS")?.unwrap_or(500),
            max_upload_bytes: parse_optional(get("MAX_UPLOAD_BYTES"), "MAX_UPLOAD_BYTES")?
                .unwrap_or(50 * 1024 * 1024),
            server_port: parse_optional(get("SERVER_PORT"), "SERVER_PORT")?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            summarization_provider: SummarizationProvider::HuggingFace,
            inference_url: DEFAULT_INFERENCE_URL.into(),
            inference_api_token: None,
            summarization_model: DEFAULT_SUMMARIZATION_MODEL.into(),
            qa_model: DEFAULT_QA_MODEL.into(),
            summary_max_length: 150,
            summary_min_length: 30,
            ollama_url: DEFAULT_OLLAMA_URL.into(),
            preview_chars: 500,
            max_upload_bytes: 50 * 1024 * 1024,
            server_port: None,
        }
    }
}

fn parse_optional<T: std::str::FromStr>(
    value: Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

impl std::str::FromStr for SummarizationProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        provider = ?config.summarization_provider,
        summarization_model = %config.summarization_model,
        qa_model = %config.qa_model,
        max_length = config.summary_max_length,
        min_length = config.summary_min_length,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
