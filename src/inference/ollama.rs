//! Ollama-backed summarization.
//!
//! Issues HTTP requests directly to the runtime's `/api/generate` endpoint. Generation runs at
//! temperature zero with a fixed seed so repeated calls return the same summary.

use super::{InferenceError, SummaryBounds, Summarizer};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

const GENERATION_SEED: u64 = 42;

/// Summarizer that prompts a local Ollama model.
pub struct OllamaSummarizer {
    http: Client,
    base_url: String,
    model: String,
    bounds: SummaryBounds,
}

impl OllamaSummarizer {
    /// Build a summarizer for `model` served at `base_url`.
    pub fn new(
        base_url: String,
        model: String,
        bounds: SummaryBounds,
    ) -> Result<Self, InferenceError> {
        let http = Client::builder()
            .user_agent("rusty-digest/summary")
            .build()
            .map_err(|error| {
                InferenceError::ProviderUnavailable(format!(
                    "failed to construct HTTP client: {error}"
                ))
            })?;
        Ok(Self {
            http,
            base_url,
            model,
            bounds,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }

    fn payload(&self, text: &str) -> Value {
        json!({
            "model": self.model,
            "prompt": build_prompt(text, self.bounds),
            "stream": false,
            "options": {
                "temperature": 0.0,
                "seed": GENERATION_SEED,
                "num_predict": self.bounds.max_length * 2,
            }
        })
    }
}

fn build_prompt(text: &str, bounds: SummaryBounds) -> String {
    format!(
        "System: You write concise, factual summaries of documents. Use between {} and {} words. \
         Output a single paragraph containing only the summary.\n\nDocument:\n{text}",
        bounds.min_length, bounds.max_length
    )
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, InferenceError> {
        if text.trim().is_empty() {
            return Err(InferenceError::EmptyInput("document text"));
        }

        let response = self
            .http
            .post(self.endpoint())
            .json(&self.payload(text))
            .send()
            .await
            .map_err(|error| {
                InferenceError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(InferenceError::ProviderUnavailable(format!(
                "Ollama endpoint {} returned 404 (is model '{}' pulled?)",
                self.endpoint(),
                self.model
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::InferenceFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaResponse = response.json().await.map_err(|error| {
            InferenceError::InvalidResponse(format!("failed to decode Ollama response: {error}"))
        })?;

        if !body.done {
            return Err(InferenceError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response.trim().to_string())
    }
}
