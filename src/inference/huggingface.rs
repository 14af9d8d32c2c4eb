//! Hugging Face Inference API clients.
//!
//! Requests go to `POST {base_url}/models/{model}` using the task payloads understood by the
//! hosted Inference API and by self-hosted servers that mirror it.

use super::{
    Answer, InferenceError, QuestionAnswerer, SummaryBounds, Summarizer, locate_span,
    validate_confidence,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

/// Shared HTTP transport for Hugging Face style inference endpoints.
#[derive(Clone)]
pub struct HuggingFaceClient {
    http: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HuggingFaceClient {
    /// Build a client for the given endpoint, optionally authenticating with a bearer token.
    pub fn new(base_url: String, api_token: Option<String>) -> Result<Self, InferenceError> {
        let http = Client::builder()
            .user_agent("rusty-digest/inference")
            .build()
            .map_err(|error| {
                InferenceError::ProviderUnavailable(format!(
                    "failed to construct HTTP client: {error}"
                ))
            })?;
        Ok(Self {
            http,
            base_url,
            api_token,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}", self.base_url.trim_end_matches('/'))
    }

    /// Post a task payload to `model` and decode the JSON response.
    async fn invoke<T: DeserializeOwned>(
        &self,
        model: &str,
        payload: &Value,
    ) -> Result<T, InferenceError> {
        let endpoint = self.endpoint(model);
        let mut request = self.http.post(&endpoint).json(payload);
        if let Some(token) = self.api_token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|error| {
            InferenceError::ProviderUnavailable(format!(
                "failed to reach inference endpoint {endpoint}: {error}"
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body);
            tracing::warn!(model, %status, %message, "Inference request rejected");
            return Err(match status {
                StatusCode::NOT_FOUND | StatusCode::SERVICE_UNAVAILABLE => {
                    InferenceError::ProviderUnavailable(format!(
                        "{endpoint} returned {status}: {message}"
                    ))
                }
                _ => InferenceError::InferenceFailed(format!("{model} returned {status}: {message}")),
            });
        }

        response.json().await.map_err(|error| {
            InferenceError::InvalidResponse(format!("failed to decode {model} response: {error}"))
        })
    }
}

/// Pull the `error` field out of a provider error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| match value.get("error") {
            Some(Value::String(message)) => Some(message.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Abstractive summarizer backed by a sequence-to-sequence model such as BART.
pub struct HuggingFaceSummarizer {
    client: HuggingFaceClient,
    model: String,
    bounds: SummaryBounds,
}

impl HuggingFaceSummarizer {
    /// Wrap `client` for the given summarization model and length bounds.
    pub fn new(client: HuggingFaceClient, model: String, bounds: SummaryBounds) -> Self {
        Self {
            client,
            model,
            bounds,
        }
    }

    /// Request body for `text`. Sampling is disabled so generation is deterministic.
    fn payload(&self, text: &str) -> Value {
        json!({
            "inputs": text,
            "parameters": {
                "max_length": self.bounds.max_length,
                "min_length": self.bounds.min_length,
                "do_sample": false,
            },
            "options": {
                "wait_for_model": true,
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct SummaryItem {
    summary_text: String,
}

#[async_trait]
impl Summarizer for HuggingFaceSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, InferenceError> {
        if text.trim().is_empty() {
            return Err(InferenceError::EmptyInput("document text"));
        }
        tracing::debug!(
            model = %self.model,
            chars = text.chars().count(),
            max_length = self.bounds.max_length,
            min_length = self.bounds.min_length,
            "Requesting summary"
        );

        let items: Vec<SummaryItem> = self.client.invoke(&self.model, &self.payload(text)).await?;
        items
            .into_iter()
            .next()
            .map(|item| item.summary_text)
            .ok_or_else(|| InferenceError::InvalidResponse("summary list was empty".into()))
    }
}

/// Extractive question answering backed by a SQuAD-style span model.
pub struct HuggingFaceQuestionAnswerer {
    client: HuggingFaceClient,
    model: String,
}

impl HuggingFaceQuestionAnswerer {
    /// Wrap `client` for the given question-answering model.
    pub fn new(client: HuggingFaceClient, model: String) -> Self {
        Self { client, model }
    }
}

#[derive(Debug, Deserialize)]
struct QaSpan {
    answer: String,
    score: f64,
    #[serde(default)]
    start: Option<usize>,
    #[serde(default)]
    end: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QaResponse {
    Single(QaSpan),
    Ranked(Vec<QaSpan>),
}

#[async_trait]
impl QuestionAnswerer for HuggingFaceQuestionAnswerer {
    async fn answer(&self, question: &str, context: &str) -> Result<Answer, InferenceError> {
        if question.trim().is_empty() {
            return Err(InferenceError::EmptyInput("question"));
        }
        if context.trim().is_empty() {
            return Err(InferenceError::EmptyInput("document text"));
        }
        tracing::debug!(model = %self.model, context_chars = context.chars().count(), "Requesting answer");

        let payload = json!({
            "inputs": {
                "question": question,
                "context": context,
            },
            "options": {
                "wait_for_model": true,
            }
        });
        let response: QaResponse = self.client.invoke(&self.model, &payload).await?;
        let best = match response {
            QaResponse::Single(span) => span,
            QaResponse::Ranked(spans) => spans.into_iter().next().ok_or_else(|| {
                InferenceError::InvalidResponse("answer list was empty".into())
            })?,
        };

        let offsets = best.start.zip(best.end);
        Ok(Answer {
            text: locate_span(context, &best.answer, offsets)?,
            confidence: validate_confidence(best.score)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client(server: &MockServer, token: Option<&str>) -> HuggingFaceClient {
        HuggingFaceClient::new(server.base_url(), token.map(str::to_string)).expect("client")
    }

    #[tokio::test]
    async fn summarizer_sends_deterministic_bounded_request() {
        let server = MockServer::start_async().await;
        let summarizer = HuggingFaceSummarizer::new(
            client(&server, Some("secret")),
            "facebook/bart-large-cnn".into(),
            SummaryBounds {
                max_length: 150,
                min_length: 30,
            },
        );

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/facebook/bart-large-cnn")
                    .header("authorization", "Bearer secret")
                    .json_body(json!({
                        "inputs": "The sky is blue. Grass is green.",
                        "parameters": {
                            "max_length": 150,
                            "min_length": 30,
                            "do_sample": false,
                        },
                        "options": { "wait_for_model": true }
                    }));
                then.status(200)
                    .json_body(json!([{ "summary_text": "Sky blue, grass green." }]));
            })
            .await;

        let first = summarizer
            .summarize("The sky is blue. Grass is green.")
            .await
            .expect("summary");
        let second = summarizer
            .summarize("The sky is blue. Grass is green.")
            .await
            .expect("summary");

        mock.assert_hits_async(2).await;
        assert_eq!(first, "Sky blue, grass green.");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn summarizer_rejects_empty_text_without_calling_model() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(json!([{ "summary_text": "x" }]));
            })
            .await;
        let summarizer = HuggingFaceSummarizer::new(
            client(&server, None),
            "m".into(),
            SummaryBounds::default(),
        );

        let error = summarizer.summarize("  \n ").await.expect_err("empty");
        assert!(matches!(error, InferenceError::EmptyInput(_)));
        mock.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn oversized_input_surfaces_model_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/m");
                then.status(400).json_body(json!({
                    "error": "index out of range in self"
                }));
            })
            .await;
        let summarizer = HuggingFaceSummarizer::new(
            client(&server, None),
            "m".into(),
            SummaryBounds::default(),
        );

        let error = summarizer.summarize("long text").await.expect_err("error");
        match error {
            InferenceError::InferenceFailed(message) => {
                assert!(message.contains("400"));
                assert!(message.contains("index out of range"));
            }
            other => panic!("expected inference failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn loading_model_is_reported_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/m");
                then.status(503)
                    .json_body(json!({ "error": "Model m is currently loading" }));
            })
            .await;
        let summarizer = HuggingFaceSummarizer::new(
            client(&server, None),
            "m".into(),
            SummaryBounds::default(),
        );

        let error = summarizer.summarize("text").await.expect_err("error");
        assert!(matches!(error, InferenceError::ProviderUnavailable(message) if message.contains("loading")));
    }

    #[tokio::test]
    async fn malformed_summary_payload_is_invalid_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/m");
                then.status(200).json_body(json!([]));
            })
            .await;
        let summarizer = HuggingFaceSummarizer::new(
            client(&server, None),
            "m".into(),
            SummaryBounds::default(),
        );

        let error = summarizer.summarize("text").await.expect_err("error");
        assert!(matches!(error, InferenceError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn answerer_returns_span_and_confidence() {
        let server = MockServer::start_async().await;
        let context = "The sky is blue. Grass is green.";
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/deepset/roberta-base-squad2")
                    .json_body_partial(
                        json!({
                            "inputs": {
                                "question": "What color is the grass?",
                                "context": context,
                            }
                        })
                        .to_string(),
                    );
                then.status(200).json_body(json!({
                    "answer": "green",
                    "score": 0.87,
                    "start": 26,
                    "end": 31
                }));
            })
            .await;
        let answerer = HuggingFaceQuestionAnswerer::new(
            client(&server, None),
            "deepset/roberta-base-squad2".into(),
        );

        let answer = answerer
            .answer("What color is the grass?", context)
            .await
            .expect("answer");

        mock.assert_async().await;
        assert_eq!(answer.text, "green");
        assert!(context.contains(&answer.text));
        assert!((answer.confidence - 0.87).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn answerer_accepts_ranked_list_and_keeps_low_confidence() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/qa");
                then.status(200).json_body(json!([
                    { "answer": "blue", "score": 0.02, "start": 11, "end": 15 },
                    { "answer": "sky", "score": 0.01, "start": 4, "end": 7 }
                ]));
            })
            .await;
        let answerer = HuggingFaceQuestionAnswerer::new(client(&server, None), "qa".into());

        let answer = answerer
            .answer("What is blue?", "The sky is blue.")
            .await
            .expect("answer");
        assert_eq!(answer.text, "blue");
        assert!((answer.confidence - 0.02).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn answerer_rejects_answers_outside_context() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/qa");
                then.status(200)
                    .json_body(json!({ "answer": "azure", "score": 0.5 }));
            })
            .await;
        let answerer = HuggingFaceQuestionAnswerer::new(client(&server, None), "qa".into());

        let error = answerer
            .answer("What color?", "The sky is blue.")
            .await
            .expect_err("not extractive");
        assert!(matches!(error, InferenceError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn answerer_rejects_out_of_range_confidence() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/models/qa");
                then.status(200).json_body(
                    json!({ "answer": "blue", "score": 3.5, "start": 11, "end": 15 }),
                );
            })
            .await;
        let answerer = HuggingFaceQuestionAnswerer::new(client(&server, None), "qa".into());

        let error = answerer
            .answer("What color?", "The sky is blue.")
            .await
            .expect_err("bad score");
        assert!(matches!(error, InferenceError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_provider_is_unavailable() {
        let client = HuggingFaceClient::new("http://127.0.0.1:9".into(), None).expect("client");
        let answerer = HuggingFaceQuestionAnswerer::new(client, "qa".into());
        let error = answerer
            .answer("What?", "Some context")
            .await
            .expect_err("unreachable");
        assert!(matches!(error, InferenceError::ProviderUnavailable(_)));
    }

    #[test]
    fn error_message_prefers_error_field() {
        assert_eq!(error_message(r#"{"error":"boom"}"#), "boom");
        assert_eq!(error_message("plain failure\n"), "plain failure");
    }
}
