//! Clients for the two pre-trained models the pipeline consumes.
//!
//! Both models are black boxes reached over HTTP. The pipeline only depends on the
//! [`Summarizer`] and [`QuestionAnswerer`] traits; concrete clients are built once at startup
//! from [`Config`] and shared behind an `Arc`.

mod huggingface;
mod ollama;

pub use huggingface::{HuggingFaceClient, HuggingFaceQuestionAnswerer, HuggingFaceSummarizer};
pub use ollama::OllamaSummarizer;

use crate::config::{Config, SummarizationProvider};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced while running model inference.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The model was handed an empty input.
    #[error("Cannot run inference on an empty {0}")]
    EmptyInput(&'static str),
    /// Provider could not be reached or is not ready to serve the model.
    #[error("Inference provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider rejected the input or failed while running the model.
    #[error("Model inference failed: {0}")]
    InferenceFailed(String),
    /// Provider response could not be parsed or violated the model contract.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Output length bounds for abstractive summaries, in the model's native unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryBounds {
    /// Longest summary the model may produce.
    pub max_length: usize,
    /// Shortest summary the model may produce.
    pub min_length: usize,
}

impl Default for SummaryBounds {
    fn default() -> Self {
        Self {
            max_length: 150,
            min_length: 30,
        }
    }
}

impl From<&Config> for SummaryBounds {
    fn from(config: &Config) -> Self {
        Self {
            max_length: config.summary_max_length,
            min_length: config.summary_min_length,
        }
    }
}

/// Extractive answer: a span of the context plus the model's confidence in it.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// Verbatim span copied from the context.
    pub text: String,
    /// Model-reported probability in `[0, 1]`.
    pub confidence: f64,
}

/// Abstractive summarization model.
///
/// Implementations must use non-sampling generation so that identical input produces identical
/// output.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize the full text. No chunking is applied; oversized input is a model error.
    async fn summarize(&self, text: &str) -> Result<String, InferenceError>;
}

/// Extractive question-answering model.
#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    /// Locate the span of `context` that answers `question`.
    async fn answer(&self, question: &str, context: &str) -> Result<Answer, InferenceError>;
}

/// Build the summarization client selected by configuration.
pub fn build_summarizer(config: &Config) -> Result<Arc<dyn Summarizer>, InferenceError> {
    let bounds = SummaryBounds::from(config);
    match config.summarization_provider {
        SummarizationProvider::HuggingFace => {
            let client = HuggingFaceClient::new(
                config.inference_url.clone(),
                config.inference_api_token.clone(),
            )?;
            Ok(Arc::new(HuggingFaceSummarizer::new(
                client,
                config.summarization_model.clone(),
                bounds,
            )))
        }
        SummarizationProvider::Ollama => Ok(Arc::new(OllamaSummarizer::new(
            config.ollama_url.clone(),
            config.summarization_model.clone(),
            bounds,
        )?)),
    }
}

/// Build the extractive question-answering client.
pub fn build_question_answerer(
    config: &Config,
) -> Result<Arc<dyn QuestionAnswerer>, InferenceError> {
    let client = HuggingFaceClient::new(
        config.inference_url.clone(),
        config.inference_api_token.clone(),
    )?;
    Ok(Arc::new(HuggingFaceQuestionAnswerer::new(
        client,
        config.qa_model.clone(),
    )))
}

/// Resolve the answer span inside `context`.
///
/// Character offsets reported by the provider win when they are in range; otherwise the reported
/// answer text must occur verbatim in the context. Anything else is not an extractive answer.
pub(crate) fn locate_span(
    context: &str,
    reported: &str,
    offsets: Option<(usize, usize)>,
) -> Result<String, InferenceError> {
    if let Some((start, end)) = offsets {
        if let Some(span) = char_span(context, start, end) {
            if span.trim() == reported.trim() || reported.is_empty() {
                return Ok(span.to_string());
            }
            tracing::debug!(start, end, "Answer offsets disagree with answer text");
        }
    }

    if context.contains(reported) {
        return Ok(reported.to_string());
    }

    Err(InferenceError::InvalidResponse(format!(
        "answer '{reported}' is not a span of the supplied context"
    )))
}

/// Slice `context` by character (not byte) offsets, `end` exclusive.
fn char_span(context: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let mut boundaries = context
        .char_indices()
        .map(|(index, _)| index)
        .chain(std::iter::once(context.len()));
    let begin = boundaries.nth(start)?;
    let finish = if end == start {
        begin
    } else {
        boundaries.nth(end - start - 1)?
    };
    Some(&context[begin..finish])
}

/// Reject confidences outside `[0, 1]`.
pub(crate) fn validate_confidence(score: f64) -> Result<f64, InferenceError> {
    if score.is_finite() && (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(InferenceError::InvalidResponse(format!(
            "confidence {score} is outside [0, 1]"
        )))
    }
}
