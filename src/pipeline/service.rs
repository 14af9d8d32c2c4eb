//! Pipeline orchestrator: extract, then summarize, then (optionally) answer.

use crate::{
    config::Config,
    extraction::{self, UploadedDocument},
    inference::{
        InferenceError, QuestionAnswerer, Summarizer, build_question_answerer, build_summarizer,
    },
    metrics::{MetricsSnapshot, PipelineMetrics},
    pipeline::types::{AnswerResult, ExtractedText, PassReport, PipelineError, SummaryResult},
    render,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

const DEFAULT_PREVIEW_CHARS: usize = 500;

/// Sequences the extractor and the two inference services for one upload at a time.
///
/// Model clients are injected at construction and shared read-only for the lifetime of the
/// process. Construct the pipeline once near process start and share it through an `Arc`.
pub struct Pipeline {
    summarizer: Arc<dyn Summarizer>,
    answerer: Arc<dyn QuestionAnswerer>,
    preview_chars: usize,
    metrics: Arc<PipelineMetrics>,
}

/// Abstraction over the pipeline used by external surfaces (HTTP, CLI).
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Run a full pass over `document`, answering `question` when one is supplied.
    async fn process(
        &self,
        document: UploadedDocument,
        question: Option<String>,
    ) -> Result<PassReport, PipelineError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl Pipeline {
    /// Build a pipeline around already constructed model clients.
    pub fn new(summarizer: Arc<dyn Summarizer>, answerer: Arc<dyn QuestionAnswerer>) -> Self {
        Self {
            summarizer,
            answerer,
            preview_chars: DEFAULT_PREVIEW_CHARS,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Build the model clients described by `config` and wrap them in a pipeline.
    pub fn from_config(config: &Config) -> Result<Self, InferenceError> {
        tracing::info!(
            provider = ?config.summarization_provider,
            summarization_model = %config.summarization_model,
            qa_model = %config.qa_model,
            "Initializing inference clients"
        );
        let summarizer = build_summarizer(config)?;
        let answerer = build_question_answerer(config)?;
        Ok(Self::new(summarizer, answerer).with_preview_chars(config.preview_chars))
    }

    /// Override the number of characters shown in previews.
    pub fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars;
        self
    }

    /// Stage one: turn the upload into text.
    pub fn extract(&self, document: &UploadedDocument) -> Result<ExtractedText, PipelineError> {
        let text = extraction::extract(document)?;
        Ok(ExtractedText::new(text))
    }

    /// Stage two: summarize the full extracted text.
    pub async fn summarize(&self, text: &ExtractedText) -> Result<SummaryResult, PipelineError> {
        let outcome = self
            .summarizer
            .summarize(text.as_str())
            .await
            .map(|summary| SummaryResult { summary })
            .map_err(PipelineError::Summarization);
        self.metrics.record_summary(outcome.is_ok());
        outcome
    }

    /// Stage three: answer `question` against the full extracted text.
    ///
    /// The question is forwarded exactly as typed. Returns `None` when it is blank; no model call
    /// is made in that case.
    pub async fn ask(
        &self,
        text: &ExtractedText,
        question: &str,
    ) -> Option<Result<AnswerResult, PipelineError>> {
        if question.trim().is_empty() {
            return None;
        }

        let outcome = self
            .answerer
            .answer(question, text.as_str())
            .await
            .map(|answer| AnswerResult {
                question: question.to_string(),
                answer: answer.text,
                confidence: answer.confidence,
            })
            .map_err(PipelineError::QuestionAnswering);
        self.metrics.record_answer(outcome.is_ok());
        Some(outcome)
    }

    /// Run one linear pass: Extract → Summarize → (optional) Answer.
    ///
    /// Extraction failure halts the pass and is returned as the error. Summary and answer
    /// failures are recorded in the [`PassReport`] and never stop the other stage.
    pub async fn process(
        &self,
        document: UploadedDocument,
        question: Option<&str>,
    ) -> Result<PassReport, PipelineError> {
        let pass_id = Uuid::new_v4();
        let fingerprint = document.fingerprint();
        let span = tracing::info_span!("pass", %pass_id, fingerprint = %fingerprint);
        self.run_pass(pass_id, fingerprint, document, question)
            .instrument(span)
            .await
    }

    async fn run_pass(
        &self,
        pass_id: Uuid,
        fingerprint: String,
        document: UploadedDocument,
        question: Option<&str>,
    ) -> Result<PassReport, PipelineError> {
        self.metrics.record_pass();
        tracing::info!(
            mime_type = document.mime_type(),
            bytes = document.bytes().len(),
            "Processing upload"
        );

        let format = match document.format() {
            Ok(format) => format,
            Err(error) => return Err(self.halt(error.into())),
        };
        let text = match self.extract(&document) {
            Ok(text) => text,
            Err(error) => return Err(self.halt(error)),
        };
        tracing::info!(%format, chars = text.char_count(), "Extracted text");
        let preview = render::preview(text.as_str(), self.preview_chars);

        let summary = self.summarize(&text).await;
        match &summary {
            Ok(result) => {
                tracing::info!(chars = result.summary.chars().count(), "Summary generated")
            }
            Err(error) => tracing::warn!(stage = error.stage(), %error, "Summarization failed"),
        }

        let answer = match question {
            Some(question) => self.ask(&text, question).await,
            None => None,
        };
        match &answer {
            Some(Ok(result)) => tracing::info!(confidence = result.confidence, "Question answered"),
            Some(Err(error)) => {
                tracing::warn!(stage = error.stage(), %error, "Question answering failed")
            }
            None => tracing::debug!("No question supplied"),
        }

        Ok(PassReport {
            pass_id,
            fingerprint,
            format,
            file_name: document.file_name().map(str::to_string),
            text,
            preview,
            summary,
            answer,
        })
    }

    fn halt(&self, error: PipelineError) -> PipelineError {
        self.metrics.record_extraction_failure();
        tracing::warn!(stage = error.stage(), %error, "Pass halted");
        error
    }

    /// Current pipeline counters.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl PipelineApi for Pipeline {
    async fn process(
        &self,
        document: UploadedDocument,
        question: Option<String>,
    ) -> Result<PassReport, PipelineError> {
        Pipeline::process(self, document, question.as_deref()).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        Pipeline::metrics_snapshot(self)
    }
}
