//! Values produced by a processing pass.

use crate::extraction::{DocumentFormat, ExtractionError};
use crate::inference::InferenceError;
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by any stage of the pipeline.
///
/// The message of each variant is the underlying error's message so presentation layers can show
/// every failure the same way.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The upload could not be turned into text; the pass halts.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// The summarization model failed on the extracted text.
    #[error(transparent)]
    Summarization(InferenceError),
    /// The question-answering model failed on the question and extracted text.
    #[error(transparent)]
    QuestionAnswering(InferenceError),
}

impl PipelineError {
    /// Stage that produced the error, for logging.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Extraction(_) => "extract",
            Self::Summarization(_) => "summarize",
            Self::QuestionAnswering(_) => "answer",
        }
    }
}

/// Plain text extracted from an upload. Exists only when extraction succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    /// Borrow the full text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in characters.
    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }
}

/// Abstractive summary of the extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResult {
    /// Generated summary.
    pub summary: String,
}

/// Extractive answer to a user question.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerResult {
    /// The question as supplied by the user.
    pub question: String,
    /// Span of the extracted text that answers the question.
    pub answer: String,
    /// Model confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Everything a single pass produced once extraction succeeded.
///
/// Summary and answer outcomes are independent: a failed summary does not prevent an answer.
#[derive(Debug)]
pub struct PassReport {
    /// Identifier attached to every log line of the pass.
    pub pass_id: Uuid,
    /// Hex SHA-256 of the uploaded bytes.
    pub fingerprint: String,
    /// Format the upload was declared as.
    pub format: DocumentFormat,
    /// Client-supplied file name, if any.
    pub file_name: Option<String>,
    /// Full extracted text, kept so follow-up questions can reuse it.
    pub text: ExtractedText,
    /// Bounded preview of the extracted text, always ending in an ellipsis.
    pub preview: String,
    /// Outcome of the summarization stage.
    pub summary: Result<SummaryResult, PipelineError>,
    /// Outcome of the question-answering stage; `None` when no question was asked.
    pub answer: Option<Result<AnswerResult, PipelineError>>,
}
