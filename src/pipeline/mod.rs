//! Document pipeline: extraction followed by summarization and optional question answering.

mod service;
pub mod types;

pub use service::{Pipeline, PipelineApi};
pub use types::{AnswerResult, ExtractedText, PassReport, PipelineError, SummaryResult};
