//! Formatting for the user-facing text blocks: preview, summary, and answer.

use crate::pipeline::{AnswerResult, PassReport, PipelineError, SummaryResult};
use std::fmt::{self, Write as _};

/// Suffix appended to every preview, truncated or not.
pub const ELLIPSIS: &str = "...";

/// First `max_chars` characters of `text` followed by [`ELLIPSIS`].
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut preview: String = text.chars().take(max_chars).collect();
    preview.push_str(ELLIPSIS);
    preview
}

/// Uniform user-facing message for any error.
pub fn error_message(error: &dyn fmt::Display) -> String {
    format!("An error occurred: {error}")
}

/// Confidence formatted to two decimal places.
pub fn confidence(value: f64) -> String {
    format!("{value:.2}")
}

/// Render a summary outcome as display text.
pub fn summary_block(summary: &Result<SummaryResult, PipelineError>) -> String {
    match summary {
        Ok(result) => result.summary.clone(),
        Err(error) => error_message(error),
    }
}

/// Render an answer outcome as display text.
pub fn answer_block(answer: &Result<AnswerResult, PipelineError>) -> String {
    match answer {
        Ok(result) => format!(
            "**{}**\nConfidence: {}",
            result.answer,
            confidence(result.confidence)
        ),
        Err(error) => error_message(error),
    }
}

/// Render a whole pass as the plain-text page shown by the command line client.
pub fn render_report(report: &PassReport) -> String {
    let mut page = String::new();
    let _ = writeln!(page, "Extracted Document Text:");
    let _ = writeln!(page, "{}", report.preview);
    let _ = writeln!(page);
    let _ = writeln!(page, "Summary of the Document:");
    let _ = writeln!(page, "{}", summary_block(&report.summary));
    if let Some(answer) = report.answer.as_ref() {
        let _ = writeln!(page);
        let _ = writeln!(page, "Answer:");
        let _ = writeln!(page, "{}", answer_block(answer));
    }
    page
}
