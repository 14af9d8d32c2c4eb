//! Word (`.docx`) extraction backed by `docx-rs`.
//!
//! Only paragraphs that are direct children of the document body count. Paragraphs inside
//! tables or other containers are skipped.

use super::{DocumentFormat, ExtractionError, malformed};
use docx_rs::{DocumentChild, ParagraphChild, Run, RunChild};

/// Join the body paragraphs of a `.docx` package with `\n`.
pub(super) fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let docx = docx_rs::read_docx(bytes).map_err(|error| malformed(DocumentFormat::Docx, error))?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(paragraph) => {
                let mut text = String::new();
                push_paragraph_text(&paragraph.children, &mut text);
                Some(text)
            }
            _ => None,
        })
        .collect();
    tracing::debug!(paragraphs = paragraphs.len(), "Read DOCX body");

    Ok(paragraphs.join("\n"))
}

/// Append the visible text of a paragraph's runs, descending into hyperlinks.
fn push_paragraph_text(children: &[ParagraphChild], text: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => push_run_text(run, text),
            ParagraphChild::Hyperlink(link) => push_paragraph_text(&link.children, text),
            _ => {}
        }
    }
}

fn push_run_text(run: &Run, text: &mut String) {
    for child in &run.children {
        match child {
            RunChild::Text(segment) => text.push_str(&segment.text),
            RunChild::Tab(_) => text.push('\t'),
            RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }
}
