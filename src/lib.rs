#![deny(missing_docs)]

//! Core library for Rusty Digest: document text extraction, summarization, and extractive
//! question answering.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Text extraction for PDF, DOCX, and plain text uploads.
pub mod extraction;
/// Summarization and question-answering model clients.
pub mod inference;
/// Structured logging and tracing setup.
pub mod logging;
/// Pipeline activity counters.
pub mod metrics;
/// Orchestration of extraction and inference stages.
pub mod pipeline;
/// User-facing text blocks.
pub mod render;
