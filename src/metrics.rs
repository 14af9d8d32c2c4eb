use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing pipeline activity since startup.
#[derive(Default)]
pub struct PipelineMetrics {
    passes_started: AtomicU64,
    extraction_failures: AtomicU64,
    summaries_generated: AtomicU64,
    summary_failures: AtomicU64,
    questions_answered: AtomicU64,
    answer_failures: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a processing pass.
    pub fn record_pass(&self) {
        self.passes_started.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a pass halted by the extractor.
    pub fn record_extraction_failure(&self) {
        self.extraction_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of a summarization call.
    pub fn record_summary(&self, succeeded: bool) {
        let counter = if succeeded {
            &self.summaries_generated
        } else {
            &self.summary_failures
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of a question-answering call.
    pub fn record_answer(&self, succeeded: bool) {
        let counter = if succeeded {
            &self.questions_answered
        } else {
            &self.answer_failures
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            passes_started: self.passes_started.load(Ordering::Relaxed),
            extraction_failures: self.extraction_failures.load(Ordering::Relaxed),
            summaries_generated: self.summaries_generated.load(Ordering::Relaxed),
            summary_failures: self.summary_failures.load(Ordering::Relaxed),
            questions_answered: self.questions_answered.load(Ordering::Relaxed),
            answer_failures: self.answer_failures.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Uploads that entered the pipeline.
    pub passes_started: u64,
    /// Uploads rejected by the extractor.
    pub extraction_failures: u64,
    /// Successful summarization calls.
    pub summaries_generated: u64,
    /// Failed summarization calls.
    pub summary_failures: u64,
    /// Successful question-answering calls.
    pub questions_answered: u64,
    /// Failed question-answering calls.
    pub answer_failures: u64,
}
