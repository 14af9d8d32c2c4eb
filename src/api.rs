//! HTTP surface for Rusty Digest.
//!
//! This module exposes a compact Axum router:
//!
//! - `POST /analyze` – Multipart upload (`file` part plus optional `question` text part). The
//!   `file` part's content type is the declared MIME type. Returns the preview, the summary block,
//!   and the answer block when a question was supplied.
//! - `GET /metrics` – Pass counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! Every failure is reported as `An error occurred: <message>`. Extraction failures halt the pass
//! and return `422`; summary and answer failures are reported per block inside a `200` body.

use crate::extraction::UploadedDocument;
use crate::metrics::MetricsSnapshot;
use crate::pipeline::{AnswerResult, PassReport, PipelineApi, PipelineError, SummaryResult};
use crate::render;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

const FALLBACK_MIME: &str = "application/octet-stream";

/// Build the HTTP router exposing the document pipeline.
pub fn create_router<S>(service: Arc<S>, max_upload_bytes: usize) -> Router
where
    S: PipelineApi + 'static,
{
    Router::new()
        .route("/analyze", post(analyze_document::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(service)
}

/// Success response for `POST /analyze`.
#[derive(Serialize)]
struct AnalyzeResponse {
    /// Identifier of the processing pass, matching the server logs.
    pass_id: String,
    /// Client-supplied file name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    file_name: Option<String>,
    /// Canonical MIME type of the recognized format.
    format: &'static str,
    /// Hex SHA-256 of the uploaded bytes.
    fingerprint: String,
    /// RFC 3339 timestamp of when the pass finished.
    processed_at: String,
    /// Bounded text preview, always ending in `...`.
    preview: String,
    /// Summary block.
    summary: Block<SummaryBody>,
    /// Answer block; omitted when no question was asked.
    #[serde(skip_serializing_if = "Option::is_none")]
    answer: Option<Block<AnswerBody>>,
}

/// Either a stage's output or its rendered error.
#[derive(Serialize)]
#[serde(untagged)]
enum Block<T> {
    Ready(T),
    Failed { error: String },
}

#[derive(Serialize)]
struct SummaryBody {
    text: String,
}

#[derive(Serialize)]
struct AnswerBody {
    question: String,
    text: String,
    confidence: f64,
    /// Confidence formatted to two decimals, as shown to users.
    confidence_display: String,
}

impl From<PassReport> for AnalyzeResponse {
    fn from(report: PassReport) -> Self {
        Self {
            pass_id: report.pass_id.to_string(),
            file_name: report.file_name,
            format: report.format.mime_type(),
            fingerprint: report.fingerprint,
            processed_at: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            preview: report.preview,
            summary: summary_block(report.summary),
            answer: report.answer.map(answer_block),
        }
    }
}

fn summary_block(summary: Result<SummaryResult, PipelineError>) -> Block<SummaryBody> {
    match summary {
        Ok(result) => Block::Ready(SummaryBody {
            text: result.summary,
        }),
        Err(error) => Block::Failed {
            error: render::error_message(&error),
        },
    }
}

fn answer_block(answer: Result<AnswerResult, PipelineError>) -> Block<AnswerBody> {
    match answer {
        Ok(result) => Block::Ready(AnswerBody {
            confidence_display: render::confidence(result.confidence),
            question: result.question,
            text: result.answer,
            confidence: result.confidence,
        }),
        Err(error) => Block::Failed {
            error: render::error_message(&error),
        },
    }
}

/// Run one pass over the uploaded document.
async fn analyze_document<S>(
    State(service): State<Arc<S>>,
    multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError>
where
    S: PipelineApi,
{
    let (document, question) = read_upload(multipart).await?;
    let report = service.process(document, question).await?;
    tracing::info!(pass_id = %report.pass_id, "Analyze request completed");
    Ok(Json(AnalyzeResponse::from(report)))
}

/// Pull the `file` and optional `question` parts out of the form.
async fn read_upload(
    mut multipart: Multipart,
) -> Result<(UploadedDocument, Option<String>), AppError> {
    let mut document = None;
    let mut question = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let mime_type = field
                    .content_type()
                    .unwrap_or(FALLBACK_MIME)
                    .to_string();
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;
                let mut upload = UploadedDocument::new(bytes.to_vec(), mime_type);
                if let Some(file_name) = file_name {
                    upload = upload.with_file_name(file_name);
                }
                document = Some(upload);
            }
            Some("question") => {
                question = Some(field.text().await?);
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unknown multipart field");
            }
        }
    }

    let document = document.ok_or_else(|| {
        AppError::BadRequest("multipart form is missing the 'file' part".to_string())
    })?;
    Ok((document, question))
}

/// Response body for `GET /metrics`.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: PipelineApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "analyze",
                method: "POST",
                path: "/analyze",
                description: "Upload a PDF, DOCX, or TXT file as multipart part 'file' (its content type is the declared format) with an optional 'question' part. Returns { \"preview\", \"summary\", \"answer\" }.",
                request_example: Some(json!({
                    "file": "@report.pdf;type=application/pdf",
                    "question": "What is the main finding?"
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return pass counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

enum AppError {
    BadRequest(String),
    Upload(StatusCode, String),
    Pipeline(PipelineError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, render::error_message(&message)),
            Self::Upload(status, message) => (status, render::error_message(&message)),
            Self::Pipeline(error) => {
                let status = match error {
                    PipelineError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, render::error_message(&error))
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(inner: PipelineError) -> Self {
        Self::Pipeline(inner)
    }
}

impl From<MultipartError> for AppError {
    fn from(inner: MultipartError) -> Self {
        Self::Upload(inner.status(), inner.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::{create_router, get_commands};
    use crate::extraction::{ExtractionError, UploadedDocument};
    use crate::inference::InferenceError;
    use crate::metrics::MetricsSnapshot;
    use crate::pipeline::{
        AnswerResult, ExtractedText, PassReport, PipelineApi, PipelineError, SummaryResult,
    };
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;
    use uuid::Uuid;

    const BOUNDARY: &str = "digest-boundary";

    #[derive(Clone, Debug)]
    struct AnalyzeCall {
        mime_type: String,
        file_name: Option<String>,
        bytes: Vec<u8>,
        question: Option<String>,
    }

    #[derive(Clone, Default)]
    struct StubPipeline {
        calls: Arc<Mutex<Vec<AnalyzeCall>>>,
        fail_summary: bool,
    }

    impl StubPipeline {
        async fn recorded_calls(&self) -> Vec<AnalyzeCall> {
            self.calls.lock().await.clone()
        }
    }

    #[async_trait]
    impl PipelineApi for StubPipeline {
        async fn process(
            &self,
            document: UploadedDocument,
            question: Option<String>,
        ) -> Result<PassReport, PipelineError> {
            self.calls.lock().await.push(AnalyzeCall {
                mime_type: document.mime_type().to_string(),
                file_name: document.file_name().map(str::to_string),
                bytes: document.bytes().to_vec(),
                question: question.clone(),
            });
            let format = document.format()?;
            let text = String::from_utf8_lossy(document.bytes()).into_owned();
            let summary = if self.fail_summary {
                Err(PipelineError::Summarization(InferenceError::InferenceFailed(
                    "sequence too long".into(),
                )))
            } else {
                Ok(SummaryResult {
                    summary: "Colors of nature.".into(),
                })
            };
            Ok(PassReport {
                pass_id: Uuid::new_v4(),
                fingerprint: document.fingerprint(),
                format,
                file_name: document.file_name().map(str::to_string),
                preview: format!("{text}..."),
                text: ExtractedText::new(text),
                summary,
                answer: question.map(|question| {
                    Ok(AnswerResult {
                        question,
                        answer: "green".into(),
                        confidence: 0.8712,
                    })
                }),
            })
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                passes_started: 3,
                extraction_failures: 1,
                summaries_generated: 2,
                summary_failures: 0,
                questions_answered: 1,
                answer_failures: 0,
            }
        }
    }

    fn multipart_body(file: Option<(&str, &str, &str)>, question: Option<&str>) -> String {
        let mut body = String::new();
        if let Some((file_name, content_type, contents)) = file {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n{contents}\r\n"
            ));
        }
        if let Some(question) = question {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"question\"\r\n\r\n{question}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    async fn post_analyze(
        service: Arc<StubPipeline>,
        body: String,
    ) -> (StatusCode, serde_json::Value) {
        let app = create_router(service, 1024 * 1024);
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/analyze")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={BOUNDARY}"),
                    )
                    .body(Body::from(body))
                    .expect("request"),
            )
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = serde_json::from_slice(&bytes).expect("json body");
        (status, json)
    }

    #[tokio::test]
    async fn commands_catalog_exposes_analyze_endpoint() {
        let response = get_commands().await;
        let commands = response.0.commands;
        let analyze = commands
            .iter()
            .find(|cmd| cmd.name == "analyze")
            .expect("analyze command present");

        assert_eq!(analyze.method, "POST");
        assert_eq!(analyze.path, "/analyze");
        assert!(analyze.description.contains("multipart"));
        assert!(commands.len() >= 2);
    }

    #[tokio::test]
    async fn analyze_route_forwards_declared_type_and_question() {
        let service = Arc::new(StubPipeline::default());
        let body = multipart_body(
            Some(("notes.txt", "text/plain", "The sky is blue. Grass is green.")),
            Some("What color is the grass?"),
        );

        let (status, json) = post_analyze(service.clone(), body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["preview"], "The sky is blue. Grass is green....");
        assert_eq!(json["format"], "text/plain");
        assert_eq!(json["file_name"], "notes.txt");
        assert_eq!(json["summary"]["text"], "Colors of nature.");
        assert_eq!(json["answer"]["text"], "green");
        assert_eq!(json["answer"]["confidence_display"], "0.87");

        let calls = service.recorded_calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].mime_type, "text/plain");
        assert_eq!(calls[0].file_name.as_deref(), Some("notes.txt"));
        assert_eq!(calls[0].bytes, b"The sky is blue. Grass is green.");
        assert_eq!(
            calls[0].question.as_deref(),
            Some("What color is the grass?")
        );
    }

    #[tokio::test]
    async fn analyze_route_omits_answer_without_question() {
        let service = Arc::new(StubPipeline::default());
        let body = multipart_body(Some(("a.txt", "text/plain", "Hello")), None);

        let (status, json) = post_analyze(service, body).await;

        assert_eq!(status, StatusCode::OK);
        assert!(json.get("answer").is_none());
        assert_eq!(json["summary"]["text"], "Colors of nature.");
    }

    #[tokio::test]
    async fn summary_failure_is_reported_in_block() {
        let service = Arc::new(StubPipeline {
            fail_summary: true,
            ..StubPipeline::default()
        });
        let body = multipart_body(Some(("a.txt", "text/plain", "Hello")), Some("Who?"));

        let (status, json) = post_analyze(service, body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["summary"]["error"],
            "An error occurred: Model inference failed: sequence too long"
        );
        assert_eq!(json["answer"]["text"], "green");
    }

    #[tokio::test]
    async fn unsupported_type_returns_unprocessable_entity() {
        let service = Arc::new(StubPipeline::default());
        let body = multipart_body(Some(("image.png", "image/png", "binary")), None);

        let (status, json) = post_analyze(service, body).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let message = json["error"].as_str().expect("error message");
        assert!(message.starts_with("An error occurred: Unsupported file type 'image/png'"));
    }

    #[tokio::test]
    async fn missing_file_part_is_bad_request() {
        let service = Arc::new(StubPipeline::default());
        let body = multipart_body(None, Some("Anything?"));

        let (status, json) = post_analyze(service.clone(), body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().expect("error").contains("'file'"));
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn oversized_upload_is_payload_too_large() {
        let service = Arc::new(StubPipeline::default());
        let app = create_router(service.clone(), 64);
        let contents = "a".repeat(256);
        let body = multipart_body(Some(("big.txt", "text/plain", &contents)), None);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/analyze")
                    .header(
                        "content-type",
                        format!("multipart/form-data; boundary={BOUNDARY}"),
                    )
                    .body(Body::from(body))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        let message = json["error"].as_str().expect("error message");
        assert!(message.starts_with("An error occurred: "));
        assert!(service.recorded_calls().await.is_empty());
    }

    #[tokio::test]
    async fn metrics_route_returns_snapshot() {
        let app = create_router(Arc::new(StubPipeline::default()), 1024);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["passes_started"], 3);
        assert_eq!(json["extraction_failures"], 1);
    }

    #[test]
    fn extraction_error_maps_to_pipeline_error() {
        let error: PipelineError = ExtractionError::UnsupportedFormat("x/y".into()).into();
        assert_eq!(error.stage(), "extract");
    }
}
