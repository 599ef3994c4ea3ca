//! High-level orchestration for the lecture pipeline.

use std::{fmt, sync::Arc};

use anyhow::{Context, Result};
use lectern_evidence::{
    attribute, AnnotatedOutline, Attribution, AttributionReport, StructuredOutline,
};
use lectern_logging::LogLevel;
use serde_json::json;

use crate::{
    config::LecternConfig,
    ingestion::{
        DocumentIngestor, DocumentText, IngestionError, PdfTextExtractor, TextExtractor,
        UploadedDocument,
    },
    library::{CourseLibrary, LibraryUpdate},
    response::ProcessResponse,
    structuring::{parse_completion, ParsedOutline, StructuringClient, StructuringRequest},
    telemetry::LectureTelemetry,
};

/// Output of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedLecture {
    /// Document text the offsets refer to.
    pub document: DocumentText,
    /// Outline annotated with evidence.
    pub outline: AnnotatedOutline,
    /// Attribution counts.
    pub report: AttributionReport,
    /// True when the model reply was unreadable and defaults were used.
    pub degraded_outline: bool,
}

/// Runtime for the ingest → structure → attribute → curate workflow.
#[derive(Clone)]
pub struct LectureRuntime {
    config: LecternConfig,
    ingestor: DocumentIngestor,
    structurer: Arc<dyn StructuringClient>,
    library: CourseLibrary,
    telemetry: Option<LectureTelemetry>,
}

impl fmt::Debug for LectureRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LectureRuntime")
            .field("config", &self.config)
            .field("ingestor", &self.ingestor)
            .field("courses", &self.library.len())
            .field("telemetry", &self.telemetry)
            .finish_non_exhaustive()
    }
}

impl LectureRuntime {
    /// Creates a runtime extracting PDFs with `pdf-extract`.
    #[must_use]
    pub fn new(config: LecternConfig, structurer: Arc<dyn StructuringClient>) -> Self {
        let ingestor =
            DocumentIngestor::new(Arc::new(PdfTextExtractor), config.ingestion.max_chars);
        Self {
            config,
            ingestor,
            structurer,
            library: CourseLibrary::default(),
            telemetry: None,
        }
    }

    /// Replaces the text extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.ingestor = DocumentIngestor::new(extractor, self.config.ingestion.max_chars);
        self
    }

    /// Attaches telemetry sinks.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: LectureTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Accesses the telemetry handle.
    #[must_use]
    pub const fn telemetry(&self) -> Option<&LectureTelemetry> {
        self.telemetry.as_ref()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &LecternConfig {
        &self.config
    }

    /// Shared course library (clones share state).
    #[must_use]
    pub fn library(&self) -> CourseLibrary {
        self.library.clone()
    }

    /// Validates an upload and extracts its text.
    ///
    /// # Errors
    /// Propagates [`IngestionError`].
    pub fn ingest(&self, upload: &UploadedDocument) -> Result<DocumentText, IngestionError> {
        self.log(
            LogLevel::Info,
            "lecture.ingest.start",
            json!({ "file": upload.file_name, "bytes": upload.bytes.len() }),
        );
        match self.ingestor.ingest(upload) {
            Ok(document) => {
                self.log(
                    LogLevel::Info,
                    "lecture.ingest.complete",
                    json!({
                        "chars": document.char_len(),
                        "original_chars": document.original_chars(),
                        "truncated": document.is_truncated(),
                    }),
                );
                Ok(document)
            }
            Err(err) => {
                self.log(
                    LogLevel::Warn,
                    "lecture.ingest.failed",
                    json!({ "file": upload.file_name, "error": err.to_string() }),
                );
                Err(err)
            }
        }
    }

    /// Asks the structuring collaborator for an outline of `document`.
    ///
    /// # Errors
    /// Fails when the provider call fails. Unreadable replies are not errors.
    pub async fn structure(&self, document: &DocumentText) -> Result<ParsedOutline> {
        let request = StructuringRequest::new(&self.config.structuring.model, document.as_str());
        self.log(
            LogLevel::Info,
            "lecture.structure.start",
            json!({ "model": request.model, "chars": document.char_len() }),
        );
        let content = match self.structurer.complete(&request).await {
            Ok(content) => content,
            Err(err) => {
                self.log(
                    LogLevel::Error,
                    "lecture.structure.failed",
                    json!({ "error": err.to_string() }),
                );
                return Err(err).context("structuring request failed");
            }
        };
        let parsed = parse_completion(&content, &self.config.outline_defaults());
        if parsed.degraded {
            self.log(
                LogLevel::Warn,
                "lecture.structure.degraded",
                json!({ "reply_chars": content.chars().count() }),
            );
        }
        self.log(
            LogLevel::Info,
            "lecture.structure.complete",
            json!({
                "course": parsed.outline.course_name,
                "modules": parsed.outline.modules.len(),
                "concepts": parsed.outline.concept_count(),
            }),
        );
        Ok(parsed)
    }

    /// Attaches evidence from `document` to `outline`.
    #[must_use]
    pub fn attribute(&self, document: &DocumentText, outline: &StructuredOutline) -> Attribution {
        self.log(
            LogLevel::Debug,
            "lecture.attribute.start",
            json!({ "concepts": outline.concept_count() }),
        );
        let attribution = attribute(document.as_str(), outline);
        let report = attribution.report;
        self.log(
            LogLevel::Info,
            "lecture.attribute.complete",
            json!({
                "concepts": report.concepts,
                "anchored": report.anchored,
                "token_fallbacks": report.token_fallbacks,
                "ai_authored": report.ai_authored,
            }),
        );
        attribution
    }

    /// Runs the full pipeline on an upload.
    ///
    /// # Errors
    /// Fails on rejected uploads, extraction failures and provider failures.
    pub async fn process(&self, upload: &UploadedDocument) -> Result<ProcessedLecture> {
        let document = self.ingest(upload)?;
        self.process_document(document).await
    }

    /// Runs structuring and attribution on already extracted text. The text
    /// is cut to the configured char cap first.
    ///
    /// # Errors
    /// Fails when the provider call fails.
    pub async fn process_text(&self, text: &str) -> Result<ProcessedLecture> {
        let document = DocumentText::new(text, self.ingestor.max_chars());
        self.process_document(document).await
    }

    async fn process_document(&self, document: DocumentText) -> Result<ProcessedLecture> {
        let parsed = self.structure(&document).await?;
        let Attribution { outline, report } = self.attribute(&document, &parsed.outline);
        Ok(ProcessedLecture {
            document,
            outline,
            report,
            degraded_outline: parsed.degraded,
        })
    }

    /// Runs the pipeline and renders the outcome as a response envelope.
    /// Rejected uploads keep their own message; other failures are reported
    /// as `Failed to process PDF: <error>`.
    pub async fn respond(&self, upload: &UploadedDocument) -> ProcessResponse {
        match self.process(upload).await {
            Ok(lecture) => ProcessResponse::success(lecture.outline),
            Err(err) => ProcessResponse::from_error(&err),
        }
    }

    /// Files a processed lecture into the course library.
    pub fn curate(&self, lecture: &ProcessedLecture) -> LibraryUpdate {
        let update = self.library.add_lecture(&lecture.outline);
        self.log(
            LogLevel::Info,
            "lecture.curate.complete",
            json!({
                "course_id": update.course_id,
                "lecture_id": update.lecture_id,
                "created_course": update.created_course,
            }),
        );
        update
    }

    fn log(&self, level: LogLevel, message: &str, metadata: serde_json::Value) {
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(level, message, metadata);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structuring::{StaticStructuringClient, StructuringError};
    use async_trait::async_trait;
    use lectern_evidence::DefinitionSource;
    use lectern_logging::read_records;
    use serde_json::Value;
    use tempfile::tempdir;

    struct Utf8Extractor;

    impl TextExtractor for Utf8Extractor {
        fn extract(&self, bytes: &[u8]) -> Result<String, IngestionError> {
            String::from_utf8(bytes.to_vec())
                .map_err(|err| IngestionError::Extraction(err.to_string()))
        }
    }

    struct FailingClient;

    #[async_trait]
    impl StructuringClient for FailingClient {
        async fn complete(
            &self,
            _request: &StructuringRequest,
        ) -> Result<String, StructuringError> {
            Err(StructuringError::Provider("quota exceeded".into()))
        }
    }

    const LECTURE: &str = "Lecture 3\nPipeline hazards stall the CPU.\nForwarding avoids stalls.";

    fn reply() -> Value {
        json!({
            "courseName": "Computer Architecture",
            "lectureTitle": "Pipelining",
            "modules": [{
                "title": "Hazards",
                "concepts": [
                    { "name": "Forwarding", "description": "bypass" },
                    { "name": "Scoreboard", "description": "tracks hazards" }
                ]
            }]
        })
    }

    fn build_runtime(client: Arc<dyn StructuringClient>) -> LectureRuntime {
        LectureRuntime::new(LecternConfig::default(), client)
            .with_extractor(Arc::new(Utf8Extractor))
    }

    #[tokio::test]
    async fn processes_an_upload_end_to_end() {
        let runtime = build_runtime(Arc::new(StaticStructuringClient::from_json(&reply())));
        let lecture = runtime
            .process(&UploadedDocument::pdf("lecture3.pdf", LECTURE))
            .await
            .unwrap();

        assert!(!lecture.degraded_outline);
        assert_eq!(lecture.report.concepts, 2);
        assert_eq!(lecture.report.anchored, 1);
        let concepts: Vec<_> = lecture.outline.concepts().collect();
        assert_eq!(concepts[0].evidence.text(), "Forwarding avoids stalls.");
        assert_eq!(concepts[0].evidence.source(), DefinitionSource::Pdf);
        assert_eq!(concepts[1].evidence.text(), "tracks hazards");

        let update = runtime.curate(&lecture);
        assert!(update.created_course);
        let again = runtime.curate(&lecture);
        assert_eq!(again.course_id, update.course_id);
        assert_eq!(runtime.library().len(), 1);
    }

    #[tokio::test]
    async fn unreadable_replies_fall_back_to_placeholders() {
        let runtime = build_runtime(Arc::new(StaticStructuringClient::new("not json")));
        let lecture = runtime.process_text(LECTURE).await.unwrap();
        assert!(lecture.degraded_outline);
        assert_eq!(lecture.outline.course_name, "未命名课程");
        assert_eq!(lecture.report.concepts, 0);
    }

    #[tokio::test]
    async fn process_text_applies_the_char_cap() {
        let config = LecternConfig::from_toml_str("[ingestion]\nmax_chars = 9\n").unwrap();
        let runtime = LectureRuntime::new(
            config,
            Arc::new(StaticStructuringClient::from_json(&reply())),
        );
        let lecture = runtime.process_text(LECTURE).await.unwrap();
        assert_eq!(lecture.document.as_str(), "Lecture 3");
        assert_eq!(lecture.report.ai_authored, 2);
    }

    #[tokio::test]
    async fn responses_carry_rejections_and_failures() {
        let runtime = build_runtime(Arc::new(StaticStructuringClient::from_json(&reply())));
        let ok = runtime
            .respond(&UploadedDocument::pdf("lecture3.pdf", LECTURE))
            .await;
        assert!(ok.is_success());
        assert_eq!(ok.data.unwrap().lecture_title, "Pipelining");

        let empty = runtime
            .respond(&UploadedDocument::pdf("empty.pdf", Vec::<u8>::new()))
            .await;
        assert_eq!(empty.message.as_deref(), Some("No file uploaded"));

        let text = runtime
            .respond(&UploadedDocument::new("notes.txt", "text/plain", "hello"))
            .await;
        assert_eq!(text.message.as_deref(), Some("Only PDF files are allowed"));

        let broken = runtime
            .respond(&UploadedDocument::pdf("broken.pdf", vec![0xff_u8, 0xfe]))
            .await;
        assert!(broken
            .message
            .unwrap()
            .starts_with("Failed to process PDF: text extraction failed"));

        let failing = build_runtime(Arc::new(FailingClient));
        let failed = failing
            .respond(&UploadedDocument::pdf("lecture3.pdf", LECTURE))
            .await;
        let message = failed.message.unwrap();
        assert!(message.starts_with("Failed to process PDF: structuring request failed"));
        assert!(message.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn stages_are_logged() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("lecture.log");
        let telemetry = LectureTelemetry::builder("lecture")
            .log_path(&log_path)
            .build()
            .unwrap();
        let runtime = build_runtime(Arc::new(StaticStructuringClient::new("{")))
            .with_telemetry(telemetry);
        runtime
            .process(&UploadedDocument::pdf("lecture3.pdf", LECTURE))
            .await
            .unwrap();

        let messages: Vec<_> = read_records(&log_path)
            .unwrap()
            .into_iter()
            .map(|record| record.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "lecture.ingest.start",
                "lecture.ingest.complete",
                "lecture.structure.start",
                "lecture.structure.degraded",
                "lecture.structure.complete",
                "lecture.attribute.complete",
            ]
        );
    }
}
