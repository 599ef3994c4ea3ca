#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Lecture ingestion, structuring and curation around the evidence engine.

/// TOML configuration.
#[path = "../config.rs"]
pub mod config;

/// Upload validation and PDF text extraction.
#[path = "../ingestion.rs"]
pub mod ingestion;

/// Structuring collaborator boundary.
#[path = "../structuring.rs"]
pub mod structuring;

/// In-memory course library.
#[path = "../library/main.rs"]
pub mod library;

/// Upload response envelope.
#[path = "../response.rs"]
pub mod response;

/// Telemetry helpers.
#[path = "../telemetry.rs"]
pub mod telemetry;

/// High-level orchestration entry point.
#[path = "../main.rs"]
pub mod orchestration_entry;

pub use config::{
    IngestionSettings, LecternConfig, OutlineSettings, StructuringSettings, TelemetrySettings,
};
pub use ingestion::{
    DocumentIngestor, DocumentText, IngestionError, PdfTextExtractor, TextExtractor,
    UploadedDocument, DEFAULT_MAX_CHARS, PDF_CONTENT_TYPE,
};
pub use library::{
    normalize_course_name, Course, CourseLibrary, Lecture, LibraryConcept, LibraryModule,
    LibraryUpdate,
};
pub use orchestration_entry::{LectureRuntime, ProcessedLecture};
pub use response::ProcessResponse;
pub use structuring::{
    parse_completion, ParsedOutline, StaticStructuringClient, StructuringClient,
    StructuringError, StructuringRequest, STRUCTURING_INSTRUCTIONS,
};
pub use telemetry::{LectureTelemetry, LectureTelemetryBuilder};
