use async_trait::async_trait;
use lectern_evidence::{OutlineDefaults, StructuredOutline};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// System instructions sent with every document.
pub const STRUCTURING_INSTRUCTIONS: &str = r#"You are a course architect. Rebuild a clean knowledge tree from messy lecture notes.
Step 1: identify the course name and the topic of this lecture.
Step 2: follow the logical flow of the text. When there are no explicit section headings, group the material into 3-5 core modules by meaning. Never create catch-all modules such as "Other" or "Misc"; every module needs a meaningful summarizing title.
Step 3: under each module, extract the atomic concepts of the document (concepts, algorithms, formulas and so on).
Keep the original meaning: quote module titles from the text when possible, otherwise summarize at a high level.
Reply with strict JSON only, shaped as:
{
  "courseName": string,
  "lectureTitle": string,
  "modules": [
    { "title": string, "concepts": [ { "name": string, "description": string } ] }
  ]
}"#;

/// One structuring call: instructions plus the document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuringRequest {
    /// Model identifier.
    pub model: String,
    /// System instructions.
    pub instructions: String,
    /// Truncated document text.
    pub document: String,
}

impl StructuringRequest {
    /// Builds a request with the standard instructions.
    #[must_use]
    pub fn new(model: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            instructions: STRUCTURING_INSTRUCTIONS.to_owned(),
            document: document.into(),
        }
    }
}

/// Errors emitted by structuring providers.
#[derive(Debug, Error)]
pub enum StructuringError {
    /// The provider call failed.
    #[error("provider error: {0}")]
    Provider(String),
}

/// Language-model collaborator returning the raw JSON content of its reply.
#[async_trait]
pub trait StructuringClient: Send + Sync {
    /// Runs one structuring request.
    async fn complete(&self, request: &StructuringRequest) -> Result<String, StructuringError>;
}

/// Client that replies with fixed content, for tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct StaticStructuringClient {
    content: String,
}

impl StaticStructuringClient {
    /// Replies with `content` to every request.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Replies with the JSON encoding of `value`.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        Self::new(value.to_string())
    }
}

#[async_trait]
impl StructuringClient for StaticStructuringClient {
    async fn complete(&self, _request: &StructuringRequest) -> Result<String, StructuringError> {
        Ok(self.content.clone())
    }
}

/// Outline parsed from a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOutline {
    /// Outline with defaults applied.
    pub outline: StructuredOutline,
    /// True when the completion was not valid JSON and `{}` was used instead.
    pub degraded: bool,
}

/// Parses completion content leniently: empty content is read as `{}`, and
/// invalid JSON degrades to `{}`, so the outline defaults always apply.
#[must_use]
pub fn parse_completion(content: &str, defaults: &OutlineDefaults) -> ParsedOutline {
    let content = if content.trim().is_empty() {
        "{}"
    } else {
        content
    };
    let (value, degraded) = match serde_json::from_str::<Value>(content) {
        Ok(value) => (value, false),
        Err(_) => (Value::Object(serde_json::Map::new()), true),
    };
    ParsedOutline {
        outline: StructuredOutline::from_value(&value, defaults),
        degraded,
    }
}
