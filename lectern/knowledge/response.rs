use lectern_evidence::AnnotatedOutline;
use serde::{Deserialize, Serialize};

use crate::ingestion::IngestionError;

/// Envelope returned to the upload surface.
///
/// Success carries the annotated outline in `data`; failure carries a
/// human-readable `message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResponse {
    /// Whether processing succeeded.
    pub success: bool,
    /// Annotated outline on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AnnotatedOutline>,
    /// Error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProcessResponse {
    /// Successful response.
    #[must_use]
    pub const fn success(data: AnnotatedOutline) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// Failed response.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Failed response for a pipeline error. Rejected uploads keep their own
    /// message; anything else is reported as `Failed to process PDF: <error>`.
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<IngestionError>() {
            Some(rejection) if rejection.is_rejection() => Self::failure(rejection.to_string()),
            _ => Self::failure(format!("Failed to process PDF: {err:#}")),
        }
    }

    /// True for a successful response.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }
}
