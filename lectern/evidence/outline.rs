use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::normalizer::normalize_text;

/// Keys searched, in order, for a concept's description.
pub const DESCRIPTION_KEYS: &[&str] = &["description", "summary", "definition"];

/// Placeholders used when the model leaves out the course or lecture name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineDefaults {
    /// Used for an absent, empty or non-string `courseName`.
    pub course_placeholder: String,
    /// Used for an absent, empty or non-string `lectureTitle`.
    pub lecture_placeholder: String,
}

impl Default for OutlineDefaults {
    fn default() -> Self {
        Self {
            course_placeholder: "未命名课程".into(),
            lecture_placeholder: "未命名主题".into(),
        }
    }
}

/// Concept proposed by the structuring stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptCandidate {
    /// Concept name as given; empty when the model sent a non-string.
    pub name: String,
    /// One-line description as given, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ConceptCandidate {
    /// Creates a candidate with a description.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
        }
    }

    /// Creates a candidate without a description.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    /// Reads a concept from untyped model output. Never fails: wrong-typed
    /// fields become empty.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };
        Self {
            name: string_field(object, "name").unwrap_or_default(),
            description: description_field(object),
        }
    }
}

/// Module of concepts proposed by the structuring stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleCandidate {
    /// Module title as given.
    pub title: String,
    /// Concepts in model order.
    #[serde(default)]
    pub concepts: Vec<ConceptCandidate>,
}

impl ModuleCandidate {
    /// Creates a module.
    #[must_use]
    pub fn new(title: impl Into<String>, concepts: Vec<ConceptCandidate>) -> Self {
        Self {
            title: title.into(),
            concepts,
        }
    }

    /// Reads a module from untyped model output. A non-object entry becomes an
    /// empty module so later positions are unaffected.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };
        Self {
            title: string_field(object, "title").unwrap_or_default(),
            concepts: object
                .get("concepts")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(ConceptCandidate::from_value).collect())
                .unwrap_or_default(),
        }
    }
}

/// Course/lecture/module/concept outline with every required field present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredOutline {
    /// Course name, or the course placeholder.
    pub course_name: String,
    /// Lecture title, or the lecture placeholder.
    pub lecture_title: String,
    /// Modules in model order.
    #[serde(default)]
    pub modules: Vec<ModuleCandidate>,
}

impl StructuredOutline {
    /// Creates an outline.
    #[must_use]
    pub fn new(
        course_name: impl Into<String>,
        lecture_title: impl Into<String>,
        modules: Vec<ModuleCandidate>,
    ) -> Self {
        Self {
            course_name: course_name.into(),
            lecture_title: lecture_title.into(),
            modules,
        }
    }

    /// Parses untyped model output once, applying `defaults` for the course
    /// and lecture names and an empty module list when `modules` is not an
    /// array.
    #[must_use]
    pub fn from_value(value: &Value, defaults: &OutlineDefaults) -> Self {
        let empty = Map::new();
        let object = value.as_object().unwrap_or(&empty);
        let named = |key: &str, placeholder: &str| {
            string_field(object, key)
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| placeholder.to_owned())
        };
        Self {
            course_name: named("courseName", &defaults.course_placeholder),
            lecture_title: named("lectureTitle", &defaults.lecture_placeholder),
            modules: object
                .get("modules")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(ModuleCandidate::from_value).collect())
                .unwrap_or_default(),
        }
    }

    /// Total number of concepts across modules.
    #[must_use]
    pub fn concept_count(&self) -> usize {
        self.modules.iter().map(|module| module.concepts.len()).sum()
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// First description-like field whose trimmed text is non-empty. A
/// `definition` object contributes its `text`.
fn description_field(object: &Map<String, Value>) -> Option<String> {
    DESCRIPTION_KEYS.iter().find_map(|key| {
        let raw = match object.get(*key)? {
            Value::String(text) => text.as_str(),
            Value::Object(inner) => inner.get("text")?.as_str()?,
            _ => return None,
        };
        (!normalize_text(raw).is_empty()).then(|| raw.to_owned())
    })
}
