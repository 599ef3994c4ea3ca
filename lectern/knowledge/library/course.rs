use chrono::{DateTime, Utc};
use lectern_evidence::{AnnotatedModule, AnnotatedOutline, ConceptWithEvidence, DefinitionSource};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Concept as stored in the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryConcept {
    /// Fresh identifier.
    pub id: Uuid,
    /// Concept name.
    pub name: String,
    /// Evidence text: the document quote, or the model description.
    pub description: String,
    /// Origin of `description`.
    pub description_source: DefinitionSource,
}

impl LibraryConcept {
    fn from_concept(concept: &ConceptWithEvidence) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: concept.name.clone(),
            description: concept.evidence.text().to_owned(),
            description_source: concept.evidence.source(),
        }
    }
}

/// Module as stored in the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryModule {
    /// Fresh identifier.
    pub id: Uuid,
    /// Module title.
    pub title: String,
    /// Concepts in outline order.
    pub concepts: Vec<LibraryConcept>,
}

impl LibraryModule {
    fn from_module(module: &AnnotatedModule) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: module.title.clone(),
            concepts: module.concepts.iter().map(LibraryConcept::from_concept).collect(),
        }
    }
}

/// One processed lecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    /// Fresh identifier.
    pub id: Uuid,
    /// Lecture title.
    pub title: String,
    /// Modules in outline order.
    pub modules: Vec<LibraryModule>,
    /// When the lecture entered the library.
    pub added_at: DateTime<Utc>,
}

impl Lecture {
    /// Builds a lecture, assigning new ids to every node.
    #[must_use]
    pub fn from_outline(outline: &AnnotatedOutline) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: outline.lecture_title.clone(),
            modules: outline.modules.iter().map(LibraryModule::from_module).collect(),
            added_at: Utc::now(),
        }
    }

    /// Number of concepts in the lecture.
    #[must_use]
    pub fn concept_count(&self) -> usize {
        self.modules.iter().map(|module| module.concepts.len()).sum()
    }
}

/// Course grouping lectures that share a normalized name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Stable identifier.
    pub id: Uuid,
    /// Name as first seen.
    pub course_name: String,
    /// Lectures in arrival order.
    pub lectures: Vec<Lecture>,
}

impl Course {
    /// Creates a course holding one lecture.
    #[must_use]
    pub fn new(course_name: impl Into<String>, lecture: Lecture) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_name: course_name.into(),
            lectures: vec![lecture],
        }
    }

    /// True when `name` refers to this course.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        normalize_course_name(&self.course_name) == normalize_course_name(name)
    }
}

/// Key used to match course names: trimmed, inner whitespace collapsed to a
/// single space, lowercased.
#[must_use]
pub fn normalize_course_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
