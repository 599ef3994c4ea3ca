use serde::{Deserialize, Serialize};

use crate::{
    anchor::{MatchKind, SourceIndex},
    normalizer::normalize_text,
    outline::{ConceptCandidate, StructuredOutline},
};

/// Where a concept's definition comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionSource {
    /// Quoted from the document.
    Pdf,
    /// The model's own description.
    Ai,
}

/// Char range of a quote inside the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Window start.
    pub start: usize,
    /// Window end (exclusive).
    pub end: usize,
}

/// Evidence attached to exactly one concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Definition", try_from = "Definition")]
pub enum Evidence {
    /// A verbatim quote of the document.
    TextAnchored {
        /// Non-empty quote, at most 600 chars.
        quote: String,
        /// Char offset of the quote window start.
        start: usize,
        /// Char offset (exclusive) of the quote window end.
        end: usize,
    },
    /// No anchor was found; the model's description is used as is.
    AiAuthored {
        /// Normalized description, possibly empty.
        text: String,
    },
}

impl Evidence {
    /// Text shown to the user.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::TextAnchored { quote, .. } => quote,
            Self::AiAuthored { text } => text,
        }
    }

    /// Origin of [`Self::text`].
    #[must_use]
    pub const fn source(&self) -> DefinitionSource {
        match self {
            Self::TextAnchored { .. } => DefinitionSource::Pdf,
            Self::AiAuthored { .. } => DefinitionSource::Ai,
        }
    }

    /// True for document quotes.
    #[must_use]
    pub const fn is_anchored(&self) -> bool {
        matches!(self, Self::TextAnchored { .. })
    }
}

/// Wire form of [`Evidence`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    /// Quote or description.
    pub text: String,
    /// `pdf` or `ai`.
    pub source: DefinitionSource,
    /// Same as `text` for document quotes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_quote: Option<String>,
    /// Quote offsets for document quotes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_location: Option<SourceLocation>,
}

impl From<Evidence> for Definition {
    fn from(evidence: Evidence) -> Self {
        match evidence {
            Evidence::TextAnchored { quote, start, end } => Self {
                text: quote.clone(),
                source: DefinitionSource::Pdf,
                source_quote: Some(quote),
                source_location: Some(SourceLocation { start, end }),
            },
            Evidence::AiAuthored { text } => Self {
                text,
                source: DefinitionSource::Ai,
                source_quote: None,
                source_location: None,
            },
        }
    }
}

impl TryFrom<Definition> for Evidence {
    type Error = String;

    fn try_from(definition: Definition) -> Result<Self, Self::Error> {
        match definition.source {
            DefinitionSource::Ai => Ok(Self::AiAuthored {
                text: definition.text,
            }),
            DefinitionSource::Pdf => {
                let location = definition
                    .source_location
                    .ok_or("pdf definition without sourceLocation")?;
                if location.start > location.end {
                    return Err(format!(
                        "invalid sourceLocation {}..{}",
                        location.start, location.end
                    ));
                }
                if definition.text.is_empty() {
                    return Err("pdf definition with an empty quote".to_owned());
                }
                if let Some(quote) = &definition.source_quote {
                    if *quote != definition.text {
                        return Err("pdf definition with sourceQuote != text".to_owned());
                    }
                }
                Ok(Self::TextAnchored {
                    quote: definition.text,
                    start: location.start,
                    end: location.end,
                })
            }
        }
    }
}

/// Concept with its evidence, serialized with a `definition` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptWithEvidence {
    /// Concept name as given.
    pub name: String,
    /// Description as given, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Attached evidence.
    #[serde(rename = "definition")]
    pub evidence: Evidence,
}

/// Module whose concepts carry evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedModule {
    /// Module title as given.
    pub title: String,
    /// Concepts in input order.
    pub concepts: Vec<ConceptWithEvidence>,
}

/// Outline whose concepts carry evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedOutline {
    /// Course name.
    pub course_name: String,
    /// Lecture title.
    pub lecture_title: String,
    /// Modules in input order.
    pub modules: Vec<AnnotatedModule>,
}

impl AnnotatedOutline {
    /// Iterates every concept in module order.
    pub fn concepts(&self) -> impl Iterator<Item = &ConceptWithEvidence> {
        self.modules.iter().flat_map(|module| module.concepts.iter())
    }
}

/// Counts collected while attributing an outline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionReport {
    /// Concepts processed.
    pub concepts: usize,
    /// Concepts with a document quote.
    pub anchored: usize,
    /// Anchored concepts whose quote came from a token of the name.
    pub token_fallbacks: usize,
    /// Concepts left with the model's description.
    pub ai_authored: usize,
}

impl AttributionReport {
    fn record(&mut self, matched: Option<&MatchKind>) {
        self.concepts += 1;
        match matched {
            Some(MatchKind::WholeTerm) => self.anchored += 1,
            Some(MatchKind::Token(_)) => {
                self.anchored += 1;
                self.token_fallbacks += 1;
            }
            None => self.ai_authored += 1,
        }
    }
}

/// Result of [`attribute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    /// Annotated copy of the input outline.
    pub outline: AnnotatedOutline,
    /// Summary counts.
    pub report: AttributionReport,
}

/// Attaches evidence to every concept of `outline`, searching `full_text`.
///
/// Module order, concept order and titles are preserved. Neither input is
/// modified.
#[must_use]
pub fn attribute(full_text: &str, outline: &StructuredOutline) -> Attribution {
    let index = SourceIndex::new(full_text);
    let mut report = AttributionReport::default();
    let mut modules = Vec::with_capacity(outline.modules.len());

    for module in &outline.modules {
        let mut concepts = Vec::with_capacity(module.concepts.len());
        for candidate in &module.concepts {
            let (concept, matched) = attribute_concept(&index, candidate);
            report.record(matched.as_ref());
            concepts.push(concept);
        }
        modules.push(AnnotatedModule {
            title: module.title.clone(),
            concepts,
        });
    }

    Attribution {
        outline: AnnotatedOutline {
            course_name: outline.course_name.clone(),
            lecture_title: outline.lecture_title.clone(),
            modules,
        },
        report,
    }
}

fn attribute_concept(
    index: &SourceIndex<'_>,
    candidate: &ConceptCandidate,
) -> (ConceptWithEvidence, Option<MatchKind>) {
    let term = normalize_text(&candidate.name);
    let anchor = if term.is_empty() {
        None
    } else {
        index.locate(&term)
    };

    let (evidence, matched) = match anchor {
        Some(anchor) => (
            Evidence::TextAnchored {
                quote: anchor.quote,
                start: anchor.start,
                end: anchor.end,
            },
            Some(anchor.matched),
        ),
        None => (
            Evidence::AiAuthored {
                text: candidate
                    .description
                    .as_deref()
                    .map(normalize_text)
                    .unwrap_or_default(),
            },
            None,
        ),
    };

    (
        ConceptWithEvidence {
            name: candidate.name.clone(),
            description: candidate.description.clone(),
            evidence,
        },
        matched,
    )
}
