//! Property-based tests for anchor search and attribution.
//!
//! Documents mix ASCII words, CJK text and newlines so both the window
//! snapping and the char-offset bookkeeping are exercised.

use lectern_evidence::{
    anchor::MAX_QUOTE_CHARS, attribute, locate, ConceptCandidate, Evidence, ModuleCandidate,
    StructuredOutline,
};
use proptest::prelude::*;

fn document_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            "[a-zA-Z]{1,12}",
            "[数据冒险控制流水线寄存器]{1,6}",
            "İ[a-z]{0,6}",
            Just(" ".to_string()),
            Just("\n".to_string()),
            Just(", ".to_string()),
        ],
        1..200,
    )
    .prop_map(|parts| parts.concat())
}

/// A document plus a char range inside it.
fn document_with_range() -> impl Strategy<Value = (String, usize, usize)> {
    document_strategy().prop_flat_map(|doc| {
        let len = doc.chars().count();
        (Just(doc), 0..len, 2..40usize)
            .prop_map(move |(doc, start, width)| (doc, start, (start + width).min(len)))
    })
}

fn char_slice(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end - start).collect()
}

proptest! {
    #[test]
    fn substrings_are_always_anchored((doc, start, end) in document_with_range()) {
        let term = char_slice(&doc, start, end);
        let term = term.trim();
        prop_assume!(term.chars().count() >= 2);

        let anchor = locate(&doc, &term.to_uppercase()).expect("substring must be found");
        let len = doc.chars().count();
        prop_assert!(anchor.start <= anchor.end);
        prop_assert!(anchor.end <= len);
        prop_assert!(!anchor.quote.is_empty());
        prop_assert!(anchor.quote.to_lowercase().contains(&term.to_lowercase()));
        prop_assert!(char_slice(&doc, anchor.start, anchor.end).contains(&anchor.quote));
    }

    #[test]
    fn quotes_never_exceed_the_cap(doc in document_strategy(), term in "[a-z数据]{2,4}") {
        if let Some(anchor) = locate(&doc, &term) {
            prop_assert!(anchor.quote.chars().count() <= MAX_QUOTE_CHARS);
        }
    }

    #[test]
    fn short_terms_never_anchor(doc in document_strategy(), term in "\\s*[a-z数]?\\s*") {
        prop_assert!(locate(&doc, &term).is_none());
    }

    #[test]
    fn absent_terms_use_the_description(doc in "[a-m \n]{0,300}", description in "[^\\s]{0,20}") {
        // Terms drawn from letters the document never contains.
        let outline = StructuredOutline::new(
            "c",
            "l",
            vec![ModuleCandidate::new("m", vec![ConceptCandidate::new("xyz qrs", description.clone())])],
        );
        let attribution = attribute(&doc, &outline);
        prop_assert_eq!(
            &attribution.outline.modules[0].concepts[0].evidence,
            &Evidence::AiAuthored { text: description }
        );
    }

    #[test]
    fn attribution_is_repeatable(doc in document_strategy(), names in prop::collection::vec("[a-zA-Z数据 ]{0,10}", 0..8)) {
        let concepts = names.into_iter().map(|name| ConceptCandidate::new(name, "d")).collect();
        let outline = StructuredOutline::new("c", "l", vec![ModuleCandidate::new("m", concepts)]);
        let first = serde_json::to_vec(&attribute(&doc, &outline).outline).unwrap();
        let second = serde_json::to_vec(&attribute(&doc, &outline).outline).unwrap();
        prop_assert_eq!(first, second);
    }
}
