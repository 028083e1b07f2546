//! End-to-end engine tests over small in-memory documents.
//!
//! These run keyword-only (no embedding model) so they are deterministic
//! and need no network access.

use mortarix_common::{MaterialCatalog, MaterialSpec, PageTag, PageText, NO_INFORMATION};
use mortarix_extraction::{ExtractionConfig, ExtractionEngine};

fn engine_for(names: &[&str]) -> ExtractionEngine {
    let catalog = MaterialCatalog {
        materials: names.iter().map(|n| MaterialSpec::named(*n)).collect(),
    };
    ExtractionEngine::new(catalog, ExtractionConfig::default())
}

fn spec_document() -> Vec<PageText> {
    vec![
        PageText::new(
            PageTag::Page(1),
            "Cement shall be 43 Grade Ordinary Portland. It undergoes compressive strength test as per IS 4031 (Part 6).",
        ),
        PageText::new(
            PageTag::Page(2),
            "Fine Aggregate is used in concrete. Its gradation is as per Table 3.1.",
        ),
    ]
}

#[tokio::test]
async fn cement_record_carries_the_is_code_reference() {
    let engine = engine_for(&["Cement", "Fine Aggregate"]);
    let outcome = engine.extract(&spec_document()).await.unwrap();

    let cement = outcome.records.iter().find(|r| r.material == "Cement").unwrap();
    assert!(cement.references.contains("IS 4031 (Part 6) (Page 1)"));
    assert!(cement.definition.contains("43 Grade"));
}

#[tokio::test]
async fn fine_aggregate_other_info_carries_the_table_marker() {
    let engine = engine_for(&["Cement", "Fine Aggregate"]);
    let outcome = engine.extract(&spec_document()).await.unwrap();

    let fine = outcome.records.iter().find(|r| r.material == "Fine Aggregate").unwrap();
    assert!(fine.other_info.contains("Table 3.1"));
    assert_ne!(fine.other_info, NO_INFORMATION);
}

#[tokio::test]
async fn serials_are_dense_and_follow_processing_order() {
    let engine = engine_for(&["Cement", "Fine Aggregate", "Steel"]);
    let pages = {
        let mut pages = spec_document();
        pages.push(PageText::new(PageTag::Page(3), "Steel reinforcement conforming to IS 1786."));
        pages
    };
    let outcome = engine.extract(&pages).await.unwrap();

    // Longest-name-first processing: Fine Aggregate, then Cement, then Steel.
    let order: Vec<(u32, &str)> =
        outcome.records.iter().map(|r| (r.serial, r.material.as_str())).collect();
    assert_eq!(order, vec![(1, "Fine Aggregate"), (2, "Cement"), (3, "Steel")]);
}

#[tokio::test]
async fn generic_substring_material_does_not_steal_specific_matches() {
    // "Aggregate" is configured alongside "Fine Aggregate" but every
    // mention is part of the longer name, so it must not appear at all.
    let engine = engine_for(&["Aggregate", "Fine Aggregate"]);
    let outcome = engine.extract(&spec_document()).await.unwrap();

    assert!(outcome.records.iter().any(|r| r.material == "Fine Aggregate"));
    assert!(!outcome.records.iter().any(|r| r.material == "Aggregate"));
}

#[tokio::test]
async fn zero_sentence_document_is_not_an_error() {
    let engine = engine_for(&["Cement"]);
    let outcome = engine
        .extract(&[PageText::new(PageTag::Page(1), "\n   \n")])
        .await
        .unwrap();
    assert!(outcome.records.is_empty());
}

#[tokio::test]
async fn configured_but_absent_material_is_omitted() {
    let engine = engine_for(&["Cement", "Pozzolana"]);
    let outcome = engine.extract(&spec_document()).await.unwrap();

    assert!(!outcome.records.iter().any(|r| r.material == "Pozzolana"));
    assert!(outcome.records.iter().any(|r| r.material == "Cement"));
    let serials: Vec<u32> = outcome.records.iter().map(|r| r.serial).collect();
    assert_eq!(serials, (1..=outcome.records.len() as u32).collect::<Vec<_>>());
}

#[tokio::test]
async fn references_never_repeat_within_a_record() {
    let engine = engine_for(&["Cement"]);
    let pages = vec![PageText::new(
        PageTag::Page(1),
        "Cement tested as per IS 456.\nCement tested as per IS 456.",
    )];
    let outcome = engine.extract(&pages).await.unwrap();

    let cement = &outcome.records[0];
    let lines: Vec<&str> = cement.references.lines().collect();
    let mut bodies: Vec<&str> = lines
        .iter()
        .map(|line| line.splitn(2, ". ").nth(1).unwrap_or(line))
        .collect();
    let total = bodies.len();
    bodies.sort();
    bodies.dedup();
    assert_eq!(bodies.len(), total);
}

#[tokio::test]
async fn headings_resolve_to_the_nearest_preceding_marker() {
    let engine = engine_for(&["Cement"]);
    let pages = vec![PageText::new(
        PageTag::Page(4),
        "4.1 Cementitious Materials Overview\nCement shall conform to IS 269.",
    )];
    let outcome = engine.extract(&pages).await.unwrap();

    let cement = &outcome.records[0];
    assert!(cement
        .references
        .contains("4.1 Cementitious Materials Overview – IS 269 (Page 4)"));
}
