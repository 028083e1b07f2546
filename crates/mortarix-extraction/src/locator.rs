//! Hybrid locator: unions exact keyword hits with semantic neighbours into
//! one candidate set per material.

use mortarix_common::Sentence;
use regex::Regex;
use tracing::debug;

use crate::pipeline::EngineError;

/// Indices of every sentence containing `material` as a case-insensitive
/// whole word.
pub fn keyword_matches(material: &str, sentences: &[Sentence]) -> Result<Vec<usize>, EngineError> {
    let pattern = format!(r"(?i)\b{}\b", regex::escape(material));
    let matcher = Regex::new(&pattern)
        .map_err(|e| EngineError::Material(material.to_string(), e.to_string()))?;

    Ok(sentences
        .iter()
        .enumerate()
        .filter(|(_, s)| matcher.is_match(&s.text))
        .map(|(i, _)| i)
        .collect())
}

/// Map semantic query results back onto sentence indices by exact text+page
/// equality. Best-effort: a result whose mapping is ambiguous (duplicate
/// line) or absent is skipped rather than guessed at.
pub fn reconcile_semantic_hits(
    results: &[(Sentence, f32)],
    sentences: &[Sentence],
) -> Vec<usize> {
    let mut indices = Vec::new();
    for (result, _distance) in results {
        let mut matching = sentences
            .iter()
            .enumerate()
            .filter(|(_, s)| s.text == result.text && s.page == result.page)
            .map(|(i, _)| i);

        match (matching.next(), matching.next()) {
            (Some(index), None) => indices.push(index),
            (Some(_), Some(_)) => {
                debug!(text = %result.text, "ambiguous semantic result skipped");
            }
            (None, _) => {
                debug!(text = %result.text, "unmapped semantic result skipped");
            }
        }
    }
    indices
}

/// Candidate set for one material: keyword hits ∪ reconciled semantic hits,
/// deduplicated and sorted ascending for deterministic downstream passes.
pub fn locate(
    material: &str,
    sentences: &[Sentence],
    semantic_results: Option<&[(Sentence, f32)]>,
) -> Result<Vec<usize>, EngineError> {
    let mut candidates = keyword_matches(material, sentences)?;
    if let Some(results) = semantic_results {
        candidates.extend(reconcile_semantic_hits(results, sentences));
    }
    candidates.sort_unstable();
    candidates.dedup();
    Ok(candidates)
}
