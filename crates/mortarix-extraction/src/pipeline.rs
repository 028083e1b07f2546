//! End-to-end extraction pipeline.
//!
//! Orchestrates the full flow for one document:
//!   1. Segment page texts into the sentence sequence
//!   2. Build the semantic index once (degrading to keyword-only on failure)
//!   3. Batch-embed the material query texts
//!   4. Per material: locate candidates, resolve headings, extract fields
//!   5. Aggregate drafts into serialised records
//!
//! The sentence sequence and index are immutable once built, so step 4 is
//! embarrassingly parallel across materials; with the `parallel` feature it
//! runs on rayon. Output order is reconstructed from the catalogue
//! processing order, never from completion order. A fault in one material
//! is isolated: that material is omitted and the rest proceed.

use std::sync::Arc;
use std::time::Instant;

use mortarix_common::{MaterialCatalog, MaterialRecord, MaterialSpec, PageText, Result, Sentence};
use mortarix_embed::SentenceEmbedder;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::aggregator::{self, CandidateFinding, RecordDraft};
use crate::definitions::DefinitionExtractor;
use crate::fields;
use crate::headings;
use crate::index::{SemanticIndex, DEFAULT_K};
use crate::locator;
use crate::segmenter::segment_pages;

/// A fault scoped to a single material's processing.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("material '{0}': {1}")]
    Material(String, String),
}

/// Engine tunables.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Semantic neighbours requested per material query.
    pub semantic_k: usize,
    /// Upper bound on the backward heading scan; `None` scans to the
    /// document start.
    pub max_backscan: Option<usize>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self { semantic_k: DEFAULT_K, max_backscan: None }
    }
}

/// Result of one extraction run.
#[derive(Debug)]
pub struct ExtractionOutcome {
    pub job_id: Uuid,
    /// True when the run had no semantic index and used keyword-only
    /// matching.
    pub degraded: bool,
    pub sentence_count: usize,
    pub duration_ms: u128,
    /// Per-material faults, already logged; the materials are absent from
    /// `records`.
    pub errors: Vec<String>,
    pub records: Vec<MaterialRecord>,
}

/// The hybrid extraction engine. Construct once per catalogue, reuse
/// across documents.
pub struct ExtractionEngine {
    catalog: MaterialCatalog,
    config: ExtractionConfig,
    embedder: Option<Arc<SentenceEmbedder>>,
    definitions: DefinitionExtractor,
}

impl ExtractionEngine {
    /// Keyword-only engine; attach an embedder for hybrid matching.
    pub fn new(catalog: MaterialCatalog, config: ExtractionConfig) -> Self {
        Self { catalog, config, embedder: None, definitions: DefinitionExtractor::standard() }
    }

    pub fn with_embedder(mut self, embedder: Arc<SentenceEmbedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_definitions(mut self, definitions: DefinitionExtractor) -> Self {
        self.definitions = definitions;
        self
    }

    /// Run extraction over one document's page texts.
    pub async fn extract(&self, pages: &[PageText]) -> Result<ExtractionOutcome> {
        let started = Instant::now();
        let job_id = Uuid::new_v4();

        let sentences = segment_pages(pages);
        info!(job = %job_id, sentences = sentences.len(), "starting material extraction");

        let order = self.catalog.processing_order();
        let mut degraded = self.embedder.is_none();
        let mut semantic: Vec<Option<Vec<(Sentence, f32)>>> = vec![None; order.len()];

        if !sentences.is_empty() {
            if let Some(embedder) = &self.embedder {
                match SemanticIndex::build(embedder, &sentences).await {
                    Some(index) => {
                        // One batch for all material queries; the CPU stage
                        // below then needs no model access at all.
                        let names: Vec<String> =
                            order.iter().map(|m| m.name.clone()).collect();
                        match embedder.embed(&names).await {
                            Ok(queries) => {
                                for (slot, query) in semantic.iter_mut().zip(queries) {
                                    *slot =
                                        Some(index.query_vec(&query, self.config.semantic_k));
                                }
                            }
                            Err(e) => {
                                warn!("material query embedding failed, keyword-only run: {e}");
                                degraded = true;
                            }
                        }
                    }
                    None => degraded = true,
                }
            }
        }

        if degraded {
            info!(job = %job_id, "running in keyword-only mode");
        }

        let results = self.process_all(&order, &sentences, &semantic);

        let mut drafts = Vec::new();
        let mut errors = Vec::new();
        for (material, result) in order.iter().zip(results) {
            match result {
                Ok(Some(draft)) => drafts.push(draft),
                Ok(None) => {}
                Err(e) => {
                    warn!(material = %material.name, "material skipped: {e}");
                    errors.push(e.to_string());
                }
            }
        }

        let records = aggregator::finalize(drafts);
        info!(job = %job_id, records = records.len(), "material extraction finished");

        Ok(ExtractionOutcome {
            job_id,
            degraded,
            sentence_count: sentences.len(),
            duration_ms: started.elapsed().as_millis(),
            errors,
            records,
        })
    }

    #[cfg(feature = "parallel")]
    fn process_all(
        &self,
        order: &[&MaterialSpec],
        sentences: &[Sentence],
        semantic: &[Option<Vec<(Sentence, f32)>>],
    ) -> Vec<std::result::Result<Option<RecordDraft>, EngineError>> {
        use rayon::prelude::*;
        order
            .par_iter()
            .zip(semantic.par_iter())
            .map(|(material, semantic)| {
                self.process_material(material, sentences, semantic.as_deref())
            })
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn process_all(
        &self,
        order: &[&MaterialSpec],
        sentences: &[Sentence],
        semantic: &[Option<Vec<(Sentence, f32)>>],
    ) -> Vec<std::result::Result<Option<RecordDraft>, EngineError>> {
        order
            .iter()
            .zip(semantic.iter())
            .map(|(material, semantic)| {
                self.process_material(material, sentences, semantic.as_deref())
            })
            .collect()
    }

    /// Candidate location and field extraction for one material. Pure CPU,
    /// read-only against the sentence sequence.
    fn process_material(
        &self,
        material: &MaterialSpec,
        sentences: &[Sentence],
        semantic: Option<&[(Sentence, f32)]>,
    ) -> std::result::Result<Option<RecordDraft>, EngineError> {
        let candidates = locator::locate(&material.name, sentences, semantic)?;
        if candidates.is_empty() {
            debug!(material = %material.name, "no candidate sentences");
            return Ok(None);
        }

        let mut draft = RecordDraft::new(material.name.clone());
        for index in candidates {
            let sentence = &sentences[index];
            let context = fields::context_window(sentences, index);

            let heading = headings::nearest_heading(sentences, index, self.config.max_backscan);
            let code = fields::code_standard(&sentence.text);
            let reference =
                fields::assemble_reference(heading.as_deref(), code.as_deref(), &sentence.page);
            let definition = self.definitions.extract(&context, material)?;
            let other_info = fields::other_info(&context);

            draft.absorb(CandidateFinding { reference, definition, other_info });
        }
        Ok(Some(draft))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mortarix_common::{PageTag, NO_INFORMATION};

    fn catalog(names: &[&str]) -> MaterialCatalog {
        MaterialCatalog {
            materials: names.iter().map(|n| MaterialSpec::named(*n)).collect(),
        }
    }

    #[tokio::test]
    async fn empty_document_yields_empty_records() {
        let engine = ExtractionEngine::new(catalog(&["Cement"]), ExtractionConfig::default());
        let outcome = engine.extract(&[]).await.unwrap();
        assert!(outcome.records.is_empty());
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.sentence_count, 0);
    }

    #[tokio::test]
    async fn absent_material_is_omitted() {
        let pages = vec![PageText::new(PageTag::Page(1), "Cement shall be stored dry.")];
        let engine =
            ExtractionEngine::new(catalog(&["Cement", "Bitumen"]), ExtractionConfig::default());
        let outcome = engine.extract(&pages).await.unwrap();
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].material, "Cement");
        assert_eq!(outcome.records[0].serial, 1);
    }

    #[tokio::test]
    async fn keyword_only_runs_are_degraded() {
        let pages = vec![PageText::new(PageTag::Page(1), "Mortar joints.")];
        let engine = ExtractionEngine::new(catalog(&["Mortar"]), ExtractionConfig::default());
        let outcome = engine.extract(&pages).await.unwrap();
        assert!(outcome.degraded);
    }

    #[tokio::test]
    async fn material_fault_is_isolated() {
        let mut materials = catalog(&["Cement"]);
        materials.materials.push(MaterialSpec {
            name: "Gravel".to_string(),
            plural: false,
            definition_pattern: Some("(unbalanced".to_string()),
        });

        // "Gravel for sub-base" has no copular verb, so the malformed
        // template pattern is reached and faults that material only.
        let pages = vec![PageText::new(
            PageTag::Page(1),
            "Cement shall be stored dry.\nGravel for sub-base layers.",
        )];
        let engine = ExtractionEngine::new(materials, ExtractionConfig::default());
        let outcome = engine.extract(&pages).await.unwrap();

        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("Gravel"));
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].material, "Cement");
    }

    #[tokio::test]
    async fn categories_without_findings_use_the_sentinel() {
        let pages = vec![PageText::new(PageTag::Page(1), "Use sand.")];
        let engine = ExtractionEngine::new(catalog(&["Sand"]), ExtractionConfig::default());
        let outcome = engine.extract(&pages).await.unwrap();
        let record = &outcome.records[0];
        assert_eq!(record.references, NO_INFORMATION);
        assert_eq!(record.other_info, NO_INFORMATION);
        // The definition extractor always synthesises something.
        assert!(record.definition.contains("Sand"));
    }
}
