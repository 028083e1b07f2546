//! mortarix-extraction — Hybrid material information extraction.
//!
//! Given a document already reduced to per-page plain text, the engine
//! locates every mention of the configured materials, attaches provenance
//! (nearest heading, IS code, page number), synthesises a definition and
//! supplementary notes per material, and emits one deduplicated record per
//! material.
//!
//! Flow: page texts → [`segmenter`] → sentence sequence → [`index`] (built
//! once) → per material: [`locator`] → candidate indices → [`headings`] +
//! [`fields`] + [`definitions`] per candidate → [`aggregator`] → ordered
//! records. Orchestrated by [`pipeline::ExtractionEngine`].

pub mod segmenter;
pub mod index;
pub mod locator;
pub mod headings;
pub mod fields;
pub mod definitions;
pub mod aggregator;
pub mod pipeline;
pub mod evaluation;

pub use index::SemanticIndex;
pub use pipeline::{ExtractionConfig, ExtractionEngine, ExtractionOutcome};
