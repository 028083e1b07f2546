//! Data model shared by the extraction engine and its collaborators.

use serde::{Deserialize, Serialize};

/// Sentinel used wherever a record category has no extracted content.
pub const NO_INFORMATION: &str = "No Information Available";

/// Where a piece of text came from: a 1-based PDF page, or the filename of
/// a scanned image whose text was supplied by an external OCR step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageTag {
    Page(u32),
    Image(String),
}

impl std::fmt::Display for PageTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageTag::Page(n) => write!(f, "{n}"),
            PageTag::Image(name) => write!(f, "{name}"),
        }
    }
}

/// One page of already-extracted text, as delivered by the ingestion
/// collaborator. The engine consumes an ordered slice of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    pub page: PageTag,
    pub text: String,
}

impl PageText {
    pub fn new(page: PageTag, text: impl Into<String>) -> Self {
        Self { page, text: text.into() }
    }
}

/// One trimmed, non-blank line of the document, tagged with its page.
/// Identity is positional: a sentence is addressed by its index in the
/// segmented sequence, which never changes once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub text: String,
    pub page: PageTag,
}

/// Final per-material output row. Field names serialize to the report
/// column headers so the refinement prompt and the CSV share one schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    #[serde(rename = "Sl. No")]
    pub serial: u32,

    #[serde(rename = "Material Name")]
    pub material: String,

    /// Numbered, newline-separated reference lines, or the sentinel.
    #[serde(
        rename = "Test Name/Reference Code/Standard as per the given document (with reference page number)"
    )]
    pub references: String,

    #[serde(rename = "Specific Material Type/Material Definition")]
    pub definition: String,

    #[serde(rename = "Any other relevant information")]
    pub other_info: String,
}

impl MaterialRecord {
    /// Whether the references column carries any extracted content.
    pub fn has_references(&self) -> bool {
        self.references != NO_INFORMATION
    }
}
