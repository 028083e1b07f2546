//! Material catalogue — the configured set of domain entities the engine
//! searches for, plus the per-material definition-pattern table.
//!
//! The catalogue is data-driven: the builtin set ships as an embedded YAML
//! resource and callers may load their own. Keeping the pattern table here
//! keeps the extraction code free of per-material enumeration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One configured material keyword.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialSpec {
    /// Canonical material name, matched as a case-insensitive whole word.
    pub name: String,

    /// Grammatical number, used when synthesising the default definition
    /// pattern ("is" vs "are").
    #[serde(default)]
    pub plural: bool,

    /// Optional custom definition regex overriding the default template.
    /// The first non-empty capture group is taken as the definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_pattern: Option<String>,
}

impl MaterialSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), plural: false, definition_pattern: None }
    }
}

/// The full configured material set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialCatalog {
    pub materials: Vec<MaterialSpec>,
}

impl MaterialCatalog {
    /// The builtin catalogue shipped with the crate.
    pub fn builtin() -> Self {
        serde_yaml::from_str(include_str!("../materials.yaml"))
            .expect("builtin materials.yaml is valid")
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: &std::path::Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Materials in processing order: longest name first (stable for equal
    /// lengths), with any material whose name is a literal substring of an
    /// already-accepted longer name excluded. This prevents a generic term
    /// from double-counting the mentions of a more specific one, e.g.
    /// "Aggregate" inside "Fine Aggregate".
    pub fn processing_order(&self) -> Vec<&MaterialSpec> {
        let mut by_length: Vec<&MaterialSpec> = self.materials.iter().collect();
        by_length.sort_by_key(|spec| std::cmp::Reverse(spec.name.len()));

        let mut accepted: Vec<&MaterialSpec> = Vec::new();
        for spec in by_length {
            let subsumed = accepted.iter().any(|kept| kept.name.contains(&spec.name));
            if subsumed {
                tracing::debug!(material = %spec.name, "subsumed by a longer catalogue entry");
            } else {
                accepted.push(spec);
            }
        }
        accepted
    }
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
