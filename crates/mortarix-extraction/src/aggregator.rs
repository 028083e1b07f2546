//! Record aggregator: merges per-candidate findings into one record per
//! material, deduplicates, filters noise, and assigns stable serials.

use std::collections::HashSet;

use mortarix_common::{MaterialRecord, NO_INFORMATION};
use tracing::warn;

use crate::fields::is_generic_reference;

/// What the field extractors produced for one candidate sentence.
#[derive(Debug, Clone)]
pub struct CandidateFinding {
    pub reference: Option<String>,
    pub definition: String,
    pub other_info: Option<String>,
}

/// Accumulated evidence for one material, candidates applied in ascending
/// index order. Every category deduplicates on the exact string.
#[derive(Debug, Clone)]
pub struct RecordDraft {
    pub material: String,
    pub references: Vec<String>,
    pub definitions: Vec<String>,
    pub other_info: Vec<String>,
}

impl RecordDraft {
    pub fn new(material: impl Into<String>) -> Self {
        Self {
            material: material.into(),
            references: Vec::new(),
            definitions: Vec::new(),
            other_info: Vec::new(),
        }
    }

    pub fn absorb(&mut self, finding: CandidateFinding) {
        if let Some(reference) = finding.reference {
            if !self.references.contains(&reference) {
                self.references.push(reference);
            }
        }
        if !finding.definition.is_empty() && !self.definitions.contains(&finding.definition) {
            self.definitions.push(finding.definition);
        }
        if let Some(info) = finding.other_info {
            if !self.other_info.contains(&info) {
                self.other_info.push(info);
            }
        }
    }
}

/// Drop generic references, then number the survivors in encounter order.
/// Returns the sentinel when nothing survives.
pub fn format_references(references: &[String]) -> String {
    let surviving: Vec<&String> =
        references.iter().filter(|r| !is_generic_reference(r)).collect();
    if surviving.is_empty() {
        return NO_INFORMATION.to_string();
    }
    surviving
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {}", i + 1, r))
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_or_sentinel(parts: &[String]) -> String {
    if parts.is_empty() {
        NO_INFORMATION.to_string()
    } else {
        parts.join("; ")
    }
}

/// Turn drafts into final records: duplicate material names are dropped
/// defensively (the per-material processing set should already prevent
/// them), then dense 1-based serials are assigned in draft order, which is
/// the catalogue processing order.
pub fn finalize(drafts: Vec<RecordDraft>) -> Vec<MaterialRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut records = Vec::new();

    for draft in drafts {
        if !seen.insert(draft.material.clone()) {
            warn!(material = %draft.material, "duplicate material draft dropped");
            continue;
        }
        let serial = records.len() as u32 + 1;
        records.push(MaterialRecord {
            serial,
            material: draft.material,
            references: format_references(&draft.references),
            definition: join_or_sentinel(&draft.definitions),
            other_info: join_or_sentinel(&draft.other_info),
        });
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(reference: Option<&str>, definition: &str, info: Option<&str>) -> CandidateFinding {
        CandidateFinding {
            reference: reference.map(str::to_string),
            definition: definition.to_string(),
            other_info: info.map(str::to_string),
        }
    }

    #[test]
    fn absorb_deduplicates_every_category() {
        let mut draft = RecordDraft::new("Cement");
        draft.absorb(finding(Some("4.1 Cement (Page 1)"), "grey binder", Some("Note: dry")));
        draft.absorb(finding(Some("4.1 Cement (Page 1)"), "grey binder", Some("Note: dry")));
        draft.absorb(finding(Some("IS 269 (Page 2)"), "43 Grade", None));
        assert_eq!(draft.references.len(), 2);
        assert_eq!(draft.definitions, vec!["grey binder", "43 Grade"]);
        assert_eq!(draft.other_info.len(), 1);
    }

    #[test]
    fn references_are_numbered_in_encounter_order() {
        let refs = vec!["IS 269 (Page 2)".to_string(), "4.1 Cement – IS 4031 (Page 3)".to_string()];
        assert_eq!(
            format_references(&refs),
            "1. IS 269 (Page 2)\n2. 4.1 Cement – IS 4031 (Page 3)"
        );
    }

    #[test]
    fn generic_references_are_filtered_out() {
        let refs = vec![
            "CHAPTER 2 General (Page 1)".to_string(),
            " (Page 9)".to_string(),
            "IS 456 code (Page 4)".to_string(),
        ];
        assert_eq!(format_references(&refs), "1. IS 456 code (Page 4)");
    }

    #[test]
    fn all_filtered_yields_sentinel() {
        let refs = vec!["CHAPTER 1 (Page 1)".to_string()];
        assert_eq!(format_references(&refs), NO_INFORMATION);
        assert_eq!(format_references(&[]), NO_INFORMATION);
    }

    #[test]
    fn finalize_assigns_dense_serials() {
        let mut cement = RecordDraft::new("Cement");
        cement.absorb(finding(Some("IS 269 standard (Page 1)"), "grey binder", None));
        let steel = RecordDraft::new("Steel");

        let records = finalize(vec![cement, steel]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].serial, 1);
        assert_eq!(records[0].material, "Cement");
        assert_eq!(records[1].serial, 2);
        assert_eq!(records[1].references, NO_INFORMATION);
        assert_eq!(records[1].other_info, NO_INFORMATION);
    }

    #[test]
    fn finalize_drops_duplicate_material_names() {
        let records =
            finalize(vec![RecordDraft::new("Cement"), RecordDraft::new("Cement")]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].serial, 1);
    }

    #[test]
    fn numbered_lines_never_repeat_a_reference() {
        let refs = vec![
            "IS 383 grading (Page 2)".to_string(),
            "IS 2386 testing (Page 2)".to_string(),
        ];
        let formatted = format_references(&refs);
        let lines: Vec<&str> = formatted.lines().collect();
        let stripped: HashSet<&str> =
            lines.iter().map(|l| l.splitn(2, ". ").nth(1).unwrap()).collect();
        assert_eq!(stripped.len(), lines.len());
    }
}
