//! Field extractors: IS-code references, reference assembly, context
//! windows, and supplementary-information markers.

use lazy_static::lazy_static;
use mortarix_common::{PageTag, Sentence};
use regex::Regex;

lazy_static! {
    // "IS 4031", "IS 383 (Part 1)", "IS 1786 (Part IV A)". The literal
    // "IS" is case-sensitive; lowercase "is" is an ordinary verb here.
    static ref IS_CODE: Regex =
        Regex::new(r"IS\s+\d+(?:\s*\(Part\s*[\w\d\s]+\))?").expect("IS-code pattern");
}

/// Substrings that mark a context as supplementary information worth
/// keeping verbatim.
const OTHER_INFO_MARKERS: [&str; 3] = ["Table", "Note", "IS recommends"];

/// All distinct IS codes in `text`, sorted and joined with "; ".
pub fn code_standard(text: &str) -> Option<String> {
    let mut codes: Vec<String> =
        IS_CODE.find_iter(text).map(|m| m.as_str().trim().to_string()).collect();
    if codes.is_empty() {
        return None;
    }
    codes.sort();
    codes.dedup();
    Some(codes.join("; "))
}

/// Local context for the candidate at `index`: the sentences at
/// `[index-1, index, index+1]`, clipped to the sequence bounds and joined
/// with single spaces.
pub fn context_window(sentences: &[Sentence], index: usize) -> String {
    let start = index.saturating_sub(1);
    let end = (index + 2).min(sentences.len());
    sentences[start..end]
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Combine heading and code into one reference line, heading first,
/// en-dash separated when both are present, with the page appended.
/// Returns `None` when neither part exists.
pub fn assemble_reference(
    heading: Option<&str>,
    code: Option<&str>,
    page: &PageTag,
) -> Option<String> {
    let mut reference = heading.unwrap_or("").to_string();
    if let Some(code) = code {
        reference = if reference.is_empty() {
            code.to_string()
        } else {
            format!("{reference} – {code}")
        };
    }
    if reference.is_empty() {
        return None;
    }
    Some(format!("{} (Page {page})", reference.trim()))
}

/// A reference too short to identify anything, or one pointing at a whole
/// chapter, carries no information worth reporting.
pub fn is_generic_reference(reference: &str) -> bool {
    let trimmed = reference.trim();
    trimmed.len() <= 10 || trimmed.to_uppercase().contains("CHAPTER")
}

/// The full context verbatim when it carries a supplementary-information
/// marker; `None` otherwise. Markers are case-sensitive.
pub fn other_info(context: &str) -> Option<String> {
    if OTHER_INFO_MARKERS.iter().any(|marker| context.contains(marker)) {
        Some(context.trim().to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence(text: &str, page: u32) -> Sentence {
        Sentence { text: text.to_string(), page: PageTag::Page(page) }
    }

    #[test]
    fn extracts_plain_and_part_codes() {
        let text = "Tested as per IS 4031 (Part 6) and conforming to IS 383.";
        assert_eq!(code_standard(text), Some("IS 383; IS 4031 (Part 6)".to_string()));
    }

    #[test]
    fn duplicate_codes_collapse() {
        let text = "IS 456 applies. See IS 456 again.";
        assert_eq!(code_standard(text), Some("IS 456".to_string()));
    }

    #[test]
    fn lowercase_is_is_not_a_code() {
        assert_eq!(code_standard("water is 20 degrees"), None);
    }

    #[test]
    fn context_window_clips_at_bounds() {
        let sentences =
            vec![sentence("one", 1), sentence("two", 1), sentence("three", 1), sentence("four", 1)];
        assert_eq!(context_window(&sentences, 0), "one two");
        assert_eq!(context_window(&sentences, 1), "one two three");
        assert_eq!(context_window(&sentences, 3), "three four");
    }

    #[test]
    fn reference_prefers_heading_then_code() {
        let page = PageTag::Page(4);
        assert_eq!(
            assemble_reference(Some("4.1 Cement"), Some("IS 269"), &page),
            Some("4.1 Cement – IS 269 (Page 4)".to_string())
        );
        assert_eq!(
            assemble_reference(Some("4.1 Cement"), None, &page),
            Some("4.1 Cement (Page 4)".to_string())
        );
        assert_eq!(
            assemble_reference(None, Some("IS 269"), &page),
            Some("IS 269 (Page 4)".to_string())
        );
        assert_eq!(assemble_reference(None, None, &page), None);
    }

    #[test]
    fn image_pages_render_their_name() {
        let page = PageTag::Image("scan_02.png".into());
        assert_eq!(
            assemble_reference(None, Some("IS 1786"), &page),
            Some("IS 1786 (Page scan_02.png)".to_string())
        );
    }

    #[test]
    fn generic_references_are_flagged() {
        assert!(is_generic_reference(" (Page 3) "));
        assert!(is_generic_reference("Chapter 4 overview (Page 9)"));
        assert!(is_generic_reference("CHAPTER 2 (Page 1)"));
        assert!(!is_generic_reference("IS 4031 (Part 6) (Page 1)"));
    }

    #[test]
    fn other_info_requires_marker() {
        assert_eq!(
            other_info("Gradation is as per Table 3.1."),
            Some("Gradation is as per Table 3.1.".to_string())
        );
        assert!(other_info("Note: keep dry.").is_some());
        assert!(other_info("IS recommends curing for 7 days.").is_some());
        // lowercase "table" is not the marker
        assert_eq!(other_info("see the table above"), None);
    }
}
