//! Heading resolver: backward scan for the nearest structurally-plausible
//! section or table marker.

use lazy_static::lazy_static;
use mortarix_common::Sentence;
use regex::Regex;

lazy_static! {
    // "1.2.3 Section Title"
    static ref NUMBERED_SECTION: Regex =
        Regex::new(r"(?i)^\d+\.\d+(?:\.\d+)*\s+.*").expect("numbered-section pattern");
    // "(a) Title" / "a) Title"
    static ref LETTERED_ITEM: Regex =
        Regex::new(r"(?i)^\(?[a-zA-Z]\)\s+.*").expect("lettered-item pattern");
    // "TABLE 4.1"
    static ref TABLE_MARKER: Regex =
        Regex::new(r"(?i)^TABLE\s+\d+\.\d+").expect("table-marker pattern");
    // Generic all-caps line; boilerplate tokens excluded separately since
    // the regex engine has no lookahead.
    static ref ALL_CAPS_LINE: Regex =
        Regex::new(r"^[A-Z\s\d\.\-]+$").expect("all-caps pattern");
}

const BOILERPLATE_TOKENS: [&str; 2] = ["MATERIAL", "SPECIFICATIONS"];

fn is_heading(line: &str) -> bool {
    if NUMBERED_SECTION.is_match(line)
        || LETTERED_ITEM.is_match(line)
        || TABLE_MARKER.is_match(line)
    {
        return true;
    }
    ALL_CAPS_LINE.is_match(line)
        && !BOILERPLATE_TOKENS.iter().any(|token| line.contains(token))
}

/// Scan strictly backward from `start` (exclusive) towards position 0 and
/// return the first structurally-plausible heading. Lines with fewer than
/// 2 words and shorter than 15 characters are noise and skipped.
///
/// `max_backscan` bounds the number of lines inspected; `None` scans to the
/// start of the document. Worst case is O(distance to document start).
pub fn nearest_heading(
    sentences: &[Sentence],
    start: usize,
    max_backscan: Option<usize>,
) -> Option<String> {
    let mut scanned = 0usize;
    for i in (0..start.min(sentences.len())).rev() {
        if let Some(limit) = max_backscan {
            if scanned >= limit {
                return None;
            }
        }
        scanned += 1;

        let line = sentences[i].text.as_str();
        if line.split_whitespace().count() < 2 && line.len() < 15 {
            continue;
        }
        if is_heading(line) {
            return Some(line.trim().to_string());
        }
    }
    None
}
