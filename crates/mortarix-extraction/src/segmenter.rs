//! Sentence segmenter: page texts → flat page-tagged line sequence.

use mortarix_common::{PageText, Sentence};

/// Split each page's text on line boundaries, trim, drop blanks, and tag
/// every retained line with its page. The resulting order — page-ascending,
/// then original line order — is the basis for every backward scan in the
/// engine, and positions in it are the sentence identities.
pub fn segment_pages(pages: &[PageText]) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    for page in pages {
        for line in page.text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            sentences.push(Sentence { text: trimmed.to_string(), page: page.page.clone() });
        }
    }
    sentences
}
