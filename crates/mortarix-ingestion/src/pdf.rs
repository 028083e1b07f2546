//! lopdf-based per-page text extraction.

use std::path::Path;

use anyhow::Context;
use lopdf::Document;
use mortarix_common::{PageTag, PageText, Result};
use tracing::{debug, info, warn};

/// Extract text from every page of a PDF, in page order. Pages whose text
/// extraction fails or comes back blank are skipped; an unreadable file is
/// an error.
pub fn parse_pdf_pages(path: &Path) -> Result<Vec<PageText>> {
    info!("Parsing PDF: {}", path.display());
    let document = Document::load(path)
        .with_context(|| format!("failed to load PDF {}", path.display()))?;

    let mut pages = Vec::new();
    for (page_number, _object_id) in document.get_pages() {
        match document.extract_text(&[page_number]) {
            Ok(text) if !text.trim().is_empty() => {
                pages.push(PageText::new(PageTag::Page(page_number), text));
            }
            Ok(_) => debug!(page = page_number, "page has no extractable text"),
            Err(e) => warn!(page = page_number, "text extraction failed: {e}"),
        }
    }

    info!("Parsed {} pages with text from {}", pages.len(), path.display());
    Ok(pages)
}
