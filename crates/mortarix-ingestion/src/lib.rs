//! mortarix-ingestion — Document ingestion.
//!
//! Turns an uploaded document into the ordered page-tagged text records the
//! extraction engine consumes. Owns no extraction semantics: the boundary
//! is `Vec<PageText>`.

pub mod pdf;

use std::path::Path;

use mortarix_common::{MortarixError, PageText, Result};

const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "tiff", "bmp", "gif"];

/// Dispatch on file extension. PDFs are parsed page by page; scanned
/// images need an external OCR step, so they are rejected with a pointed
/// message — their text can still enter the engine as `PageTag::Image`
/// records built upstream.
pub fn process_document(path: &Path) -> Result<Vec<PageText>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => pdf::parse_pdf_pages(path),
        ext if IMAGE_EXTENSIONS.contains(&ext) => Err(MortarixError::UnsupportedDocument(
            format!("{}: image OCR is not built in; supply page-tagged text instead", path.display()),
        )),
        _ => Err(MortarixError::UnsupportedDocument(format!(
            "{}: expected a .pdf document",
            path.display()
        ))),
    }
}
