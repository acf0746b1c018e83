//! Plain-text extraction from PDF bytes.

use lopdf::Document;

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("not a readable PDF: {0}")]
    Unreadable(String),

    #[error("failed to extract text from page {page}: {reason}")]
    Page { page: u32, reason: String },
}

/// Extract the text of every page in order, each page followed by `\n`.
pub fn extract_text(bytes: &[u8]) -> Result<String, PdfError> {
    let document = Document::load_mem(bytes).map_err(|e| PdfError::Unreadable(e.to_string()))?;

    let mut text = String::new();
    for page in document.get_pages().into_keys() {
        let page_text = document.extract_text(&[page]).map_err(|e| PdfError::Page {
            page,
            reason: e.to_string(),
        })?;
        text.push_str(page_text.trim_end_matches('\n'));
        text.push('\n');
    }
    Ok(text)
}
