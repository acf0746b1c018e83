//! `paperscout compare` — Compare two papers with the default model.

use std::path::Path;

use paperscout_agent::compare_documents;
use paperscout_config::AppConfig;

pub async fn run(
    a: &Path,
    b: &Path,
    focus: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let paper_a = read_document(a)?;
    let paper_b = read_document(b)?;

    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let router = paperscout_providers::build_from_config(&config)?;
    let model = router.default_model().ok_or("No default provider configured")?;

    eprint!("  Comparing...");
    let comparison = compare_documents(model.as_ref(), &paper_a, &paper_b, focus.as_deref()).await?;
    eprint!("\r             \r");
    println!("{comparison}");

    Ok(())
}

/// Read a document as text; `.pdf` files go through PDF text extraction.
pub fn read_document(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        let bytes = std::fs::read(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        Ok(paperscout_tools::pdf::extract_text(&bytes)?)
    } else {
        Ok(std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?)
    }
}
