//! `paperscout cite` — Extract citing sentences as JSON.

use std::path::Path;

use paperscout_tools::extract_citations;

pub async fn run(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = super::compare::read_document(file)?;
    println!("{}", citations_json(&text)?);
    Ok(())
}

fn citations_json(text: &str) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&extract_citations(text))
}
