//! `paperscout tools` — List the research tools.

use paperscout_config::AppConfig;

use super::credential_help;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let (human, _questions) = paperscout_tools::human_channel(1, None);
    let registry = paperscout_tools::research_registry(&config, human).map_err(credential_help)?;

    println!("🔧 Research tools ({})", registry.len());
    println!("===================\n");
    println!("{}", registry.describe());

    Ok(())
}
