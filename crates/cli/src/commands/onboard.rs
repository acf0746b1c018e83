//! `paperscout onboard` — First-time setup.

use std::path::Path;

use paperscout_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();

    println!("PaperScout — First-Time Setup");
    println!("=============================\n");

    if write_default_config(&config_dir)? {
        let config_path = config_dir.join("config.toml");
        println!("✅ Created config.toml at: {}", config_path.display());
        println!("\n📝 Next steps:");
        println!("   1. Set CORE_API_KEY (https://core.ac.uk/services/api)");
        println!("   2. Start Ollama, or set a provider and API key in the config");
        println!("   3. Run: paperscout ask \"What is new in transformer attention?\"\n");
    } else {
        println!(
            "⚠️  Config already exists at: {}",
            config_dir.join("config.toml").display()
        );
        println!("   Edit it manually or delete and re-run onboard.\n");
    }

    Ok(())
}

/// Write `config.toml` under `dir` unless one exists. Returns whether it wrote.
pub fn write_default_config(dir: &Path) -> std::io::Result<bool> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join("config.toml");
    if path.exists() {
        return Ok(false);
    }
    std::fs::write(&path, AppConfig::default_toml())?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_loadable_config_once() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join(".paperscout");

        assert!(write_default_config(&target).unwrap());
        let loaded = AppConfig::load_from(&target.join("config.toml")).unwrap();
        assert_eq!(loaded.default_provider, "ollama");
        assert_eq!(loaded.agent.max_feedback_cycles, Some(3));

        std::fs::write(target.join("config.toml"), "default_model = \"kept\"\n").unwrap();
        assert!(!write_default_config(&target).unwrap());
        let kept = AppConfig::load_from(&target.join("config.toml")).unwrap();
        assert_eq!(kept.default_model, "kept");
    }
}
