pub mod ask;
pub mod cite;
pub mod compare;
pub mod onboard;
pub mod tools;

use paperscout_config::{AppConfig, ConfigError};

/// Explain how to supply a missing credential, then return the error.
pub(crate) fn credential_help(err: ConfigError) -> Box<dyn std::error::Error> {
    if let ConfigError::MissingCredential { name } = &err {
        eprintln!();
        eprintln!("  ERROR: {name} is not set!");
        eprintln!();
        eprintln!("  Export it in your shell:");
        eprintln!("    export {name}='...'");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        eprintln!("  Get a free CORE key at: https://core.ac.uk/services/api");
        eprintln!();
    }
    err.into()
}
