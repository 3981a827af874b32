use crate::config::EngineConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads engine configuration by merging defaults, TOML, and environment
    /// variables (highest precedence last).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed, or
    /// if the merged configuration fails validation.
    pub fn load() -> Result<EngineConfig> {
        Self::load_from("config/Mandate.toml")
    }

    /// Loads engine configuration from a specific TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed, or
    /// if the merged configuration fails validation.
    pub fn load_from(path: &str) -> Result<EngineConfig> {
        let config: EngineConfig = Figment::from(Serialized::defaults(EngineConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("MANDATE_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }
}
