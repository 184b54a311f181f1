use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from `config/Config.toml` and `APP_` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a present configuration source cannot be parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from("config/Config.toml")
    }

    /// Loads configuration from a specific TOML file layered over the defaults.
    ///
    /// A missing file is not an error; defaults and the environment still apply.
    /// Nested keys are separated by `__`, e.g. `APP_INGEST__LIMIT=100`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or environment values cannot be parsed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let path = path.as_ref();
        let config: AppConfig = Self::base(path)
            .merge(Env::prefixed("APP_").split("__"))
            .extract()?;

        tracing::debug!("Loaded configuration (file: {})", path.display());
        Ok(config)
    }

    /// Loads configuration with a profile overlay (`Config.{profile}.toml`
    /// next to `path`).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_with_profile(path: impl AsRef<Path>, profile: &str) -> Result<AppConfig> {
        let path = path.as_ref();
        let profile_path = path.with_file_name(format!("Config.{profile}.toml"));

        let config: AppConfig = Self::base(path)
            .merge(Toml::file(profile_path))
            .merge(Env::prefixed("APP_").split("__"))
            .extract()?;

        Ok(config)
    }

    fn base(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default())).merge(Toml::file(path))
    }
}
