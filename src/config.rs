use anyhow::Result;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default budget for every phase of every service, in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Options for a `ServiceManager`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceManagerOptions {
    /// Time a lifecycle hook may take before it is considered failed
    pub timeout_ms: u64,
}

impl Default for ServiceManagerOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ServiceManagerOptions {
    pub fn with_timeout_ms(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load options from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (service-manager.toml)
    /// 3. Environment variables (prefixed with SERVICE_MANAGER_)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        if Path::new("service-manager.toml").exists() {
            builder = builder.add_source(File::with_name("service-manager"));
        }

        builder = builder.add_source(
            Environment::with_prefix("SERVICE_MANAGER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let options: ServiceManagerOptions = builder.build()?.try_deserialize()?;
        tracing::debug!(timeout_ms = options.timeout_ms, "Service manager options loaded");
        Ok(options)
    }

    /// Parse options from a TOML document; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let options = Config::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(options)
    }

    /// Save options to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout_is_thirty_seconds() {
        let options = ServiceManagerOptions::default();
        assert_eq!(options.timeout_ms, 30_000);
        assert_eq!(options.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_from_toml_str() {
        let options = ServiceManagerOptions::from_toml_str("timeout_ms = 250").unwrap();
        assert_eq!(options, ServiceManagerOptions::with_timeout_ms(250));
    }

    #[test]
    fn test_empty_toml_keeps_defaults() {
        let options = ServiceManagerOptions::from_toml_str("").unwrap();
        assert_eq!(options, ServiceManagerOptions::default());
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        assert!(ServiceManagerOptions::from_toml_str("timeout_ms = \"soon\"").is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service-manager.toml");

        ServiceManagerOptions::with_timeout_ms(1_500)
            .save_to_file(&path)
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let reloaded = ServiceManagerOptions::from_toml_str(&content).unwrap();
        assert_eq!(reloaded.timeout_ms, 1_500);
    }

    #[test]
    fn test_load_reads_prefixed_environment() {
        std::env::set_var("SERVICE_MANAGER_TIMEOUT_MS", "1234");
        let loaded = ServiceManagerOptions::load();
        std::env::remove_var("SERVICE_MANAGER_TIMEOUT_MS");

        let options = loaded.unwrap();
        assert_eq!(options.timeout_ms, 1234);
        assert_eq!(options.timeout(), Duration::from_millis(1234));
    }
}
