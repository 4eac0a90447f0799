use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub backend: BackendSettings,
    pub collection: CollectionSettings,
    #[serde(default)]
    pub discovery: DiscoverySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub database_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSettings {
    pub profiles: String,
    pub likes: String,
    pub matches: String,
    pub conversations: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverySettings {
    #[serde(default = "default_min_age")]
    pub min_age: u8,
    #[serde(default = "default_max_age")]
    pub max_age: u8,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            min_age: default_min_age(),
            max_age: default_max_age(),
        }
    }
}

fn default_min_age() -> u8 { 18 }
fn default_max_age() -> u8 { 100 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with SPARK_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., SPARK_BACKEND__ENDPOINT -> backend.endpoint
            .add_source(
                Environment::with_prefix("SPARK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("SPARK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn discovery_filter(&self) -> crate::core::DiscoveryFilter {
        crate::core::DiscoveryFilter {
            min_age: self.discovery.min_age,
            max_age: self.discovery.max_age,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_discovery_range() {
        let discovery = DiscoverySettings::default();
        assert_eq!(discovery.min_age, 18);
        assert_eq!(discovery.max_age, 100);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }

    #[test]
    fn test_discovery_filter_conversion() {
        let settings = Settings {
            backend: BackendSettings {
                endpoint: "https://store.test/v1".to_string(),
                api_key: "k".to_string(),
                project_id: "p".to_string(),
                database_id: "db".to_string(),
            },
            collection: CollectionSettings {
                profiles: "profiles".to_string(),
                likes: "likes".to_string(),
                matches: "matches".to_string(),
                conversations: "conversations".to_string(),
            },
            discovery: DiscoverySettings {
                min_age: 21,
                max_age: 35,
            },
            logging: LoggingSettings::default(),
        };

        let filter = settings.discovery_filter();
        assert_eq!(filter.min_age, 21);
        assert_eq!(filter.max_age, 35);
    }
}
