//! Runtime settings: defaults, then `opensplit.toml`, then `OPENSPLIT__*`
//! environment variables, then the legacy `MONGODB_URI` and `PORT`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

const CONFIG_FILE: &str = "opensplit.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_backend")]
    pub backend: Backend,

    #[serde(default)]
    pub mongodb_uri: String,

    #[serde(default = "default_database")]
    pub database: String,

    /// Read users and expenses for the summary inside one snapshot transaction.
    #[serde(default = "default_snapshot_reads")]
    pub snapshot_reads: bool,
}

impl Settings {
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder();

        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder
            .add_source(
                config::Environment::with_prefix("OPENSPLIT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("storage.mongodb_uri", std::env::var("MONGODB_URI").ok())?
            .set_override_option("server.port", std::env::var("PORT").ok())?;

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(LedgerError::Config("server.port must not be 0".to_string()));
        }
        if self.storage.backend == Backend::Mongo {
            if self.storage.mongodb_uri.is_empty() {
                return Err(LedgerError::Config(
                    "a MongoDB URI is required (set MONGODB_URI)".to_string(),
                ));
            }
            if self.storage.database.is_empty() {
                return Err(LedgerError::Config(
                    "storage.database must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            mongodb_uri: String::new(),
            database: default_database(),
            snapshot_reads: default_snapshot_reads(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_backend() -> Backend {
    Backend::Mongo
}

fn default_database() -> String {
    "OpenSplit".to_string()
}

fn default_snapshot_reads() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bind_address(), ("0.0.0.0".to_string(), 3000));
        assert_eq!(settings.storage.backend, Backend::Mongo);
        assert_eq!(settings.storage.database, "OpenSplit");
        assert!(settings.storage.snapshot_reads);
    }

    #[test]
    fn mongo_backend_needs_a_uri() {
        let mut settings = Settings::default();
        assert!(matches!(settings.validate(), Err(LedgerError::Config(_))));

        settings.storage.mongodb_uri = "mongodb://localhost:27017".to_string();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn memory_backend_needs_nothing() {
        let mut settings = Settings::default();
        settings.storage.backend = Backend::Memory;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let settings: Settings = config::Config::builder()
            .add_source(config::File::from_str(
                "[storage]\nbackend = \"memory\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.storage.backend, Backend::Memory);
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.storage.database, "OpenSplit");
    }
}
