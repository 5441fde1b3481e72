//! Configuration for IronEDI
//!
//! An `ironedi.toml` file lists the schema mappings to compile and where
//! their artifacts go:
//!
//! ```toml
//! destination = "target/edi"
//! messages = "ORDERS,INVOIC"
//! log_level = "debug"
//!
//! [[mappings]]
//! schema = "schemas/d03b.toml"
//! namespace = "com.acme.d03b"
//! ```

use ironedi_compiler::{CompileError, Executor};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "ironedi.toml";

/// Configuration loading error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("cannot read config '{}': {source}", path.display())]
    Io {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// File is not valid configuration.
    #[error("invalid config '{}': {source}", path.display())]
    Parse {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: toml::de::Error,
    },
}

/// IronEDI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Schema mappings to compile
    #[serde(default)]
    pub mappings: Vec<Mapping>,

    /// Output root
    #[serde(default = "default_destination")]
    pub destination: PathBuf,

    /// Comma-separated message allow-list
    #[serde(default)]
    pub messages: Option<String>,

    /// Flush after every segment when encoding
    #[serde(default)]
    pub flush_segments: bool,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Schema mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Mapping {
    /// Root schema reference (path, `file:` URI or `.toml` manifest)
    pub schema: String,

    /// Base namespace
    pub namespace: String,
}

fn default_destination() -> PathBuf {
    PathBuf::from("target/ironedi")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mappings: Vec::new(),
            destination: default_destination(),
            messages: None,
            flush_segments: false,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Loads a config file.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Builds one executor per mapping. Relative schema references and the
    /// destination resolve against `base_dir`.
    ///
    /// # Errors
    /// Returns [`CompileError`] for an invalid mapping namespace.
    pub fn executors(&self, base_dir: &Path) -> Result<Vec<Executor>, CompileError> {
        self.mappings
            .iter()
            .map(|mapping| {
                let mut builder = Executor::builder()
                    .schema(&mapping.schema)
                    .base_dir(base_dir)
                    .destination(base_dir.join(&self.destination))
                    .namespace(&mapping.namespace)
                    .flush_segments(self.flush_segments);
                if let Some(messages) = &self.messages {
                    builder = builder.messages(messages);
                }
                builder.build()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"
destination = "out"
messages = "ORDERS"

[[mappings]]
schema = "d03b.toml"
namespace = "com.acme.d03b"
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.destination, PathBuf::from("out"));
        assert_eq!(config.log_level, "info");
        assert_eq!(
            config.mappings,
            vec![Mapping {
                schema: "d03b.toml".to_string(),
                namespace: "com.acme.d03b".to_string(),
            }]
        );

        let executors = config.executors(dir.path()).unwrap();
        assert_eq!(executors.len(), 1);
        assert_eq!(executors[0].destination(), dir.path().join("out"));
        assert!(executors[0].selects("ORDERS"));
        assert!(!executors[0].selects("INVOIC"));
    }

    #[test]
    fn test_invalid_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "destinations = \"out\"\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse { .. })));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(Config::load(&missing), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_invalid_namespace() {
        let config = Config {
            mappings: vec![Mapping {
                schema: "a.xml".to_string(),
                namespace: "com.acme-corp".to_string(),
            }],
            ..Config::default()
        };
        assert!(matches!(
            config.executors(Path::new(".")),
            Err(CompileError::IllegalIdentifier { .. })
        ));
    }
}
