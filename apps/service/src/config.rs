use std::{fmt, fs, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::monitoring::EndpointDescriptor;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    ReadFailed { path: path::PathBuf, source: std::io::Error },
    #[error("failed to parse {}: {message}", path.display())]
    ParseFailed { path: path::PathBuf, message: String },
    #[error("unsupported config format for {} (expected .yaml, .yml, .json or .toml)", .0.display())]
    UnsupportedFormat(path::PathBuf),
}

/// On-disk representations of the endpoint list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick a format from the file extension
    pub fn from_path(path: &path::Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Either a bare list of endpoints or a table with an `endpoints` key
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Document {
    List(Vec<EndpointDescriptor>),
    Table { endpoints: Vec<EndpointDescriptor> },
}

impl From<Document> for Vec<EndpointDescriptor> {
    fn from(document: Document) -> Self {
        match document {
            Document::List(endpoints) | Document::Table { endpoints } => endpoints,
        }
    }
}

/// The endpoints to monitor, in configuration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default)]
    pub endpoints: Vec<EndpointDescriptor>,
}

impl fmt::Display for EndpointConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Monitoring {} endpoint(s):", self.endpoints.len())?;
        for endpoint in &self.endpoints {
            writeln!(
                f,
                "  {}: {} {}",
                endpoint.display_name(),
                endpoint.method(),
                endpoint.configured_url().unwrap_or("<missing url>")
            )?;
        }
        Ok(())
    }
}

impl EndpointConfig {
    /// Load the endpoint list from a YAML, JSON or TOML file
    ///
    /// ```rust,no_run
    /// let cfg = endpoint_monitor::config::EndpointConfig::from_path("endpoints.yaml")?;
    /// println!("{}", cfg);
    /// # Ok::<(), endpoint_monitor::config::ConfigError>(())
    /// ```
    pub fn from_path(path: impl AsRef<path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()))?;

        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFailed { path: path.to_path_buf(), source })?;

        Self::parse(&raw, format).map_err(|message| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Parse an endpoint list already in memory
    pub fn parse(raw: &str, format: ConfigFormat) -> Result<Self, String> {
        let endpoints: Vec<EndpointDescriptor> = match format {
            // An empty YAML document is an empty list.
            ConfigFormat::Yaml if raw.trim().is_empty() => Vec::new(),
            ConfigFormat::Yaml => {
                serde_yaml::from_str::<Document>(raw).map_err(|e| e.to_string())?.into()
            }
            ConfigFormat::Json => {
                serde_json::from_str::<Document>(raw).map_err(|e| e.to_string())?.into()
            }
            ConfigFormat::Toml => {
                toml::from_str::<EndpointConfig>(raw).map_err(|e| e.to_string())?.endpoints
            }
        };

        Ok(Self { endpoints })
    }
}
