use std::path::Path;

use crate::error::{ConfigError, Result};
use crate::value::{Mapping, Value};

/// A config file format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Toml,
    Yaml,
}

impl Format {
    /// Extensions tried, in order, when searching a directory for a config name.
    pub const SEARCH_EXTENSIONS: &'static [&'static str] = &["json", "toml", "yaml", "yml"];

    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            "toml" => Some(Format::Toml),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }

    /// The format of `path`, from its extension.
    pub fn from_path(path: &Path) -> Result<Format> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ConfigError::MissingExtension(path.to_path_buf()))?;
        Format::from_extension(ext).ok_or_else(|| ConfigError::UnsupportedFormat(ext.to_string()))
    }

    /// Parse a document into a mapping. `origin` only labels errors.
    ///
    /// An empty document yields an empty mapping; any other non-mapping top
    /// level is an error.
    pub fn parse(self, content: &str, origin: &Path) -> Result<Mapping> {
        let parse_error = |reason: String| ConfigError::ParseError {
            path: origin.to_path_buf(),
            reason,
        };
        let value: Value = match self {
            Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?,
            Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string()))?,
            Format::Yaml => serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?,
        };
        match value {
            Value::Mapping(mapping) => Ok(mapping),
            Value::Null => Ok(Mapping::new()),
            other => Err(parse_error(format!(
                "expected a mapping at the top level, found {}",
                other.type_name()
            ))),
        }
    }
}
