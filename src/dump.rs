//! Writing a populated record back out to a new file.

use std::path::Path;

use serde::Serialize;

use crate::error::{ConfigError, Result};
use crate::file::FileSystem;

/// Extensions [`dump_config`] can write.
pub const DUMP_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// Serialize `config` to `path`, choosing the encoder from the extension.
///
/// `None` writes an empty map. The file must not exist yet; it is created
/// exclusively and synced before returning.
pub fn dump_config<T: Serialize + ?Sized>(
    fs: &dyn FileSystem,
    path: &Path,
    config: Option<&T>,
) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ConfigError::MissingExtension(path.to_path_buf()))?;

    let rendered = match config {
        Some(config) => encode(ext, config)?,
        None => encode(ext, &serde_json::Map::new())?,
    };

    fs.create_new(path, rendered.as_bytes())
        .map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
    log::debug!("dumped config to {}", path.display());
    Ok(())
}

fn encode<T: Serialize + ?Sized>(ext: &str, config: &T) -> Result<String> {
    match ext {
        "json" => serde_json::to_string_pretty(config)
            .map_err(|e| ConfigError::SerializeError(e.to_string())),
        "yaml" | "yml" => {
            serde_yaml::to_string(config).map_err(|e| ConfigError::SerializeError(e.to_string()))
        }
        other => Err(ConfigError::UnsupportedFormat(other.to_string())),
    }
}
