use std::path::PathBuf;
use thiserror::Error;

use crate::setting::DecodeError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file \"{name}\" not found in {paths:?}")]
    FileNotFound { name: String, paths: Vec<PathBuf> },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("config type could not be determined for {0}")]
    MissingExtension(PathBuf),

    #[error("config type [{0}] is not supported")]
    UnsupportedFormat(String),

    #[error("Invalid binding for '{key}': {reason}")]
    InvalidBinding { key: String, reason: String },

    #[error("Flag '--{flag}' bound to '{key}' is not defined in the flag registry")]
    FlagNotDefined { key: String, flag: String },

    #[error("Unknown flag '--{0}'")]
    UnknownFlag(String),

    #[error("Duplicate config key '{0}'")]
    DuplicateKey(String),

    #[error("[{0}] is required")]
    Required(String),

    #[error("invalid validation [{spec}] of key [{key}]")]
    InvalidValidation { key: String, spec: String },

    #[error("unsupported action of validation [{spec}] of key [{key}]")]
    UnsupportedValidation { key: String, spec: String },

    #[error("invalid range rule: [{rules}] of key [{key}]")]
    InvalidRangeRule { key: String, rules: String },

    #[error("string does not support range validation [{spec}] of key [{key}]")]
    StringRange { key: String, spec: String },

    #[error("[{key}] failed to parse validation values [{spec}]")]
    BadValidationValue { key: String, spec: String },

    #[error("[{key}] did not pass validation. want [{spec}] real [{value}]")]
    ValidationFailed {
        key: String,
        spec: String,
        value: String,
    },

    #[error("unable to convert value ({value}) to {} for field: {field}: {source}", .source.expected())]
    CoerceError {
        field: String,
        value: String,
        source: DecodeError,
    },

    #[error("Failed to decode '{key}': {source}")]
    Decode { key: String, source: DecodeError },

    #[error("Failed to serialize config: {0}")]
    SerializeError(String),
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;
