use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("File does not exist: {path}")]
    MissingFile { path: PathBuf },

    #[error("Malformed row at line {line}: found {found} fields, expected {expected}")]
    MalformedRow {
        line: u64,
        found: usize,
        expected: usize,
    },

    #[error("Missing column '{column}' in {path}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("Book '{book_id}' has category '{category}' which matches no known category")]
    UnmatchedCategory { book_id: String, category: String },

    #[error("Validation failed: {duplicates} duplicate, {uncategorized} uncategorized, {stray} stray books")]
    ValidationFailed {
        duplicates: usize,
        uncategorized: usize,
        stray: usize,
    },

    #[error("Config key not found: {key}")]
    ConfigKeyNotFound { key: String },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidConfigValue { key: String, value: String },

    #[error("Failed to parse config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

impl CatalogError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingFile { .. } => 2,
            Self::MalformedRow { .. } | Self::MissingColumn { .. } => 3,
            Self::UnmatchedCategory { .. } => 4,
            Self::ValidationFailed { .. } => 5,
            _ => 1,
        }
    }
}
