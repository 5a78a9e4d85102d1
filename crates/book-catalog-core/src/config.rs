use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aggregate::OutputPaths;
use crate::category::{SentinelRule, UnmatchedPolicy};
use crate::error::{CatalogError, Result};
use crate::loader::MalformedRowPolicy;

const CONFIG_FILE: &str = "catalog.toml";

/// Book id that is always filed under [`DEFAULT_SENTINEL_CATEGORY`]
/// ("Grimms' Fairy Tales" in the Gutenberg export).
pub const DEFAULT_SENTINEL_BOOK_ID: &str = "c218aae0-32dd-47e3-bc7f-ee992e36efaf";
pub const DEFAULT_SENTINEL_CATEGORY: &str = "Children's";
pub const DEFAULT_BUCKET_ID: &str = "uncategorized";
pub const DEFAULT_BUCKET_NAME: &str = "Uncategorized";
pub const DEFAULT_PREVIEW_LIMIT: usize = 10;

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# book-catalog configuration file
# Location: <base-dir>/catalog.toml
# Relative paths are resolved against the base directory.

[paths]
books_csv = "data/books.csv"
categories_csv = "data/categories.csv"
# Input of the legacy positional converter (`book-catalog convert`)
convert_csv = "data/gutenberg_books.csv"
output_dir = "public"
books_json = "books.json"
categorized_json = "categorized_books.json"

[loader]
# What to do with rows that have fewer fields than expected: "skip" or "error"
malformed_rows = "skip"

[categorize]
# This book is filed under `sentinel_category` whatever its own category says
sentinel_book_id = "c218aae0-32dd-47e3-bc7f-ee992e36efaf"
sentinel_category = "Children's"
# Books whose category matches nothing: "drop", "bucket" or "error"
unmatched = "drop"
bucket_id = "uncategorized"
bucket_name = "Uncategorized"

[report]
# How many duplicate / uncategorized books to list in the report
preview_limit = 10
"#;

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub loader: LoaderConfig,

    #[serde(default)]
    pub categorize: CategorizeConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

/// Input and output file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub books_csv: PathBuf,
    pub categories_csv: PathBuf,
    pub convert_csv: PathBuf,
    pub output_dir: PathBuf,
    pub books_json: String,
    pub categorized_json: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            books_csv: PathBuf::from("data/books.csv"),
            categories_csv: PathBuf::from("data/categories.csv"),
            convert_csv: PathBuf::from("data/gutenberg_books.csv"),
            output_dir: PathBuf::from("public"),
            books_json: "books.json".to_string(),
            categorized_json: "categorized_books.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoaderConfig {
    #[serde(default)]
    pub malformed_rows: MalformedRowPolicy,
}

/// Category assignment rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CategorizeConfig {
    pub sentinel_book_id: String,
    pub sentinel_category: String,
    pub unmatched: UnmatchedPolicy,
    pub bucket_id: String,
    pub bucket_name: String,
}

impl Default for CategorizeConfig {
    fn default() -> Self {
        Self {
            sentinel_book_id: DEFAULT_SENTINEL_BOOK_ID.to_string(),
            sentinel_category: DEFAULT_SENTINEL_CATEGORY.to_string(),
            unmatched: UnmatchedPolicy::default(),
            bucket_id: DEFAULT_BUCKET_ID.to_string(),
            bucket_name: DEFAULT_BUCKET_NAME.to_string(),
        }
    }
}

impl CategorizeConfig {
    pub fn sentinel_rule(&self) -> SentinelRule {
        SentinelRule {
            book_id: self.sentinel_book_id.clone(),
            category_name: self.sentinel_category.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_preview_limit")]
    pub preview_limit: usize,
}

fn default_preview_limit() -> usize {
    DEFAULT_PREVIEW_LIMIT
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            preview_limit: DEFAULT_PREVIEW_LIMIT,
        }
    }
}

impl Config {
    /// Load config from base directory
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content).map_err(|e| CatalogError::ConfigParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Ok(config)
    }

    /// Save config to base directory
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Get config file path
    pub fn path(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE)
    }

    /// Initialize config with default template (rich comments)
    pub fn init(base_dir: &Path) -> Result<PathBuf> {
        let path = base_dir.join(CONFIG_FILE);
        fs::create_dir_all(base_dir)?;

        if !path.exists() {
            fs::write(&path, DEFAULT_CONFIG_TEMPLATE)?;
        }

        Ok(path)
    }

    /// Get a config value by dot-notation key
    pub fn get(&self, key: &str) -> Option<String> {
        self.list()
            .into_iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Set a config value by dot-notation key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || CatalogError::InvalidConfigValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "paths.books_csv" => self.paths.books_csv = PathBuf::from(value),
            "paths.categories_csv" => self.paths.categories_csv = PathBuf::from(value),
            "paths.convert_csv" => self.paths.convert_csv = PathBuf::from(value),
            "paths.output_dir" => self.paths.output_dir = PathBuf::from(value),
            "paths.books_json" => self.paths.books_json = value.to_string(),
            "paths.categorized_json" => self.paths.categorized_json = value.to_string(),
            "loader.malformed_rows" => {
                self.loader.malformed_rows = value.parse().map_err(|_| invalid())?
            }
            "categorize.sentinel_book_id" => self.categorize.sentinel_book_id = value.to_string(),
            "categorize.sentinel_category" => {
                self.categorize.sentinel_category = value.to_string()
            }
            "categorize.unmatched" => {
                self.categorize.unmatched = value.parse().map_err(|_| invalid())?
            }
            "categorize.bucket_id" => self.categorize.bucket_id = value.to_string(),
            "categorize.bucket_name" => self.categorize.bucket_name = value.to_string(),
            "report.preview_limit" => {
                self.report.preview_limit = value.trim().parse().map_err(|_| invalid())?
            }
            _ => {
                return Err(CatalogError::ConfigKeyNotFound {
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }

    /// List all config keys with their current values
    pub fn list(&self) -> Vec<(String, String)> {
        vec![
            (
                "paths.books_csv".to_string(),
                self.paths.books_csv.display().to_string(),
            ),
            (
                "paths.categories_csv".to_string(),
                self.paths.categories_csv.display().to_string(),
            ),
            (
                "paths.convert_csv".to_string(),
                self.paths.convert_csv.display().to_string(),
            ),
            (
                "paths.output_dir".to_string(),
                self.paths.output_dir.display().to_string(),
            ),
            ("paths.books_json".to_string(), self.paths.books_json.clone()),
            (
                "paths.categorized_json".to_string(),
                self.paths.categorized_json.clone(),
            ),
            (
                "loader.malformed_rows".to_string(),
                self.loader.malformed_rows.to_string(),
            ),
            (
                "categorize.sentinel_book_id".to_string(),
                self.categorize.sentinel_book_id.clone(),
            ),
            (
                "categorize.sentinel_category".to_string(),
                self.categorize.sentinel_category.clone(),
            ),
            (
                "categorize.unmatched".to_string(),
                self.categorize.unmatched.to_string(),
            ),
            (
                "categorize.bucket_id".to_string(),
                self.categorize.bucket_id.clone(),
            ),
            (
                "categorize.bucket_name".to_string(),
                self.categorize.bucket_name.clone(),
            ),
            (
                "report.preview_limit".to_string(),
                self.report.preview_limit.to_string(),
            ),
        ]
    }

    /// Output file locations, with `output_dir` resolved against `base_dir`
    pub fn output_paths(&self, base_dir: &Path) -> OutputPaths {
        OutputPaths::new(
            resolve(base_dir, &self.paths.output_dir),
            &self.paths.books_json,
            &self.paths.categorized_json,
        )
    }

    pub fn books_csv(&self, base_dir: &Path) -> PathBuf {
        resolve(base_dir, &self.paths.books_csv)
    }

    pub fn categories_csv(&self, base_dir: &Path) -> PathBuf {
        resolve(base_dir, &self.paths.categories_csv)
    }

    pub fn convert_csv(&self, base_dir: &Path) -> PathBuf {
        resolve(base_dir, &self.paths.convert_csv)
    }
}

/// Resolve a possibly relative path against the base directory
pub fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
