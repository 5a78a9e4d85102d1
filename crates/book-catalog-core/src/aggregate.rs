//! The two JSON outputs: the flat book list and the categorized list.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::category::{CategorizeOutcome, Categorizer, CategoryTable};
use crate::error::{CatalogError, Result};
use crate::model::{BookRecord, CategoryRecord};
use crate::validate::{self, ValidationReport};

pub const BOOKS_FILE: &str = "books.json";
pub const CATEGORIZED_FILE: &str = "categorized_books.json";

/// Locations of the two output files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub dir: PathBuf,
    pub books: PathBuf,
    pub categorized: PathBuf,
}

impl OutputPaths {
    pub fn new(dir: PathBuf, books_file: &str, categorized_file: &str) -> Self {
        Self {
            books: dir.join(books_file),
            categorized: dir.join(categorized_file),
            dir,
        }
    }

    /// Default file names inside `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir.into(), BOOKS_FILE, CATEGORIZED_FILE)
    }
}

/// A written output file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputFileInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub sha256: String,
}

impl OutputFileInfo {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            size_bytes: content.len() as u64,
            sha256: compute_hash(&content),
        })
    }

    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

/// Flat book list plus the categories carrying their books
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub books: Vec<BookRecord>,
    pub categories: Vec<CategoryRecord>,
}

impl Catalog {
    /// Categorize `books` into `table` and assemble both outputs
    pub fn build(
        books: Vec<BookRecord>,
        mut table: CategoryTable,
        categorizer: &Categorizer,
    ) -> Result<(Self, CategorizeOutcome)> {
        let outcome = categorizer.categorize(&books, &mut table)?;
        let catalog = Self {
            books,
            categories: table.into_vec(),
        };
        Ok((catalog, outcome))
    }

    /// Write both JSON files, creating the output directory if needed
    pub fn write(&self, paths: &OutputPaths) -> Result<Vec<OutputFileInfo>> {
        fs::create_dir_all(&paths.dir)?;
        let books = write_json(&paths.books, &self.books)?;
        let categorized = write_json(&paths.categorized, &self.categories)?;
        tracing::info!(
            dir = %paths.dir.display(),
            books = self.books.len(),
            categories = self.categories.len(),
            "wrote catalog"
        );
        Ok(vec![books, categorized])
    }

    /// Read both JSON files back
    pub fn read(paths: &OutputPaths) -> Result<Self> {
        Ok(Self {
            books: read_json(&paths.books)?,
            categories: read_json(&paths.categorized)?,
        })
    }

    pub fn validate(&self) -> ValidationReport {
        validate::validate(&self.books, &self.categories)
    }
}

/// Write the flat book list alone (legacy converter output)
pub fn write_books(path: &Path, books: &[BookRecord]) -> Result<OutputFileInfo> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_json(path, books)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<OutputFileInfo> {
    let content = serde_json::to_vec_pretty(value)?;
    fs::write(path, &content)?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "wrote json");
    Ok(OutputFileInfo {
        path: path.to_path_buf(),
        size_bytes: content.len() as u64,
        sha256: compute_hash(&content),
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(CatalogError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let content = fs::read(path)?;
    Ok(serde_json::from_slice(&content)?)
}

pub fn compute_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    format!("sha256:{}", hex::encode(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::UnmatchedPolicy;
    use crate::model::book;
    use tempfile::TempDir;

    fn sample() -> (Vec<BookRecord>, CategoryTable) {
        let books = vec![
            book("b1", "Fiction"),
            book("b2", "Poetry"),
            book("b3", "Mystère"),
        ];
        let table = [
            CategoryRecord::new("c1", "Fiction", ""),
            CategoryRecord::new("c2", "Poetry", ""),
            CategoryRecord::new("c3", "Drama", ""),
        ]
        .into_iter()
        .collect();
        (books, table)
    }

    #[test]
    fn test_build_keeps_table_order_and_all_books() {
        let (books, table) = sample();
        let (catalog, outcome) =
            Catalog::build(books, table, &Categorizer::new(UnmatchedPolicy::Drop)).unwrap();

        assert_eq!(catalog.books.len(), 3);
        let names: Vec<_> = catalog.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Fiction", "Poetry", "Drama"]);
        assert_eq!(outcome.unmatched.len(), 1);
        assert!(catalog.categories[2].books.is_empty());
    }

    #[test]
    fn test_write_then_read_back() {
        let dir = TempDir::new().unwrap();
        let paths = OutputPaths::in_dir(dir.path().join("public"));
        let (books, table) = sample();
        let (catalog, _) = Catalog::build(books, table, &Categorizer::default()).unwrap();

        let written = catalog.write(&paths).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].path, paths.books);
        assert!(written[0].sha256.starts_with("sha256:"));
        assert_eq!(written[1], OutputFileInfo::from_path(&paths.categorized).unwrap());

        let read = Catalog::read(&paths).unwrap();
        assert_eq!(read, catalog);
    }

    #[test]
    fn test_output_json_shape() {
        let dir = TempDir::new().unwrap();
        let paths = OutputPaths::in_dir(dir.path());
        let (books, table) = sample();
        let (catalog, _) =
            Catalog::build(books, table, &Categorizer::new(UnmatchedPolicy::Drop)).unwrap();
        catalog.write(&paths).unwrap();

        let raw = fs::read_to_string(&paths.categorized).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["category_id"], "c1");
        assert_eq!(value[0]["books"][0]["bookId"], "b1");

        let raw_books = fs::read_to_string(&paths.books).unwrap();
        assert!(raw_books.contains("Mystère"), "non-ASCII must be kept verbatim");
        assert!(raw_books.starts_with("[\n  {"));
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let paths = OutputPaths::in_dir(dir.path());
        fs::write(&paths.books, "[]").unwrap();

        let err = Catalog::read(&paths).unwrap_err();
        match err {
            CatalogError::MissingFile { path } => assert_eq!(path, paths.categorized),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_write_books_creates_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("books.json");

        let info = write_books(&path, &[book("b1", "Fiction")]).unwrap();
        assert!(path.exists());
        assert!(info.size_kb() > 0.0);
    }

    #[test]
    fn test_csv_to_validated_catalog() {
        use crate::config::DEFAULT_SENTINEL_BOOK_ID;
        use crate::loader::{BookLayout, Loader};

        let dir = TempDir::new().unwrap();
        let books_csv = format!(
            "bookId,title,author,category,description,coverUrl,contentURL,txt\n\
             b1,Moby Dick,Melville,Fiction,,,,\n\
             {},Grimms' Fairy Tales,Grimm,Folklore,,,,\n\
             b3,Lost,Nobody,Atlases,,,,\n\
             b4,Broken row\n",
            DEFAULT_SENTINEL_BOOK_ID
        );
        let categories_csv = "\u{feff}category_uuid,name,description\n\
                              c1,Fiction,\n\
                              c2,Children's,\n";
        fs::write(dir.path().join("books.csv"), books_csv).unwrap();
        fs::write(dir.path().join("categories.csv"), categories_csv).unwrap();

        let loader = Loader::default();
        let (table, _) = loader
            .load_categories(&dir.path().join("categories.csv"))
            .unwrap();
        let (books, report) = loader
            .load_books(&dir.path().join("books.csv"), BookLayout::Headed)
            .unwrap();
        assert_eq!(report.rows_skipped, 1);

        let paths = OutputPaths::in_dir(dir.path().join("public"));
        let (catalog, outcome) =
            Catalog::build(books, table, &Categorizer::new(UnmatchedPolicy::Drop)).unwrap();
        assert!(outcome.sentinel_applied);
        catalog.write(&paths).unwrap();

        let report = Catalog::read(&paths).unwrap().validate();
        assert_eq!(report.total_books, 3);
        assert_eq!(report.total_categories, 2);
        assert!(report.duplicates.is_empty());
        assert_eq!(report.uncategorized.len(), 1);
        assert_eq!(report.uncategorized[0].id, "b3");
        assert_eq!(report.category_counts[0].count, 1);
    }

    #[test]
    fn test_default_build_reports_unmatched_as_uncategorized() {
        let books = vec![book("b1", "Fiction"), book("b2", "Nope")];
        let table = [CategoryRecord::new("c1", "Fiction", "")]
            .into_iter()
            .collect();

        let (catalog, outcome) = Catalog::build(books, table, &Categorizer::default()).unwrap();
        assert_eq!(outcome.policy, UnmatchedPolicy::Drop);
        assert_eq!(catalog.categories.len(), 1);
        assert!(catalog
            .categories
            .iter()
            .all(|c| c.books.iter().all(|b| b.id != "b2")));

        let report = catalog.validate();
        assert!(!report.is_clean());
        assert_eq!(report.uncategorized.len(), 1);
        assert_eq!(report.uncategorized[0].id, "b2");
    }

    #[test]
    fn test_compute_hash_is_stable() {
        assert_eq!(compute_hash(b"[]"), compute_hash(b"[]"));
        assert_ne!(compute_hash(b"[]"), compute_hash(b"{}"));
    }
}
