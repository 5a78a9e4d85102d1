//! CSV loading for the book and category exports.
//!
//! Rows are read with a flexible reader, so a short row does not abort the
//! read; what happens to it is decided by [`MalformedRowPolicy`].

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::category::CategoryTable;
use crate::error::{CatalogError, Result};
use crate::model::{BookRecord, CategoryRecord};

/// Header names of the book export, in [`BookRecord`] field order
pub const BOOK_COLUMNS: [&str; 8] = [
    "bookId",
    "title",
    "author",
    "category",
    "description",
    "coverUrl",
    "contentURL",
    "txt",
];

/// Header names of the category export
pub const CATEGORY_COLUMNS: [&str; 3] = ["category_uuid", "name", "description"];

/// What happens to a row with fewer fields than the columns it must provide
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedRowPolicy {
    #[default]
    Skip,
    Error,
}

impl FromStr for MalformedRowPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown malformed row policy: {}", other)),
        }
    }
}

impl fmt::Display for MalformedRowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Skip => "skip",
            Self::Error => "error",
        })
    }
}

/// How book columns are located
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BookLayout {
    /// Columns found by header name ([`BOOK_COLUMNS`])
    #[default]
    Headed,
    /// Header row skipped, first eight columns taken by position
    Positional,
}

/// Row counts of a single load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_skipped: usize,
}

impl LoadReport {
    pub fn rows_loaded(&self) -> usize {
        self.rows_read - self.rows_skipped
    }
}

/// Selected fields of one CSV row
struct Row<'a> {
    record: &'a StringRecord,
    indices: &'a [usize],
}

impl Row<'_> {
    fn field(&self, n: usize) -> String {
        self.indices
            .get(n)
            .and_then(|&i| self.record.get(i))
            .unwrap_or_default()
            .to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Loader {
    policy: MalformedRowPolicy,
}

impl Loader {
    pub fn new(policy: MalformedRowPolicy) -> Self {
        Self { policy }
    }

    /// Load the book export from `path`
    pub fn load_books(
        &self,
        path: &Path,
        layout: BookLayout,
    ) -> Result<(Vec<BookRecord>, LoadReport)> {
        let content = read_source(path)?;
        let loaded = self.read_books(&content, layout, path)?;
        tracing::info!(
            path = %path.display(),
            books = loaded.0.len(),
            skipped = loaded.1.rows_skipped,
            "loaded books"
        );
        Ok(loaded)
    }

    /// Parse book rows from CSV text; `source` only names the input in errors
    pub fn read_books(
        &self,
        content: &str,
        layout: BookLayout,
        source: &Path,
    ) -> Result<(Vec<BookRecord>, LoadReport)> {
        let mut reader = csv_reader(content);
        let indices = match layout {
            BookLayout::Headed => column_indices(reader.headers()?, &BOOK_COLUMNS, source)?,
            BookLayout::Positional => {
                // consume the header row
                reader.headers()?;
                (0..BOOK_COLUMNS.len()).collect()
            }
        };

        self.collect_rows(&mut reader, &indices, |row| BookRecord {
            id: row.field(0),
            title: row.field(1),
            author: row.field(2),
            category_name: row.field(3),
            description: row.field(4),
            cover_url: row.field(5),
            content_url: row.field(6),
            text_url: row.field(7),
        })
    }

    /// Load the category export from `path` into a table with empty book lists
    pub fn load_categories(&self, path: &Path) -> Result<(CategoryTable, LoadReport)> {
        let content = read_source(path)?;
        let loaded = self.read_categories(&content, path)?;
        tracing::info!(
            path = %path.display(),
            categories = loaded.0.len(),
            skipped = loaded.1.rows_skipped,
            "loaded categories"
        );
        tracing::debug!(order = ?loaded.0.names(), "category order");
        Ok(loaded)
    }

    pub fn read_categories(
        &self,
        content: &str,
        source: &Path,
    ) -> Result<(CategoryTable, LoadReport)> {
        let mut reader = csv_reader(content);
        let indices = column_indices(reader.headers()?, &CATEGORY_COLUMNS, source)?;

        let (records, report) = self.collect_rows(&mut reader, &indices, |row| {
            CategoryRecord::new(row.field(0), row.field(1), row.field(2))
        })?;

        let mut table = CategoryTable::new();
        for record in records {
            let id = record.id.clone();
            if table.insert(record).is_some() {
                tracing::warn!(category = %id, "duplicate category id, keeping the last row");
            }
        }
        Ok((table, report))
    }

    fn collect_rows<T>(
        &self,
        reader: &mut csv::Reader<&[u8]>,
        indices: &[usize],
        build: impl Fn(&Row<'_>) -> T,
    ) -> Result<(Vec<T>, LoadReport)> {
        let required = indices.iter().max().map_or(0, |&i| i + 1);
        let mut report = LoadReport::default();
        let mut items = Vec::new();

        for result in reader.records() {
            let record = result?;
            report.rows_read += 1;

            if record.len() < required {
                let line = record.position().map_or(0, |p| p.line());
                match self.policy {
                    MalformedRowPolicy::Skip => {
                        tracing::warn!(
                            line,
                            found = record.len(),
                            expected = required,
                            "skipping malformed row"
                        );
                        report.rows_skipped += 1;
                        continue;
                    }
                    MalformedRowPolicy::Error => {
                        return Err(CatalogError::MalformedRow {
                            line,
                            found: record.len(),
                            expected: required,
                        });
                    }
                }
            }

            items.push(build(&Row {
                record: &record,
                indices,
            }));
        }

        Ok((items, report))
    }
}

fn read_source(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(CatalogError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    Ok(fs::read_to_string(path)?)
}

/// Flexible reader over `content`, ignoring a leading UTF-8 byte order mark
fn csv_reader(content: &str) -> csv::Reader<&[u8]> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.strip_prefix('\u{feff}').unwrap_or(content).as_bytes())
}

fn column_indices(
    headers: &StringRecord,
    columns: &[&str],
    source: &Path,
) -> Result<Vec<usize>> {
    columns
        .iter()
        .map(|column| {
            headers
                .iter()
                .position(|h| h.trim() == *column)
                .ok_or_else(|| CatalogError::MissingColumn {
                    column: column.to_string(),
                    path: PathBuf::from(source),
                })
        })
        .collect()
}
