pub mod aggregate;
pub mod category;
pub mod config;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use aggregate::{compute_hash, write_books, Catalog, OutputFileInfo, OutputPaths};
pub use category::{CategorizeOutcome, Categorizer, CategoryTable, SentinelRule, UnmatchedPolicy};
pub use config::Config;
pub use error::{CatalogError, Result};
pub use loader::{BookLayout, LoadReport, Loader, MalformedRowPolicy};
pub use model::{BookRecord, CategoryRecord};
pub use validate::{
    preview, validate, CategoryCount, DuplicateEntry, UncategorizedEntry, ValidationReport,
};
