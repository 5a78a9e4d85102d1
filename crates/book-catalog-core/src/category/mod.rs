//! # Category Module
//!
//! Files books into the categories they name.
//!
//! ## Module layout
//!
//! - `table`: ordered category id -> category mapping
//! - `categorizer`: assignment by name, sentinel override, unmatched policy
//!
//! ## Example
//!
//! ```rust
//! use book_catalog_core::category::{Categorizer, CategoryTable, UnmatchedPolicy};
//! use book_catalog_core::{BookRecord, CategoryRecord};
//!
//! let mut table: CategoryTable = [CategoryRecord::new("c1", "Fiction", "Novels and stories")]
//!     .into_iter()
//!     .collect();
//!
//! let books = vec![BookRecord {
//!     id: "b1".to_string(),
//!     title: "Moby Dick".to_string(),
//!     author: "Herman Melville".to_string(),
//!     category_name: "Fiction".to_string(),
//!     description: String::new(),
//!     cover_url: String::new(),
//!     content_url: String::new(),
//!     text_url: String::new(),
//! }];
//!
//! let outcome = Categorizer::new(UnmatchedPolicy::Drop)
//!     .categorize(&books, &mut table)
//!     .unwrap();
//! assert_eq!(outcome.assigned, 1);
//! assert_eq!(table.get("c1").unwrap().books.len(), 1);
//! ```

mod categorizer;
mod table;

// Re-exports
pub use categorizer::{CategorizeOutcome, Categorizer, SentinelRule, UnmatchedPolicy};
pub use table::CategoryTable;
