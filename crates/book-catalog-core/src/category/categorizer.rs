//! Categorizer
//!
//! Files each book under the category whose name equals the book's stated
//! category. One configured book (the sentinel) always goes to a fixed
//! category instead.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{
    CategorizeConfig, DEFAULT_BUCKET_ID, DEFAULT_BUCKET_NAME, DEFAULT_SENTINEL_BOOK_ID,
    DEFAULT_SENTINEL_CATEGORY,
};
use crate::error::{CatalogError, Result};
use crate::model::{BookRecord, CategoryRecord};

use super::table::CategoryTable;

/// What happens to a book whose category matches no category name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedPolicy {
    /// Leave the book out of every category (it is still reported)
    #[default]
    Drop,
    /// Collect the book in a dedicated bucket category
    Bucket,
    /// Fail the whole run
    Error,
}

impl FromStr for UnmatchedPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(Self::Drop),
            "bucket" => Ok(Self::Bucket),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown unmatched policy: {}", other)),
        }
    }
}

impl fmt::Display for UnmatchedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Drop => "drop",
            Self::Bucket => "bucket",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Override rule: the book with `book_id` is filed under `category_name`
/// whatever its own category says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelRule {
    pub book_id: String,
    pub category_name: String,
}

impl Default for SentinelRule {
    fn default() -> Self {
        Self {
            book_id: DEFAULT_SENTINEL_BOOK_ID.to_string(),
            category_name: DEFAULT_SENTINEL_CATEGORY.to_string(),
        }
    }
}

/// Result of a categorization run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorizeOutcome {
    /// Books filed under a matching category
    pub assigned: usize,
    /// Books whose category matched nothing, in input order
    pub unmatched: Vec<BookRecord>,
    /// Whether the sentinel book was seen and filed under its target
    pub sentinel_applied: bool,
    /// Policy that was applied to `unmatched`
    pub policy: UnmatchedPolicy,
}

/// Where a single book should go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Category(usize),
    Sentinel(usize),
    Unmatched,
}

pub struct Categorizer {
    sentinel: Option<SentinelRule>,
    policy: UnmatchedPolicy,
    bucket_id: String,
    bucket_name: String,
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new(UnmatchedPolicy::default())
    }
}

impl Categorizer {
    /// Categorizer with the default sentinel rule and bucket
    pub fn new(policy: UnmatchedPolicy) -> Self {
        Self {
            sentinel: Some(SentinelRule::default()),
            policy,
            bucket_id: DEFAULT_BUCKET_ID.to_string(),
            bucket_name: DEFAULT_BUCKET_NAME.to_string(),
        }
    }

    pub fn from_config(config: &CategorizeConfig) -> Self {
        Self::new(config.unmatched)
            .with_sentinel(config.sentinel_rule())
            .with_bucket(&config.bucket_id, &config.bucket_name)
    }

    pub fn with_sentinel(mut self, rule: SentinelRule) -> Self {
        self.sentinel = Some(rule);
        self
    }

    pub fn without_sentinel(mut self) -> Self {
        self.sentinel = None;
        self
    }

    pub fn with_policy(mut self, policy: UnmatchedPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_bucket(mut self, id: &str, name: &str) -> Self {
        self.bucket_id = id.to_string();
        self.bucket_name = name.to_string();
        self
    }

    /// Append every book to its category in `table`.
    ///
    /// Placement is decided for all books before the table is touched, so a
    /// failure under [`UnmatchedPolicy::Error`] leaves `table` unchanged.
    pub fn categorize(
        &self,
        books: &[BookRecord],
        table: &mut CategoryTable,
    ) -> Result<CategorizeOutcome> {
        let placements: Vec<Placement> = books.iter().map(|b| self.place(b, table)).collect();

        if self.policy == UnmatchedPolicy::Error {
            if let Some((book, _)) = books
                .iter()
                .zip(&placements)
                .find(|(_, p)| **p == Placement::Unmatched)
            {
                return Err(CatalogError::UnmatchedCategory {
                    book_id: book.id.clone(),
                    category: book.category_name.clone(),
                });
            }
        }

        let mut outcome = CategorizeOutcome {
            policy: self.policy,
            ..Default::default()
        };

        for (book, placement) in books.iter().zip(placements) {
            match placement {
                Placement::Category(index) | Placement::Sentinel(index) => {
                    if let Some(category) = table.at_mut(index) {
                        tracing::debug!(book = %book.id, category = %category.name, "assigned");
                        category.books.push(book.clone());
                        outcome.assigned += 1;
                    }
                    if matches!(placement, Placement::Sentinel(_)) {
                        outcome.sentinel_applied = true;
                    }
                }
                Placement::Unmatched => {
                    tracing::warn!(
                        book = %book.id,
                        category = %book.category_name,
                        policy = %self.policy,
                        "book matches no category"
                    );
                    if self.policy == UnmatchedPolicy::Bucket {
                        let index = self.bucket_index(table);
                        if let Some(bucket) = table.at_mut(index) {
                            bucket.books.push(book.clone());
                        }
                    }
                    outcome.unmatched.push(book.clone());
                }
            }
        }

        Ok(outcome)
    }

    fn place(&self, book: &BookRecord, table: &CategoryTable) -> Placement {
        if let Some(rule) = self.sentinel.as_ref().filter(|r| r.book_id == book.id) {
            return match table.position_by_name(&rule.category_name) {
                Some(index) => Placement::Sentinel(index),
                None => {
                    tracing::warn!(
                        book = %book.id,
                        category = %rule.category_name,
                        "sentinel target category not found"
                    );
                    Placement::Unmatched
                }
            };
        }

        match table.position_by_name(&book.category_name) {
            Some(index) => Placement::Category(index),
            None => Placement::Unmatched,
        }
    }

    /// Position of the bucket category, created at the end of the table on first use
    fn bucket_index(&self, table: &mut CategoryTable) -> usize {
        if let Some(index) = table.position(&self.bucket_id) {
            return index;
        }
        table.insert(CategoryRecord::new(
            self.bucket_id.clone(),
            self.bucket_name.clone(),
            "Books whose category matched no known category",
        ));
        table.len() - 1
    }
}
