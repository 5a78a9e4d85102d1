//! Membership checks over the categorized output.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{CatalogError, Result};
use crate::model::{BookRecord, CategoryRecord};

/// A book id met again while scanning the categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateEntry {
    pub id: String,
    pub title: String,
    /// Category in which the repeat was found
    pub category: String,
}

/// A book from the flat list that no category carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UncategorizedEntry {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub id: String,
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub total_books: usize,
    pub total_categories: usize,
    pub categories_with_books: usize,
    pub empty_categories: usize,
    /// Sum of all category sizes, duplicates included
    pub total_categorized_books: usize,
    pub distinct_categorized_books: usize,
    /// In scan order: categories in list order, books in category order
    pub duplicates: Vec<DuplicateEntry>,
    /// In flat list order
    pub uncategorized: Vec<UncategorizedEntry>,
    /// Categorized ids missing from the flat list
    pub stray_ids: Vec<String>,
    /// Sorted by count, descending; ties keep category order
    pub category_counts: Vec<CategoryCount>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty() && self.uncategorized.is_empty() && self.stray_ids.is_empty()
    }

    /// Fail with [`CatalogError::ValidationFailed`] unless the report is clean
    pub fn ensure_clean(&self) -> Result<()> {
        if self.is_clean() {
            return Ok(());
        }
        Err(CatalogError::ValidationFailed {
            duplicates: self.duplicates.len(),
            uncategorized: self.uncategorized.len(),
            stray: self.stray_ids.len(),
        })
    }
}

/// First `limit` items and the number left over
pub fn preview<T>(items: &[T], limit: usize) -> (&[T], usize) {
    let shown = &items[..items.len().min(limit)];
    (shown, items.len() - shown.len())
}

pub fn validate(books: &[BookRecord], categories: &[CategoryRecord]) -> ValidationReport {
    let all_ids: HashSet<&str> = books.iter().map(|b| b.id.as_str()).collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut duplicates = Vec::new();
    let mut stray_ids = Vec::new();

    for category in categories {
        for book in &category.books {
            if !seen.insert(book.id.as_str()) {
                duplicates.push(DuplicateEntry {
                    id: book.id.clone(),
                    title: book.title.clone(),
                    category: category.name.clone(),
                });
            } else if !all_ids.contains(book.id.as_str()) {
                stray_ids.push(book.id.clone());
            }
        }
    }

    let mut reported: HashSet<&str> = HashSet::new();
    let uncategorized = books
        .iter()
        .filter(|b| !seen.contains(b.id.as_str()) && reported.insert(b.id.as_str()))
        .map(|b| UncategorizedEntry {
            id: b.id.clone(),
            title: b.title.clone(),
        })
        .collect();

    let mut category_counts: Vec<CategoryCount> = categories
        .iter()
        .map(|c| CategoryCount {
            id: c.id.clone(),
            name: c.name.clone(),
            count: c.books.len(),
        })
        .collect();
    // stable sort keeps category order among equal counts
    category_counts.sort_by(|a, b| b.count.cmp(&a.count));

    let categories_with_books = categories.iter().filter(|c| !c.books.is_empty()).count();

    ValidationReport {
        total_books: books.len(),
        total_categories: categories.len(),
        categories_with_books,
        empty_categories: categories.len() - categories_with_books,
        total_categorized_books: categories.iter().map(|c| c.books.len()).sum(),
        distinct_categorized_books: seen.len(),
        duplicates,
        uncategorized,
        stray_ids,
        category_counts,
    }
}
