use serde::{Deserialize, Serialize};

/// A single book as it appears in the flat `books.json` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    #[serde(rename = "bookId")]
    pub id: String,
    pub title: String,
    pub author: String,
    /// Category name as stated by the source row
    #[serde(rename = "category")]
    pub category_name: String,
    pub description: String,
    #[serde(rename = "coverUrl")]
    pub cover_url: String,
    #[serde(rename = "contentURL")]
    pub content_url: String,
    #[serde(rename = "txt")]
    pub text_url: String,
}

/// A category together with the books assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    #[serde(rename = "category_id")]
    pub id: String,
    #[serde(rename = "category_name")]
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub books: Vec<BookRecord>,
}

impl CategoryRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            books: Vec::new(),
        }
    }
}

#[cfg(test)]
pub(crate) fn book(id: &str, category: &str) -> BookRecord {
    BookRecord {
        id: id.to_string(),
        title: format!("Title of {}", id),
        author: "Anonymous".to_string(),
        category_name: category.to_string(),
        description: String::new(),
        cover_url: String::new(),
        content_url: String::new(),
        text_url: String::new(),
    }
}
