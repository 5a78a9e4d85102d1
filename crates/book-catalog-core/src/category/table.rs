//! Category Table
//!
//! Ordered mapping from category id to [`CategoryRecord`].
//! Iteration order is the order in which ids were first inserted.

use crate::model::CategoryRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryTable {
    categories: Vec<CategoryRecord>,
}

impl CategoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a category.
    ///
    /// - An unknown id is appended at the end
    /// - A known id is replaced in place and keeps its position; the old record is returned
    pub fn insert(&mut self, record: CategoryRecord) -> Option<CategoryRecord> {
        match self.position(&record.id) {
            Some(index) => Some(std::mem::replace(&mut self.categories[index], record)),
            None => {
                self.categories.push(record);
                None
            }
        }
    }

    /// Category by id
    pub fn get(&self, id: &str) -> Option<&CategoryRecord> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.id == id)
    }

    /// First category (in table order) with the given name
    pub(crate) fn position_by_name(&self, name: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.name == name)
    }

    pub(crate) fn at_mut(&mut self, index: usize) -> Option<&mut CategoryRecord> {
        self.categories.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CategoryRecord> {
        self.categories.iter()
    }

    /// Category names in table order
    pub fn names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn into_vec(self) -> Vec<CategoryRecord> {
        self.categories
    }
}

impl FromIterator<CategoryRecord> for CategoryTable {
    fn from_iter<I: IntoIterator<Item = CategoryRecord>>(iter: I) -> Self {
        let mut table = Self::new();
        for record in iter {
            table.insert(record);
        }
        table
    }
}

impl IntoIterator for CategoryTable {
    type Item = CategoryRecord;
    type IntoIter = std::vec::IntoIter<CategoryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.categories.into_iter()
    }
}

impl<'a> IntoIterator for &'a CategoryTable {
    type Item = &'a CategoryRecord;
    type IntoIter = std::slice::Iter<'a, CategoryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.categories.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_is_kept() {
        let table: CategoryTable = [
            CategoryRecord::new("c2", "Poetry", ""),
            CategoryRecord::new("c1", "Fiction", ""),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.names(), vec!["Poetry", "Fiction"]);
        assert!(table.get("c1").is_some());
        assert!(table.get("c3").is_none());
    }

    #[test]
    fn test_duplicate_id_replaces_in_place() {
        let mut table = CategoryTable::new();
        table.insert(CategoryRecord::new("c1", "Fiction", "old"));
        table.insert(CategoryRecord::new("c2", "Poetry", ""));

        let old = table.insert(CategoryRecord::new("c1", "Novels", "new"));
        assert_eq!(old.map(|c| c.description).as_deref(), Some("old"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.names(), vec!["Novels", "Poetry"]);
    }

    #[test]
    fn test_position_by_name_returns_first() {
        let table: CategoryTable = [
            CategoryRecord::new("c1", "Fiction", "first"),
            CategoryRecord::new("c2", "Fiction", "second"),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.position_by_name("Fiction"), Some(0));
        assert!(table.position_by_name("fiction").is_none());
    }
}
