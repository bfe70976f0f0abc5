use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::Item,
};

/// Title and provider key for one catalog row, in position order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub title: String,
    pub external_id: String,
}

impl CatalogEntry {
    pub fn new(title: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            external_id: external_id.into(),
        }
    }
}

/// Immutable title -> position index over the loaded catalog
///
/// Positions are assigned in load order and double as row/column indices into
/// the similarity matrix. When several entries share a title, lookups by that
/// title resolve to the first one loaded.
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    items: Vec<Item>,
    by_title: HashMap<String, usize>,
}

impl CatalogIndex {
    /// Builds the index, assigning positions in iteration order
    pub fn new(entries: impl IntoIterator<Item = CatalogEntry>) -> Self {
        let mut items = Vec::new();
        let mut by_title = HashMap::new();
        let mut duplicates = 0usize;

        for (position, entry) in entries.into_iter().enumerate() {
            if by_title.contains_key(&entry.title) {
                duplicates += 1;
            } else {
                by_title.insert(entry.title.clone(), position);
            }

            items.push(Item {
                position,
                title: entry.title,
                external_id: entry.external_id,
            });
        }

        if duplicates > 0 {
            tracing::warn!(
                duplicates = duplicates,
                "Catalog contains repeated titles, lookups resolve to the first occurrence"
            );
        }

        Self { items, by_title }
    }

    /// Resolves a title to its position
    ///
    /// Matching is exact and case-sensitive.
    pub fn resolve(&self, title: &str) -> AppResult<usize> {
        if title.trim().is_empty() {
            return Err(AppError::InvalidInput("Title cannot be empty".to_string()));
        }

        self.by_title
            .get(title)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("No catalog item titled '{}'", title)))
    }

    /// Returns the display attributes stored at `position`
    pub fn attributes(&self, position: usize) -> AppResult<&Item> {
        self.items
            .get(position)
            .ok_or_else(|| AppError::out_of_range(position, self.items.len()))
    }

    /// Case-insensitive substring search over titles, in load order
    pub fn search(&self, query: &str, limit: usize) -> AppResult<Vec<&Item>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        Ok(self
            .items
            .iter()
            .filter(|item| item.title.to_lowercase().contains(&needle))
            .take(limit)
            .collect())
    }

    /// All items in position order
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
