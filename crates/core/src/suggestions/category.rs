//! Curated category priorities

use std::collections::HashMap;

use crate::errors::DomainError;

/// Built-in curated categories with their priority rank (lower wins).
pub const DEFAULT_PRIORITY_CATEGORIES: &[(&str, u32)] = &[
    ("54276", 1),
    ("54302", 2),
    ("44824", 3),
    ("54330", 4),
    ("54290", 5),
    ("54344", 6),
    ("54412", 7),
    ("54384", 8),
    ("54362", 9),
    ("54500", 10),
    ("54474", 11),
];

/// Extract the category id at `level` from a slash-delimited category path.
///
/// The first segment of a path is the root marker, so level `n` lives at
/// index `n + 1`.
pub fn category_id(primary_category_path: &str, level: usize) -> Result<&str, DomainError> {
    primary_category_path.split('/').nth(level + 1).ok_or_else(|| {
        DomainError::MalformedCategoryPath { path: primary_category_path.to_owned(), level }
    })
}

/// Immutable mapping from category id to priority rank.
///
/// Lookups return `None` for categories outside the curated set; callers
/// decide which fallback rank applies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryPriorityTable {
    ranks: HashMap<String, u32>,
}

impl CategoryPriorityTable {
    pub fn new<I, K>(entries: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = (K, u32)>,
        K: Into<String>,
    {
        let mut ranks = HashMap::new();
        for (category, rank) in entries {
            let category = category.into();
            if rank == 0 {
                return Err(DomainError::InvalidPriorityRank { category, rank });
            }
            if category.is_empty() {
                return Err(DomainError::InvariantViolation(
                    "priority category id must not be empty".to_owned(),
                ));
            }
            if ranks.contains_key(&category) {
                return Err(DomainError::InvariantViolation(format!(
                    "priority category `{category}` is listed more than once"
                )));
            }
            ranks.insert(category, rank);
        }

        Ok(Self { ranks })
    }

    pub fn rank_of(&self, category_id: &str) -> Option<u32> {
        self.ranks.get(category_id).copied()
    }

    pub fn contains(&self, category_id: &str) -> bool {
        self.ranks.contains_key(category_id)
    }

    /// Highest configured rank, or 0 for an empty table.
    pub fn max_rank(&self) -> u32 {
        self.ranks.values().copied().max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Entries ordered by rank, then category id.
    pub fn entries(&self) -> Vec<(&str, u32)> {
        let mut entries: Vec<(&str, u32)> =
            self.ranks.iter().map(|(category, rank)| (category.as_str(), *rank)).collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

impl Default for CategoryPriorityTable {
    fn default() -> Self {
        Self {
            ranks: DEFAULT_PRIORITY_CATEGORIES
                .iter()
                .map(|(category, rank)| ((*category).to_owned(), *rank))
                .collect(),
        }
    }
}
