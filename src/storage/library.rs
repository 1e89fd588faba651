//! Enhanced prompt library storage and queries

use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;

use crate::storage::{Collection, KeyValueStore};
use crate::types::{Category, EnhancedPromptRecord};

/// Storage key of the library collection
pub const LIBRARY_KEY: &str = "enhanced_prompts";

pub type Library = Collection<EnhancedPromptRecord>;

/// Load the library, empty on first run
pub fn load_library(store: Arc<dyn KeyValueStore>) -> Library {
    Collection::load(store, LIBRARY_KEY, Vec::new)
}

/// Category filter; `All` is the wildcard
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, category: &Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => wanted == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            Ok(CategoryFilter::Only(Category::from(s)))
        }
    }
}

/// Library ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Most recent first
    #[default]
    Newest,
    Oldest,
    /// Category name, then most recent first
    Category,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "category" => Ok(SortOrder::Category),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

/// What the library view shows
#[derive(Debug, Clone, Default)]
pub struct LibraryQuery {
    pub category: CategoryFilter,
    pub favorites_only: bool,
    /// Case-insensitive substring over original and enhanced prompt
    pub search: Option<String>,
    pub order: SortOrder,
}

impl LibraryQuery {
    pub fn matches(&self, record: &EnhancedPromptRecord) -> bool {
        if !self.category.matches(&record.category) {
            return false;
        }
        if self.favorites_only && !record.favorite {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                record.original_prompt.to_lowercase().contains(&needle)
                    || record.enhanced_prompt.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }

    pub fn compare(&self, a: &EnhancedPromptRecord, b: &EnhancedPromptRecord) -> Ordering {
        match self.order {
            SortOrder::Newest => b.created_at.cmp(&a.created_at),
            SortOrder::Oldest => a.created_at.cmp(&b.created_at),
            SortOrder::Category => a
                .category
                .as_str()
                .to_lowercase()
                .cmp(&b.category.as_str().to_lowercase())
                .then_with(|| b.created_at.cmp(&a.created_at)),
        }
    }
}

/// Run `query` over the library
pub fn query(library: &Library, query: &LibraryQuery) -> Vec<EnhancedPromptRecord> {
    library.select(|r| query.matches(r), |a, b| query.compare(a, b))
}

/// Flip the favorite flag, returning the new value
pub fn toggle_favorite(library: &mut Library, id: &str) -> Option<bool> {
    let mut favorite = None;
    library.update(id, |record| {
        record.favorite = !record.favorite;
        favorite = Some(record.favorite);
    });
    favorite
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    fn record_at(category: Category, minutes: i64, text: &str) -> EnhancedPromptRecord {
        let mut record = EnhancedPromptRecord::new(text, format!("Enhanced: {}", text), "sys", category);
        record.created_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes);
        record
    }

    fn library_with(records: Vec<EnhancedPromptRecord>) -> Library {
        let mut library = load_library(Arc::new(MemoryStore::new()));
        for record in records {
            library.add(record);
        }
        library
    }

    #[test]
    fn test_first_run_is_empty() {
        assert!(load_library(Arc::new(MemoryStore::new())).is_empty());
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let library = library_with(vec![
            record_at(Category::General, 2, "t2"),
            record_at(Category::General, 1, "t1"),
            record_at(Category::General, 3, "t3"),
        ]);

        let shown = query(&library, &LibraryQuery::default());
        let order: Vec<_> = shown.iter().map(|r| r.original_prompt.as_str()).collect();
        assert_eq!(order, vec!["t3", "t2", "t1"]);
    }

    #[test]
    fn test_category_filter_keeps_sorted_order() {
        let library = library_with(vec![
            record_at(Category::General, 3, "general"),
            record_at(Category::Coding, 1, "older"),
            record_at(Category::Coding, 2, "newer"),
        ]);

        let filter = LibraryQuery {
            category: "Coding".parse().unwrap(),
            ..Default::default()
        };
        let shown = query(&library, &filter);
        let order: Vec<_> = shown.iter().map(|r| r.original_prompt.as_str()).collect();
        assert_eq!(order, vec!["newer", "older"]);
    }

    #[test]
    fn test_all_is_wildcard() {
        assert_eq!("ALL".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        let library = library_with(vec![
            record_at(Category::Writing, 1, "a"),
            record_at(Category::Custom("Travel".into()), 2, "b"),
        ]);
        assert_eq!(query(&library, &LibraryQuery::default()).len(), 2);
    }

    #[test]
    fn test_favorites_and_search() {
        let mut library = library_with(vec![
            record_at(Category::General, 1, "Plan a trip to Lisbon"),
            record_at(Category::General, 2, "Refactor the parser"),
        ]);
        let lisbon = library.items()[0].id.clone();
        assert_eq!(toggle_favorite(&mut library, &lisbon), Some(true));

        let favorites = LibraryQuery {
            favorites_only: true,
            ..Default::default()
        };
        assert_eq!(query(&library, &favorites).len(), 1);

        let search = LibraryQuery {
            search: Some("PARSER".into()),
            ..Default::default()
        };
        let found = query(&library, &search);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].original_prompt, "Refactor the parser");
    }

    #[test]
    fn test_category_order() {
        let library = library_with(vec![
            record_at(Category::Writing, 1, "w"),
            record_at(Category::Coding, 1, "c-old"),
            record_at(Category::Coding, 5, "c-new"),
        ]);
        let by_category = LibraryQuery {
            order: SortOrder::Category,
            ..Default::default()
        };
        let order: Vec<_> = query(&library, &by_category)
            .into_iter()
            .map(|r| r.original_prompt)
            .collect();
        assert_eq!(order, vec!["c-new", "c-old", "w"]);
    }

    #[test]
    fn test_toggle_unknown_id() {
        let mut library = library_with(vec![]);
        assert_eq!(toggle_favorite(&mut library, "nope"), None);
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!("Oldest".parse::<SortOrder>(), Ok(SortOrder::Oldest));
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
