//! Enhanced prompt library types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::Record;

/// Library category
///
/// The fixed set is matched case-insensitively; anything else is a
/// user-assigned category kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    General,
    Coding,
    Writing,
    Analysis,
    Creative,
    Business,
    Custom(String),
}

impl Category {
    /// The fixed categories, in display order
    pub const BUILTIN: [Category; 6] = [
        Category::General,
        Category::Coding,
        Category::Writing,
        Category::Analysis,
        Category::Creative,
        Category::Business,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::General => "General",
            Category::Coding => "Coding",
            Category::Writing => "Writing",
            Category::Analysis => "Analysis",
            Category::Creative => "Creative",
            Category::Business => "Business",
            Category::Custom(name) => name,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Category::General;
        }
        Category::BUILTIN
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            .cloned()
            .unwrap_or_else(|| Category::Custom(trimmed.to_string()))
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Category::from(value.as_str())
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Category::from(s))
    }
}

/// A saved enhancement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedPromptRecord {
    pub id: String,
    /// The user's raw input
    pub original_prompt: String,
    /// The model's rewrite
    pub enhanced_prompt: String,
    /// Instruction that produced the rewrite, kept so the record can be replayed
    pub system_prompt: String,
    pub category: Category,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub favorite: bool,
}

impl EnhancedPromptRecord {
    pub fn new(
        original_prompt: impl Into<String>,
        enhanced_prompt: impl Into<String>,
        system_prompt: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            id: String::new(),
            original_prompt: original_prompt.into(),
            enhanced_prompt: enhanced_prompt.into(),
            system_prompt: system_prompt.into(),
            category,
            created_at: Utc::now(),
            favorite: false,
        }
    }
}

impl Record for EnhancedPromptRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}
