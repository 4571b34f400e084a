use serde::{Deserialize, Serialize};

use crate::errors::FlipError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    #[default]
    News,
    Tech,
    Entertainment,
    Sports,
    Travel,
    Food,
    Business,
    Science,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::News,
        Category::Tech,
        Category::Entertainment,
        Category::Sports,
        Category::Travel,
        Category::Food,
        Category::Business,
        Category::Science,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::News => "news",
            Category::Tech => "tech",
            Category::Entertainment => "entertainment",
            Category::Sports => "sports",
            Category::Travel => "travel",
            Category::Food => "food",
            Category::Business => "business",
            Category::Science => "science",
        }
    }

    /// Category name understood by the headlines endpoint
    pub fn provider_category(&self) -> &'static str {
        match self {
            Category::News | Category::Travel | Category::Food => "general",
            Category::Tech => "technology",
            Category::Entertainment => "entertainment",
            Category::Sports => "sports",
            Category::Business => "business",
            Category::Science => "science",
        }
    }

    /// Keyword used to approximate categories the provider has no native equivalent for
    pub fn search_keyword(&self) -> Option<&'static str> {
        match self {
            Category::Travel => Some("voyage"),
            Category::Food => Some("cuisine"),
            _ => None,
        }
    }
}

impl std::str::FromStr for Category {
    type Err = FlipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "news" | "general" => Ok(Category::News),
            "tech" | "technology" => Ok(Category::Tech),
            "entertainment" => Ok(Category::Entertainment),
            "sports" | "sport" => Ok(Category::Sports),
            "travel" => Ok(Category::Travel),
            "food" => Ok(Category::Food),
            "business" => Ok(Category::Business),
            "science" => Ok(Category::Science),
            _ => Err(FlipError::UnknownCategory(s.to_string())),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
