use super::{Article, Category};
use crate::errors::{FlipError, FlipResult};

/// What to fetch: a category's headlines, or a free-text search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub category: Category,
    pub query: Option<String>,
    pub page: u32,
}

impl FetchRequest {
    pub fn new(category: Category, query: Option<String>, page: u32) -> FlipResult<Self> {
        if page == 0 {
            return Err(FlipError::InvalidInput("page must be at least 1".to_string()));
        }

        let query = query
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());

        Ok(Self {
            category,
            query,
            page,
        })
    }

    pub fn headlines(category: Category, page: u32) -> FlipResult<Self> {
        Self::new(category, None, page)
    }

    pub fn search(category: Category, query: &str, page: u32) -> FlipResult<Self> {
        Self::new(category, Some(query.to_string()), page)
    }

    pub fn is_search(&self) -> bool {
        self.query.is_some()
    }

    /// Always `mode:subject:page`, the query taking precedence over the category
    pub fn cache_key(&self) -> String {
        match &self.query {
            Some(query) => format!("search:{}:{}", query.to_lowercase(), self.page),
            None => format!("headlines:{}:{}", self.category.as_str(), self.page),
        }
    }

    pub fn with_page(&self, page: u32) -> FlipResult<Self> {
        Self::new(self.category, self.query.clone(), page)
    }
}

/// Where a resolved article list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Primary,
    Fallback,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Cache => "cache",
            Origin::Primary => "primary",
            Origin::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub articles: Vec<Article>,
    pub origin: Origin,
}

impl Resolution {
    pub fn new(articles: Vec<Article>, origin: Origin) -> Self {
        Self { articles, origin }
    }

    /// True when the articles were just resolved over the network
    pub fn is_fresh(&self) -> bool {
        self.origin != Origin::Cache
    }
}
