use crate::domain::{Article, Category, DeepDive, FetchRequest};
use crate::errors::FlipResult;

/// Primary news source
#[cfg_attr(test, mockall::automock)]
pub trait ArticleSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Fetch one page of headlines or search results
    fn fetch(&self, request: &FetchRequest) -> FlipResult<Vec<Article>>;
}

/// Generative service used when the primary source fails
#[cfg_attr(test, mockall::automock)]
pub trait ArticleGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Synthesize a batch of articles for a category
    fn generate(&self, category: Category) -> FlipResult<Vec<Article>>;

    /// Write an analysis of a single article with optional reference links
    fn deep_dive(&self, article: &Article) -> FlipResult<DeepDive>;
}
