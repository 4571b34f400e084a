use crate::domain::Article;
use crate::errors::FlipResult;

/// Resolved article lists keyed by request, with time-based staleness
#[cfg_attr(test, mockall::automock)]
pub trait ResolutionCache: Send + Sync {
    /// Stored articles, or `None` when absent or stale
    fn get(&self, key: &str) -> Option<Vec<Article>>;

    /// Store articles under `key`, replacing any previous entry
    fn put(&self, key: &str, articles: Vec<Article>);
}

/// Bookmarks, likes and reading history kept on this machine
#[cfg_attr(test, mockall::automock)]
pub trait LibraryRepository: Send + Sync {
    /// Returns true when the article is bookmarked after the call
    fn toggle_bookmark(&self, article: &Article) -> FlipResult<bool>;
    fn bookmarks(&self) -> FlipResult<Vec<Article>>;
    fn bookmarked_ids(&self, article_ids: &[String]) -> FlipResult<Vec<String>>;

    /// Returns true when the article is liked after the call
    fn toggle_like(&self, article: &Article) -> FlipResult<bool>;
    /// Most recently liked first
    fn liked(&self) -> FlipResult<Vec<Article>>;
    fn liked_ids(&self, article_ids: &[String]) -> FlipResult<Vec<String>>;

    fn record_read(&self, article: &Article) -> FlipResult<()>;
    /// Most recently read first
    fn history(&self, limit: usize) -> FlipResult<Vec<Article>>;
}
