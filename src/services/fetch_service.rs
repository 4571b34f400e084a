use tracing::{error, info, instrument, warn};

use crate::domain::{Article, Category, FetchRequest, Origin, Resolution};
use crate::sources::{ArticleGenerator, ArticleSource};
use crate::storage::traits::ResolutionCache;

/// Resolves article lists: cache first, then the primary source, then the generator
pub struct FetchService<S: ArticleSource, G: ArticleGenerator, C: ResolutionCache> {
    source: S,
    generator: G,
    cache: C,
}

impl<S: ArticleSource, G: ArticleGenerator, C: ResolutionCache> FetchService<S, G, C> {
    pub fn new(source: S, generator: G, cache: C) -> Self {
        Self {
            source,
            generator,
            cache,
        }
    }

    /// Never fails: the worst case is an empty list
    #[instrument(level = "info", skip_all, fields(key = %request.cache_key()))]
    pub fn resolve(&self, request: &FetchRequest) -> Resolution {
        let key = request.cache_key();

        if let Some(articles) = self.cache.get(&key) {
            info!(count = articles.len(), "Serving articles from cache");
            return Resolution::new(articles, Origin::Cache);
        }

        let (articles, origin) = match self.source.fetch(request) {
            Ok(articles) => (articles, Origin::Primary),
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "Primary source failed; falling back");
                (self.fallback(request.category), Origin::Fallback)
            }
        };

        info!(count = articles.len(), %origin, "Resolved articles");
        self.cache.put(&key, articles.clone());

        Resolution::new(articles, origin)
    }

    fn fallback(&self, category: Category) -> Vec<Article> {
        match self.generator.generate(category) {
            Ok(articles) => articles,
            Err(e) => {
                error!(generator = self.generator.name(), error = %e, "Fallback generation failed; returning no articles");
                Vec::new()
            }
        }
    }
}
