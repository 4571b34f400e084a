use crate::domain::Article;
use crate::errors::FlipResult;
use crate::storage::traits::LibraryRepository;

pub struct LibraryService<R: LibraryRepository> {
    repository: R,
}

impl<R: LibraryRepository> LibraryService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Attach the local bookmark and like flags to freshly resolved articles
    pub fn annotate(&self, articles: Vec<Article>) -> FlipResult<Vec<Article>> {
        let ids: Vec<String> = articles.iter().map(|a| a.id.clone()).collect();
        let bookmarked = self.repository.bookmarked_ids(&ids)?;
        let liked = self.repository.liked_ids(&ids)?;

        Ok(articles
            .into_iter()
            .map(|mut article| {
                article.is_bookmarked = bookmarked.contains(&article.id);
                article.is_liked = liked.contains(&article.id);
                if article.is_liked {
                    article.likes += 1;
                }
                article
            })
            .collect())
    }

    /// Returns the article with its bookmark flag updated
    pub fn toggle_bookmark(&self, article: &Article) -> FlipResult<Article> {
        let bookmarked = self.repository.toggle_bookmark(article)?;
        Ok(Article {
            is_bookmarked: bookmarked,
            ..article.clone()
        })
    }

    /// Returns the article with its like flag and displayed count updated
    pub fn toggle_like(&self, article: &Article) -> FlipResult<Article> {
        let liked = self.repository.toggle_like(article)?;
        let likes = match (article.is_liked, liked) {
            (false, true) => article.likes + 1,
            (true, false) => article.likes.saturating_sub(1),
            _ => article.likes,
        };

        Ok(Article {
            is_liked: liked,
            likes,
            ..article.clone()
        })
    }

    pub fn record_read(&self, article: &Article) -> FlipResult<()> {
        self.repository.record_read(article)
    }

    pub fn bookmarks(&self) -> FlipResult<Vec<Article>> {
        let bookmarks = self.repository.bookmarks()?;
        self.annotate(bookmarks)
    }

    pub fn liked(&self) -> FlipResult<Vec<Article>> {
        let liked = self.repository.liked()?;
        self.annotate(liked)
    }

    pub fn history(&self, limit: usize) -> FlipResult<Vec<Article>> {
        let history = self.repository.history(limit)?;
        self.annotate(history)
    }
}
