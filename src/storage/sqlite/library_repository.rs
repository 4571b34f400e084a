use crate::domain::Article;
use crate::errors::{FlipError, FlipResult};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::LibraryRepository;

/// Entries kept in the reading history
pub const HISTORY_LIMIT: usize = 50;

pub struct SqliteLibraryRepository {
    storage: SqliteStorage,
}

impl SqliteLibraryRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    /// Which of `article_ids` appear in `table`
    fn existing_ids(&self, table: &str, article_ids: &[String]) -> FlipResult<Vec<String>> {
        if article_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.storage.connection()?;

        // Build placeholders for IN clause
        let placeholders: Vec<String> = (0..article_ids.len())
            .map(|i| format!("?{}", i + 1))
            .collect();
        let query = format!(
            "SELECT article_id FROM {} WHERE article_id IN ({})",
            table,
            placeholders.join(", ")
        );

        let mut stmt = conn.prepare(&query)?;
        let found: Vec<String> = stmt
            .query_map(rusqlite::params_from_iter(article_ids.iter()), |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        Ok(found)
    }

    /// Stored form of an article: local flags cleared, like count without the local like
    fn snapshot(article: &Article) -> FlipResult<String> {
        let mut snapshot = article.clone();
        if snapshot.is_liked {
            snapshot.likes = snapshot.likes.saturating_sub(1);
        }
        snapshot.is_bookmarked = false;
        snapshot.is_liked = false;
        Ok(serde_json::to_string(&snapshot)?)
    }

    fn read_snapshots(&self, query: &str, params: impl rusqlite::Params) -> FlipResult<Vec<Article>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(query)?;
        let rows: Vec<String> = stmt
            .query_map(params, |row| row.get(0))?
            .collect::<Result<_, _>>()?;

        rows.iter()
            .map(|json| serde_json::from_str(json).map_err(FlipError::from))
            .collect()
    }

    /// Remove the article from `table`, or add its snapshot when it was absent
    fn toggle_snapshot(&self, table: &str, article: &Article) -> FlipResult<bool> {
        let snapshot = Self::snapshot(article)?;
        let conn = self.storage.connection()?;
        let tx = conn.unchecked_transaction()?;

        let removed = tx.execute(
            &format!("DELETE FROM {} WHERE article_id = ?1", table),
            [&article.id],
        )?;
        if removed == 0 {
            tx.execute(
                &format!("INSERT INTO {} (article_id, article_json) VALUES (?1, ?2)", table),
                (&article.id, &snapshot),
            )?;
        }

        tx.commit()?;
        Ok(removed == 0)
    }
}

impl LibraryRepository for SqliteLibraryRepository {
    fn toggle_bookmark(&self, article: &Article) -> FlipResult<bool> {
        self.toggle_snapshot("bookmarks", article)
    }

    fn bookmarks(&self) -> FlipResult<Vec<Article>> {
        self.read_snapshots("SELECT article_json FROM bookmarks ORDER BY id DESC", [])
    }

    fn bookmarked_ids(&self, article_ids: &[String]) -> FlipResult<Vec<String>> {
        self.existing_ids("bookmarks", article_ids)
    }

    fn toggle_like(&self, article: &Article) -> FlipResult<bool> {
        self.toggle_snapshot("likes", article)
    }

    fn liked(&self) -> FlipResult<Vec<Article>> {
        self.read_snapshots("SELECT article_json FROM likes ORDER BY id DESC", [])
    }

    fn liked_ids(&self, article_ids: &[String]) -> FlipResult<Vec<String>> {
        self.existing_ids("likes", article_ids)
    }

    fn record_read(&self, article: &Article) -> FlipResult<()> {
        let snapshot = Self::snapshot(article)?;
        let conn = self.storage.connection()?;
        let tx = conn.unchecked_transaction()?;

        // Re-inserting moves the article to the front
        tx.execute(
            "DELETE FROM reading_history WHERE article_id = ?1",
            [&article.id],
        )?;
        tx.execute(
            "INSERT INTO reading_history (article_id, article_json) VALUES (?1, ?2)",
            (&article.id, &snapshot),
        )?;
        tx.execute(
            "DELETE FROM reading_history WHERE id NOT IN (SELECT id FROM reading_history ORDER BY id DESC LIMIT ?1)",
            [HISTORY_LIMIT as i64],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn history(&self, limit: usize) -> FlipResult<Vec<Article>> {
        self.read_snapshots(
            "SELECT article_json FROM reading_history ORDER BY id DESC LIMIT ?1",
            [limit as i64],
        )
    }
}
