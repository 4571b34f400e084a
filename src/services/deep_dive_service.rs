use tracing::warn;

use crate::domain::{Article, DeepDive};
use crate::sources::ArticleGenerator;

pub struct DeepDiveService<G: ArticleGenerator> {
    generator: G,
}

impl<G: ArticleGenerator> DeepDiveService<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Analysis of the article; degrades to its own description so the
    /// original content is always displayable
    pub fn analyze(&self, article: &Article) -> DeepDive {
        match self.generator.deep_dive(article) {
            Ok(dive) if !dive.text.trim().is_empty() => dive,
            Ok(_) => {
                warn!(id = %article.id, "Deep dive came back empty; using description");
                DeepDive::plain(article.summary_text())
            }
            Err(e) => {
                warn!(id = %article.id, error = %e, "Deep dive failed; using description");
                DeepDive::plain(article.summary_text())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, Reference};
    use crate::errors::FlipError;
    use crate::sources::traits::MockArticleGenerator;

    fn article() -> Article {
        Article::new("http://x/a".to_string(), "A".to_string(), Category::News)
            .with_description("The lead".to_string())
            .with_content("The body".to_string())
    }

    #[test]
    fn test_analysis_passed_through() {
        let mut generator = MockArticleGenerator::new();
        generator.expect_deep_dive().times(1).returning(|_| {
            Ok(DeepDive::new(
                "Context and analysis".to_string(),
                vec![Reference {
                    uri: "https://ref/1".to_string(),
                    title: "Ref".to_string(),
                }],
            ))
        });

        let dive = DeepDiveService::new(generator).analyze(&article());

        assert_eq!(dive.text, "Context and analysis");
        assert_eq!(dive.references.len(), 1);
    }

    #[test]
    fn test_failure_uses_description() {
        let mut generator = MockArticleGenerator::new();
        generator
            .expect_deep_dive()
            .returning(|_| Err(FlipError::AnalysisFailure("quota".to_string())));

        let dive = DeepDiveService::new(generator).analyze(&article());

        assert_eq!(dive, DeepDive::plain("The lead"));
    }

    #[test]
    fn test_blank_analysis_uses_content_without_description() {
        let mut generator = MockArticleGenerator::new();
        generator
            .expect_deep_dive()
            .returning(|_| Ok(DeepDive::plain("   ")));

        let bare = Article::new("1".to_string(), "A".to_string(), Category::News)
            .with_content("Only body".to_string());
        let dive = DeepDiveService::new(generator).analyze(&bare);

        assert_eq!(dive.text, "Only body");
        assert!(dive.references.is_empty());
    }
}
