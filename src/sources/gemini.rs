use chrono::{DateTime, SecondsFormat, Utc};
use itertools::Itertools;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::domain::article::stable_id;
use crate::domain::{Article, Category, DeepDive, Reference};
use crate::errors::{FlipError, FlipResult};
use crate::sources::traits::ArticleGenerator;
use crate::utils::truncate_chars;

/// Articles requested per generated batch
pub const GENERATED_BATCH_SIZE: usize = 10;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

/// One record of the generated array, before validation
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedArticle {
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    image: Option<String>,
    source: Option<String>,
    source_logo: Option<String>,
    published_at: Option<String>,
    author: Option<String>,
    likes: Option<Value>,
    comments_count: Option<Value>,
    url: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> Option<String> {
        let text: String = self
            .candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn references(&self) -> Vec<Reference> {
        let Some(metadata) = self
            .candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
        else {
            return Vec::new();
        };

        metadata
            .grounding_chunks
            .iter()
            .filter_map(|chunk| chunk.web.as_ref())
            .filter_map(|web| {
                let uri = web.uri.as_deref()?.trim();
                if uri.is_empty() {
                    return None;
                }
                let title = web
                    .title
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .unwrap_or(uri);
                Some(Reference {
                    uri: uri.to_string(),
                    title: title.to_string(),
                })
            })
            .unique_by(|r| r.uri.clone())
            .collect()
    }
}

pub struct GeminiGenerator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    language: String,
}

impl GeminiGenerator {
    pub fn new(base_url: &str, api_key: Option<String>, model: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
            language: "fr".to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.gemini_base_url,
            config.gemini_api_key.clone(),
            &config.gemini_model,
        )
        .with_language(&config.language)
    }

    pub fn with_language(mut self, language: &str) -> Self {
        self.language = language.to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn send(&self, body: &Value) -> FlipResult<GenerateResponse> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| FlipError::Config("no generative API key configured".to_string()))?;

        debug!(model = %self.model, "Calling generative API");
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()?
            .error_for_status()?;

        Ok(response.json()?)
    }

    fn articles_prompt(&self, category: Category) -> String {
        format!(
            "Generate {count} realistic, engaging press articles for the category: {category}. \
             They should read as if they came from real newspapers (Le Monde, TechCrunch, etc.). \
             Each article needs a punchy title, a description of about 150 characters and \
             content of about 1000 characters. Write in the language with code '{language}'. \
             Answer with JSON only.",
            count = GENERATED_BATCH_SIZE,
            category = category.as_str(),
            language = self.language,
        )
    }

    fn deep_dive_prompt(&self, article: &Article) -> String {
        format!(
            "Act as an expert press analyst. Analyse this article:\n\
             Title: {title}\n\
             Source: {source}\n\
             Description: {description}\n\
             Partial content: {content}\n\n\
             Write a deep dive of about 400 words, in the language with code '{language}', that:\n\
             1. Summarises the key points.\n\
             2. Adds historical, economic or technical context found through search.\n\
             3. Explains why this matters today.\n\
             Use an elegant, structured journalistic tone.",
            title = article.title,
            source = article.source,
            description = article.description,
            content = article.content,
            language = self.language,
        )
    }

    /// Parse the generated JSON array and keep records that satisfy the schema
    fn articles_from_text(text: &str, category: Category) -> FlipResult<Vec<Article>> {
        let json = strip_code_fence(text);
        let records: Vec<GeneratedArticle> = serde_json::from_str(json)
            .map_err(|e| FlipError::GenerationFailure(format!("malformed article batch: {}", e)))?;

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        Ok(records
            .into_iter()
            .filter_map(|record| Self::map_record(record, category, &now))
            .unique_by(|article| article.id.clone())
            .collect())
    }

    fn map_record(record: GeneratedArticle, category: Category, now: &str) -> Option<Article> {
        let title = non_blank(record.title)?;
        let content = non_blank(record.content)?;
        let source = non_blank(record.source)?;

        let url = non_blank(record.url);
        let id = non_blank(record.id).unwrap_or_else(|| stable_id(url.as_deref(), &title));

        let description =
            non_blank(record.description).unwrap_or_else(|| truncate_chars(&content, 150));
        let author = non_blank(record.author).unwrap_or_else(|| source.clone());

        let published_at = record
            .published_at
            .filter(|p| DateTime::parse_from_rfc3339(p.trim()).is_ok())
            .map(|p| p.trim().to_string())
            .unwrap_or_else(|| now.to_string());

        let likes = record.likes.as_ref().map(count_from).unwrap_or(0);
        let comments = record.comments_count.as_ref().map(count_from).unwrap_or(0);

        Some(
            Article::new(id, title, category)
                .with_description(description)
                .with_content(content)
                .with_image(record.image)
                .with_source_logo(record.source_logo)
                .with_source(source)
                .with_author(author)
                .with_published_at(published_at)
                .with_engagement(likes, comments)
                .with_url(url.unwrap_or_default()),
        )
    }
}

impl ArticleGenerator for GeminiGenerator {
    fn name(&self) -> &'static str {
        "gemini"
    }

    #[instrument(level = "info", skip(self))]
    fn generate(&self, category: Category) -> FlipResult<Vec<Article>> {
        let body = json!({
            "contents": [{ "parts": [{ "text": self.articles_prompt(category) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": article_batch_schema(),
            },
        });

        let response = self
            .send(&body)
            .map_err(|e| FlipError::GenerationFailure(e.to_string()))?;
        let text = response
            .text()
            .ok_or_else(|| FlipError::GenerationFailure("response had no text".to_string()))?;

        let articles = Self::articles_from_text(&text, category)?;
        info!(count = articles.len(), "Generated fallback articles");

        Ok(articles)
    }

    #[instrument(level = "info", skip_all, fields(id = %article.id))]
    fn deep_dive(&self, article: &Article) -> FlipResult<DeepDive> {
        let body = json!({
            "contents": [{ "parts": [{ "text": self.deep_dive_prompt(article) }] }],
            "tools": [{ "google_search": {} }],
        });

        let response = self
            .send(&body)
            .map_err(|e| FlipError::AnalysisFailure(e.to_string()))?;
        let text = response
            .text()
            .ok_or_else(|| FlipError::AnalysisFailure("response had no text".to_string()))?;
        let references = response.references();

        info!(references = references.len(), "Generated deep dive");
        Ok(DeepDive::new(text, references))
    }
}

/// Output schema for a batch of generated articles
fn article_batch_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": { "type": "STRING" },
                "title": { "type": "STRING" },
                "description": { "type": "STRING" },
                "content": { "type": "STRING" },
                "image": { "type": "STRING", "description": "Realistic Unsplash image URL related to the topic" },
                "source": { "type": "STRING" },
                "sourceLogo": { "type": "STRING" },
                "publishedAt": { "type": "STRING", "description": "ISO-8601 timestamp" },
                "author": { "type": "STRING" },
                "likes": { "type": "NUMBER" },
                "commentsCount": { "type": "NUMBER" },
                "url": { "type": "STRING", "description": "Fictional link or link to a real source" }
            },
            "required": ["id", "title", "description", "content", "image", "source", "publishedAt", "author", "url"]
        }
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Engagement count from a number or numeric string; anything else counts as zero
fn count_from(value: &Value) -> u32 {
    let value = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };

    if value.is_finite() && value > 0.0 {
        value.min(u32::MAX as f64) as u32
    } else {
        0
    }
}

/// Models sometimes wrap JSON in a markdown fence despite the mime type
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::article::placeholder_image;
    use httpmock::prelude::*;

    const MODEL: &str = "gemini-test";

    fn generator_for(server: &MockServer) -> GeminiGenerator {
        GeminiGenerator::new(&server.base_url(), Some("gem-key".to_string()), MODEL)
    }

    fn text_response(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }], "role": "model" }
            }]
        })
    }

    fn sample_article() -> Article {
        Article::new("http://x/a".to_string(), "Title".to_string(), Category::Tech)
            .with_description("Lead paragraph".to_string())
            .with_content("Body".to_string())
            .with_source("X".to_string())
    }

    #[test]
    fn test_records_validated_and_backfilled() {
        let text = json!([
            {
                "id": "gen-1",
                "title": "Generated",
                "description": "Short",
                "content": "Long content",
                "source": "Le Monde",
                "publishedAt": "2024-03-01T10:00:00Z",
                "author": "A. Writer",
                "url": "https://example.com/gen-1",
                "likes": 12,
                "commentsCount": 3.0
            },
            {
                "id": "gen-2",
                "title": "",
                "content": "Missing title",
                "source": "X"
            },
            {
                "id": "gen-3",
                "title": "Odd date",
                "content": "Content",
                "source": "X",
                "image": "https://img/3.jpg",
                "publishedAt": "yesterday"
            }
        ])
        .to_string();

        let articles = GeminiGenerator::articles_from_text(&text, Category::Science).unwrap();

        assert_eq!(articles.len(), 2);

        let first = &articles[0];
        assert_eq!(first.id, "gen-1");
        assert_eq!(first.image, placeholder_image("gen-1"));
        assert!(first.source_logo.contains("ui-avatars.com"));
        assert_eq!(first.category, Category::Science);
        assert_eq!((first.likes, first.comments), (12, 3));

        let third = &articles[1];
        assert_eq!(third.image, "https://img/3.jpg");
        assert_eq!(third.description, "Content");
        assert_eq!(third.author, "X");
        assert!(DateTime::parse_from_rfc3339(&third.published_at).is_ok());
    }

    #[test]
    fn test_malformed_batch_is_generation_failure() {
        let err = GeminiGenerator::articles_from_text("{\"not\": \"an array\"}", Category::News)
            .unwrap_err();
        assert!(matches!(err, FlipError::GenerationFailure(_)));
    }

    #[test]
    fn test_loosely_typed_counts_keep_the_batch() {
        let text = json!([
            {
                "id": "gen-1",
                "title": "String counts",
                "content": "Content",
                "source": "X",
                "likes": "12",
                "commentsCount": " 4 "
            },
            {
                "id": "gen-2",
                "title": "Odd counts",
                "content": "Content",
                "source": "X",
                "likes": {"value": 3},
                "commentsCount": -2
            }
        ])
        .to_string();

        let articles = GeminiGenerator::articles_from_text(&text, Category::News).unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!((articles[0].likes, articles[0].comments), (12, 4));
        assert_eq!((articles[1].likes, articles[1].comments), (0, 0));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("  [1] "), "[1]");
    }

    #[test]
    fn test_generate_sends_schema() {
        let server = MockServer::start();
        let batch = json!([{
            "id": "g1", "title": "T", "description": "D", "content": "C",
            "source": "S", "publishedAt": "2024-01-01T00:00:00Z", "author": "A", "url": "u"
        }])
        .to_string();

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path(format!("/v1beta/models/{}:generateContent", MODEL))
                .header("x-goog-api-key", "gem-key")
                .body_contains("responseSchema")
                .body_contains("application/json");
            then.status(200).json_body(text_response(&batch));
        });

        let articles = generator_for(&server).generate(Category::Food).unwrap();

        mock.assert();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].category, Category::Food);
    }

    #[test]
    fn test_generate_http_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(503);
        });

        let err = generator_for(&server).generate(Category::News).unwrap_err();
        assert!(matches!(err, FlipError::GenerationFailure(_)));
    }

    #[test]
    fn test_generate_without_key() {
        let generator = GeminiGenerator::new("http://127.0.0.1:9", None, MODEL);
        let err = generator.generate(Category::News).unwrap_err();
        assert!(matches!(err, FlipError::GenerationFailure(_)));
    }

    #[test]
    fn test_deep_dive_collects_references() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).body_contains("google_search");
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "Part one. " }, { "text": "Part two." }] },
                    "groundingMetadata": {
                        "groundingChunks": [
                            { "web": { "uri": "https://ref/1", "title": "Ref one" } },
                            { "web": { "uri": "https://ref/1", "title": "Duplicate" } },
                            { "web": { "uri": "https://ref/2" } },
                            { "retrievedContext": {} }
                        ]
                    }
                }]
            }));
        });

        let dive = generator_for(&server).deep_dive(&sample_article()).unwrap();

        mock.assert();
        assert_eq!(dive.text, "Part one. Part two.");
        assert_eq!(
            dive.references,
            vec![
                Reference { uri: "https://ref/1".to_string(), title: "Ref one".to_string() },
                Reference { uri: "https://ref/2".to_string(), title: "https://ref/2".to_string() },
            ]
        );
    }

    #[test]
    fn test_deep_dive_without_text_is_analysis_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(200).json_body(json!({ "candidates": [] }));
        });

        let err = generator_for(&server).deep_dive(&sample_article()).unwrap_err();
        assert!(matches!(err, FlipError::AnalysisFailure(_)));
    }
}
