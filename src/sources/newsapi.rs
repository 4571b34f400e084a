use chrono::{DateTime, SecondsFormat, Utc};
use itertools::Itertools;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::domain::article::{engagement_for, stable_id};
use crate::domain::{Article, Category, FetchRequest};
use crate::errors::{FlipError, FlipResult, UnavailableReason};
use crate::sources::text::clean_text;
use crate::sources::traits::ArticleSource;

/// Title NewsAPI substitutes for articles that were taken down
const REMOVED_TITLE: &str = "[Removed]";

const NO_DESCRIPTION: &str = "No description available.";
const NO_CONTENT: &str = "Full content is not available.";
const UNKNOWN_SOURCE: &str = "Unknown source";

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    url_to_image: Option<String>,
    #[serde(default)]
    source: RawSource,
    author: Option<String>,
    published_at: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSource {
    name: Option<String>,
}

pub struct NewsApiSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    country: String,
    language: String,
    page_size: u32,
}

impl NewsApiSource {
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .user_agent(concat!("flipboard/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            country: "fr".to_string(),
            language: "fr".to_string(),
            page_size: 20,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.news_api_base_url, config.news_api_key.clone())
            .with_locale(&config.country, &config.language)
            .with_page_size(config.page_size)
    }

    pub fn with_locale(mut self, country: &str, language: &str) -> Self {
        self.country = country.to_string();
        self.language = language.to_string();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Headlines by category, or full-text search when the request has a query
    fn build_url(&self, request: &FetchRequest, api_key: &str) -> FlipResult<Url> {
        let page_size = self.page_size.to_string();
        let page = request.page.to_string();

        let url = match &request.query {
            Some(query) => Url::parse_with_params(
                &format!("{}/v2/everything", self.base_url),
                &[
                    ("q", query.as_str()),
                    ("language", self.language.as_str()),
                    ("sortBy", "publishedAt"),
                    ("pageSize", page_size.as_str()),
                    ("page", page.as_str()),
                    ("apiKey", api_key),
                ],
            ),
            None => {
                let mut params = vec![
                    ("country", self.country.as_str()),
                    ("category", request.category.provider_category()),
                ];
                if let Some(keyword) = request.category.search_keyword() {
                    params.push(("q", keyword));
                }
                params.push(("pageSize", page_size.as_str()));
                params.push(("page", page.as_str()));
                params.push(("apiKey", api_key));

                Url::parse_with_params(&format!("{}/v2/top-headlines", self.base_url), &params)
            }
        };

        url.map_err(|e| FlipError::Config(format!("invalid news API URL: {}", e)))
    }

    /// Parse a response body into normalized articles
    fn articles_from_body(body: &str, category: Category) -> FlipResult<Vec<Article>> {
        let response: NewsApiResponse = serde_json::from_str(body)?;

        if response.status != "ok" {
            return Err(FlipError::SourceUnavailable(UnavailableReason::Provider {
                code: response.code,
                message: response
                    .message
                    .unwrap_or_else(|| format!("status {}", response.status)),
            }));
        }

        let articles = Self::map_articles(response.articles, category);
        if articles.is_empty() {
            return Err(FlipError::SourceUnavailable(UnavailableReason::Empty));
        }

        Ok(articles)
    }

    fn map_articles(raw: Vec<RawArticle>, category: Category) -> Vec<Article> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        raw.into_iter()
            .filter_map(|raw| Self::map_article(raw, category, &now))
            .unique_by(|article| article.id.clone())
            .collect()
    }

    fn map_article(raw: RawArticle, category: Category, now: &str) -> Option<Article> {
        let title = raw
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && t != REMOVED_TITLE)?;

        let url = raw.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
        let id = stable_id(url.as_deref(), &title);

        let description = clean_text(raw.description.as_deref());
        let content = clean_text(raw.content.as_deref())
            .or_else(|| description.clone())
            .unwrap_or_else(|| NO_CONTENT.to_string());

        let source = raw
            .source
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());

        let author = raw
            .author
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| source.clone());

        let published_at = raw
            .published_at
            .map(|p| p.trim().to_string())
            .filter(|p| DateTime::parse_from_rfc3339(p).is_ok())
            .unwrap_or_else(|| now.to_string());

        let (likes, comments) = engagement_for(&id);

        Some(
            Article::new(id, title, category)
                .with_description(description.unwrap_or_else(|| NO_DESCRIPTION.to_string()))
                .with_content(content)
                .with_image(raw.url_to_image)
                .with_source(source)
                .with_author(author)
                .with_published_at(published_at)
                .with_engagement(likes, comments)
                .with_url(url.unwrap_or_default()),
        )
    }
}

impl ArticleSource for NewsApiSource {
    fn name(&self) -> &'static str {
        "newsapi"
    }

    #[instrument(level = "info", skip_all, fields(key = %request.cache_key()))]
    fn fetch(&self, request: &FetchRequest) -> FlipResult<Vec<Article>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(FlipError::SourceUnavailable(UnavailableReason::MissingApiKey))?;

        let url = self.build_url(request, api_key)?;
        debug!(url = %redact_key(&url), "Requesting news API");

        let response = self.client.get(url).send()?;
        let status = response.status();

        if status == StatusCode::UPGRADE_REQUIRED || status == StatusCode::FORBIDDEN {
            warn!(status = status.as_u16(), "News API refused access");
            return Err(FlipError::SourceUnavailable(UnavailableReason::Restricted(
                status.as_u16(),
            )));
        }
        if !status.is_success() {
            return Err(FlipError::SourceUnavailable(UnavailableReason::HttpStatus(
                status.as_u16(),
            )));
        }

        let body = response.text()?;
        let articles = Self::articles_from_body(&body, request.category)?;
        info!(count = articles.len(), "Fetched articles from news API");

        Ok(articles)
    }
}

/// URL for logs, with the API key masked
fn redact_key(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if k == "apiKey" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), value)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::article::placeholder_image;
    use httpmock::prelude::*;
    use serde_json::json;

    fn source_for(server: &MockServer) -> NewsApiSource {
        NewsApiSource::new(&server.base_url(), Some("test-key".to_string()))
    }

    #[test]
    fn test_example_payload_maps_to_one_article() {
        let body = json!({
            "status": "ok",
            "articles": [{
                "title": "A",
                "urlToImage": null,
                "source": {"name": "X"},
                "publishedAt": "2024-01-01T00:00:00Z",
                "url": "http://x/a"
            }]
        })
        .to_string();

        let articles = NewsApiSource::articles_from_body(&body, Category::Tech).unwrap();

        assert_eq!(articles.len(), 1);
        let article = &articles[0];
        assert_eq!(article.id, "http://x/a");
        assert_eq!(article.url, "http://x/a");
        assert_eq!(article.image, placeholder_image("http://x/a"));
        assert_eq!(article.category, Category::Tech);
        assert_eq!(article.source, "X");
        assert_eq!(article.author, "X");
        assert_eq!(article.published_at, "2024-01-01T00:00:00Z");
        assert_eq!(article.description, NO_DESCRIPTION);
        assert_eq!(article.content, NO_CONTENT);
    }

    #[test]
    fn test_removed_and_untitled_articles_filtered() {
        let body = json!({
            "status": "ok",
            "articles": [
                {"title": "[Removed]", "url": "https://removed.com", "source": {"name": "[Removed]"}},
                {"title": null, "url": "http://x/untitled", "source": {"name": "X"}},
                {"title": "  ", "url": "http://x/blank", "source": {"name": "X"}},
                {"title": "Kept", "url": "http://x/kept", "source": {"name": "X"}}
            ]
        })
        .to_string();

        let articles = NewsApiSource::articles_from_body(&body, Category::News).unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Kept");
    }

    #[test]
    fn test_duplicate_urls_collapse_to_one_id() {
        let body = json!({
            "status": "ok",
            "articles": [
                {"title": "First", "url": "http://x/same", "source": {"name": "X"}},
                {"title": "Second", "url": "http://x/same", "source": {"name": "Y"}}
            ]
        })
        .to_string();

        let articles = NewsApiSource::articles_from_body(&body, Category::News).unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "First");
    }

    #[test]
    fn test_missing_url_uses_title_hash() {
        let body = json!({
            "status": "ok",
            "articles": [{"title": "No link here", "source": {"name": "X"}}]
        })
        .to_string();

        let first = NewsApiSource::articles_from_body(&body, Category::News).unwrap();
        let second = NewsApiSource::articles_from_body(&body, Category::News).unwrap();

        assert!(first[0].id.starts_with("title-"));
        assert_eq!(first[0].id, second[0].id);
    }

    #[test]
    fn test_content_cleaned_and_defaulted() {
        let body = json!({
            "status": "ok",
            "articles": [
                {
                    "title": "With content",
                    "url": "http://x/1",
                    "description": "<p>Lead</p>",
                    "content": "Body text… [+1200 chars]",
                    "source": {"name": "X"}
                },
                {
                    "title": "Description only",
                    "url": "http://x/2",
                    "description": "Only a lead",
                    "source": {"name": "X"}
                }
            ]
        })
        .to_string();

        let articles = NewsApiSource::articles_from_body(&body, Category::News).unwrap();

        assert_eq!(articles[0].description, "Lead");
        assert_eq!(articles[0].content, "Body text");
        assert_eq!(articles[1].content, "Only a lead");
    }

    #[test]
    fn test_unparseable_date_replaced_with_now() {
        let body = json!({
            "status": "ok",
            "articles": [
                {"title": "Odd", "url": "http://x/1", "publishedAt": "yesterday"},
                {"title": "Blank", "url": "http://x/2", "publishedAt": " "},
                {"title": "Good", "url": "http://x/3", "publishedAt": "2024-05-01T08:30:00Z"}
            ]
        })
        .to_string();

        let articles = NewsApiSource::articles_from_body(&body, Category::News).unwrap();

        assert!(DateTime::parse_from_rfc3339(&articles[0].published_at).is_ok());
        assert!(DateTime::parse_from_rfc3339(&articles[1].published_at).is_ok());
        assert_eq!(articles[2].published_at, "2024-05-01T08:30:00Z");
    }

    #[test]
    fn test_every_category_yields_complete_articles() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v2/top-headlines");
            then.status(200).json_body(json!({
                "status": "ok",
                "articles": [
                    {"title": "Sparse", "url": "http://x/sparse", "publishedAt": "soon"},
                    {
                        "title": "Full",
                        "url": "http://x/full",
                        "description": "Lead",
                        "content": "Body [+10 chars]",
                        "urlToImage": "https://img/full.jpg",
                        "author": "Reporter",
                        "source": {"name": "Le Monde"},
                        "publishedAt": "2024-01-01T00:00:00Z"
                    }
                ]
            }));
        });
        let source = source_for(&server);

        for category in Category::ALL {
            let request = FetchRequest::headlines(category, 1).unwrap();
            let articles = source.fetch(&request).unwrap();

            assert_eq!(articles.len(), 2, "{}", category);
            for article in &articles {
                assert_eq!(article.category, category);
                for field in [
                    &article.id,
                    &article.title,
                    &article.description,
                    &article.content,
                    &article.image,
                    &article.source,
                    &article.source_logo,
                    &article.author,
                    &article.url,
                ] {
                    assert!(!field.trim().is_empty(), "{}: empty field in {:?}", category, article);
                }
                assert!(DateTime::parse_from_rfc3339(&article.published_at).is_ok());
            }
        }
    }

    #[test]
    fn test_provider_error_payload() {
        let body = json!({
            "status": "error",
            "code": "apiKeyInvalid",
            "message": "Your API key is invalid"
        })
        .to_string();

        let err = NewsApiSource::articles_from_body(&body, Category::News).unwrap_err();

        match err {
            FlipError::SourceUnavailable(UnavailableReason::Provider { code, message }) => {
                assert_eq!(code.as_deref(), Some("apiKeyInvalid"));
                assert_eq!(message, "Your API key is invalid");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_article_list_is_unavailable() {
        let body = json!({"status": "ok", "totalResults": 0, "articles": []}).to_string();

        let err = NewsApiSource::articles_from_body(&body, Category::News).unwrap_err();
        assert!(matches!(
            err,
            FlipError::SourceUnavailable(UnavailableReason::Empty)
        ));
    }

    #[test]
    fn test_fetch_headlines_query_params() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v2/top-headlines")
                .query_param("country", "fr")
                .query_param("category", "technology")
                .query_param("page", "2")
                .query_param("pageSize", "20")
                .query_param("apiKey", "test-key");
            then.status(200).json_body(json!({
                "status": "ok",
                "articles": [{"title": "T", "url": "http://x/t", "source": {"name": "X"}}]
            }));
        });

        let request = FetchRequest::headlines(Category::Tech, 2).unwrap();
        let articles = source_for(&server).fetch(&request).unwrap();

        mock.assert();
        assert_eq!(articles.len(), 1);
    }

    #[test]
    fn test_fetch_travel_adds_keyword() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v2/top-headlines")
                .query_param("category", "general")
                .query_param("q", "voyage");
            then.status(200).json_body(json!({
                "status": "ok",
                "articles": [{"title": "T", "url": "http://x/t", "source": {"name": "X"}}]
            }));
        });

        let request = FetchRequest::headlines(Category::Travel, 1).unwrap();
        source_for(&server).fetch(&request).unwrap();

        mock.assert();
    }

    #[test]
    fn test_fetch_search_uses_everything_endpoint() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v2/everything")
                .query_param("q", "rust lang")
                .query_param("language", "en")
                .query_param("sortBy", "publishedAt");
            then.status(200).json_body(json!({
                "status": "ok",
                "articles": [{"title": "Rust", "url": "http://x/r", "source": {"name": "X"}}]
            }));
        });

        let request = FetchRequest::search(Category::Tech, "rust lang", 1).unwrap();
        let articles = source_for(&server)
            .with_locale("us", "en")
            .fetch(&request)
            .unwrap();

        mock.assert();
        assert_eq!(articles[0].title, "Rust");
    }

    #[test]
    fn test_fetch_restricted_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v2/top-headlines");
            then.status(426).json_body(json!({
                "status": "error",
                "code": "corsNotAllowed",
                "message": "Requests from the browser are not allowed on the Developer plan"
            }));
        });

        let request = FetchRequest::headlines(Category::News, 1).unwrap();
        let err = source_for(&server).fetch(&request).unwrap_err();

        assert!(matches!(
            err,
            FlipError::SourceUnavailable(UnavailableReason::Restricted(426))
        ));
    }

    #[test]
    fn test_fetch_server_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v2/top-headlines");
            then.status(500);
        });

        let request = FetchRequest::headlines(Category::News, 1).unwrap();
        let err = source_for(&server).fetch(&request).unwrap_err();

        assert!(matches!(
            err,
            FlipError::SourceUnavailable(UnavailableReason::HttpStatus(500))
        ));
    }

    #[test]
    fn test_fetch_without_key_sends_nothing() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.any_request();
            then.status(200);
        });

        let source = NewsApiSource::new(&server.base_url(), None);
        let request = FetchRequest::headlines(Category::News, 1).unwrap();
        let err = source.fetch(&request).unwrap_err();

        assert!(matches!(
            err,
            FlipError::SourceUnavailable(UnavailableReason::MissingApiKey)
        ));
        mock.assert_hits(0);
    }

    #[test]
    fn test_redact_key() {
        let url = Url::parse("https://newsapi.org/v2/top-headlines?country=fr&apiKey=secret").unwrap();
        let redacted = redact_key(&url);

        assert!(!redacted.contains("secret"));
        assert!(redacted.contains("country=fr"));
    }
}
