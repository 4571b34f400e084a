use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::form_urlencoded::byte_serialize;

use super::Category;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub image: String,
    pub source: String,
    pub source_logo: String,
    pub category: Category,
    pub published_at: String,
    pub author: String,
    pub likes: u32,
    pub comments: u32,
    #[serde(default)]
    pub is_bookmarked: bool,
    #[serde(default)]
    pub is_liked: bool,
    pub url: String,
}

impl Article {
    /// Create an article with placeholder media derived from its id
    pub fn new(id: String, title: String, category: Category) -> Self {
        let image = placeholder_image(&id);
        Self {
            id,
            title,
            description: String::new(),
            content: String::new(),
            image,
            source: String::new(),
            source_logo: String::new(),
            category,
            published_at: String::new(),
            author: String::new(),
            likes: 0,
            comments: 0,
            is_bookmarked: false,
            is_liked: false,
            url: String::new(),
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = description;
        self
    }

    pub fn with_content(mut self, content: String) -> Self {
        self.content = content;
        self
    }

    /// Falls back to the id-seeded placeholder when no image is given
    pub fn with_image(mut self, image: Option<String>) -> Self {
        if let Some(image) = image.filter(|i| !i.trim().is_empty()) {
            self.image = image;
        }
        self
    }

    /// Also derives the source logo when none has been set
    pub fn with_source(mut self, source: String) -> Self {
        if self.source_logo.is_empty() {
            self.source_logo = source_logo_url(&source);
        }
        self.source = source;
        self
    }

    pub fn with_source_logo(mut self, logo: Option<String>) -> Self {
        if let Some(logo) = logo.filter(|l| !l.trim().is_empty()) {
            self.source_logo = logo;
        }
        self
    }

    pub fn with_published_at(mut self, published_at: String) -> Self {
        self.published_at = published_at;
        self
    }

    pub fn with_author(mut self, author: String) -> Self {
        self.author = author;
        self
    }

    pub fn with_engagement(mut self, likes: u32, comments: u32) -> Self {
        self.likes = likes;
        self.comments = comments;
        self
    }

    pub fn with_url(mut self, url: String) -> Self {
        self.url = url;
        self
    }

    /// Text used when no generated analysis is available
    pub fn summary_text(&self) -> &str {
        if self.description.trim().is_empty() {
            &self.content
        } else {
            &self.description
        }
    }
}

/// Canonical URL when there is one, otherwise a hash of the title
pub fn stable_id(url: Option<&str>, title: &str) -> String {
    match url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => url.to_string(),
        None => format!("title-{}", &hex_digest(title.trim())[..16]),
    }
}

/// Like and comment counts that stay the same for a given id
pub fn engagement_for(id: &str) -> (u32, u32) {
    let digest = Sha256::digest(id.as_bytes());
    let likes = u16::from_be_bytes([digest[0], digest[1]]) as u32 % 300;
    let comments = digest[2] as u32 % 40;
    (likes, comments)
}

pub fn placeholder_image(seed: &str) -> String {
    format!("https://picsum.photos/seed/{}/800/450", encode(seed))
}

pub fn source_logo_url(source: &str) -> String {
    let name = if source.trim().is_empty() { "N" } else { source.trim() };
    format!(
        "https://ui-avatars.com/api/?name={}&background=random&color=fff",
        encode(name)
    )
}

fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

fn hex_digest(value: &str) -> String {
    Sha256::digest(value.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
