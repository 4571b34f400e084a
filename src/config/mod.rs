use crate::errors::{FlipError, FlipResult};

pub const DEFAULT_NEWS_API_BASE_URL: &str = "https://newsapi.org";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Clone)]
pub struct Config {
    pub news_api_key: Option<String>,
    pub news_api_base_url: String,
    pub country: String,
    pub language: String,
    pub page_size: u32,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub db_path: String,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<std::path::PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> FlipResult<Self> {
        let exe_dir = Self::exe_dir();

        // Try to load .env from executable's directory first
        if let Some(ref dir) = exe_dir {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        let page_size = match non_empty_var("NEWS_PAGE_SIZE") {
            Some(raw) => parse_page_size(&raw)?,
            None => 20,
        };

        // Default db_path is relative to executable directory
        let db_path = non_empty_var("FLIPBOARD_DB_PATH").unwrap_or_else(|| {
            exe_dir
                .map(|d| d.join("flipboard.db").to_string_lossy().into_owned())
                .unwrap_or_else(|| "./flipboard.db".to_string())
        });

        Ok(Self {
            news_api_key: non_empty_var("NEWS_API_KEY"),
            news_api_base_url: non_empty_var("NEWS_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_NEWS_API_BASE_URL.to_string()),
            country: non_empty_var("NEWS_COUNTRY").unwrap_or_else(|| "fr".to_string()),
            language: non_empty_var("NEWS_LANGUAGE").unwrap_or_else(|| "fr".to_string()),
            page_size,
            gemini_api_key: non_empty_var("GEMINI_API_KEY").or_else(|| non_empty_var("API_KEY")),
            gemini_base_url: non_empty_var("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            gemini_model: non_empty_var("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            db_path,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_page_size(raw: &str) -> FlipResult<u32> {
    let size: u32 = raw
        .parse()
        .map_err(|_| FlipError::Config(format!("NEWS_PAGE_SIZE is not a number: {}", raw)))?;

    if !(1..=100).contains(&size) {
        return Err(FlipError::Config(format!(
            "NEWS_PAGE_SIZE must be between 1 and 100, got {}",
            size
        )));
    }

    Ok(size)
}
