pub mod gemini;
pub mod newsapi;
pub mod text;
pub mod traits;

pub use gemini::GeminiGenerator;
pub use newsapi::NewsApiSource;
pub use traits::{ArticleGenerator, ArticleSource};
