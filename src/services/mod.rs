pub mod deep_dive_service;
pub mod fetch_service;
pub mod library_service;

pub use deep_dive_service::DeepDiveService;
pub use fetch_service::FetchService;
pub use library_service::LibraryService;
