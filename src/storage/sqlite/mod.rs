mod connection;
mod library_repository;

pub use connection::SqliteStorage;
pub use library_repository::{SqliteLibraryRepository, HISTORY_LIMIT};
