pub mod clock;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use clock::{Clock, SystemClock};
pub use memory::InMemoryResolutionCache;
pub use sqlite::{SqliteLibraryRepository, SqliteStorage};
pub use traits::{LibraryRepository, ResolutionCache};
