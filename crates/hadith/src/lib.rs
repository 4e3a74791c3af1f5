//! Hadith collections: upstream editions, caching and search aggregation.

pub mod aliases;
pub mod cache;
pub mod error;
pub mod record;
pub mod search;
pub mod source;
pub mod text;

pub use cache::{CacheStats, EditionCache};
pub use error::{SearchError, SourceError};
pub use record::{Edition, HadithResult};
pub use search::{SearchEngine, SearchQuery, SearchResults};
pub use source::{EditionsClient, HadithSource};
