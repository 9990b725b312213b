pub mod category;
pub mod config;
pub mod error;
pub mod source;
pub mod storage;
pub mod types;

pub use category::{CategoryFilter, NamedCategory, NAMED_CATEGORIES};
pub use config::FeedConfig;
pub use error::{Error, ErrorKind, Result};
pub use source::FeedSource;
pub use storage::SessionSlot;
pub use types::{Article, ArticleDetail, ArticleId, Coordinates, DetailPayload, FetchScope, Snapshot};

pub mod prelude {
    pub use super::{Article, ArticleId, CategoryFilter, Error, FeedConfig, FeedSource, Result, Snapshot};
}
