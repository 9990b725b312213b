pub mod client;

pub use client::HttpFeedClient;

pub mod prelude {
    pub use super::HttpFeedClient;
    pub use nm_core::{Article, ArticleDetail, Error, FeedSource, Result};
}
