use async_trait::async_trait;

use crate::types::{Article, ArticleDetail, ArticleId, FetchScope};
use crate::Result;

/// Remote content service.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Human readable name used in logs
    fn name(&self) -> &str;

    /// Fetch up to `limit` list records, optionally restricted to one category.
    async fn fetch_news(&self, limit: usize, scope: &FetchScope) -> Result<Vec<Article>>;

    /// Fetch the full body of one article.
    async fn fetch_detail(&self, id: &ArticleId) -> Result<ArticleDetail>;
}
