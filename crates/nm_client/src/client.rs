use std::time::Duration;

use async_trait::async_trait;
use nm_core::{Article, ArticleDetail, ArticleId, DetailPayload, Error, FeedConfig, FeedSource, FetchScope, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// The service answers with a bare array; some deployments wrap it.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListPayload {
    Wrapped { items: Vec<Article> },
    Bare(Vec<Article>),
}

impl ListPayload {
    fn into_articles(self) -> Vec<Article> {
        match self {
            ListPayload::Wrapped { items } => items,
            ListPayload::Bare(items) => items,
        }
    }
}

/// HTTP client for the news content service.
#[derive(Debug, Clone)]
pub struct HttpFeedClient {
    client: Client,
    base_url: Url,
}

impl HttpFeedClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, FeedConfig::default().request_timeout)
    }

    pub fn from_config(config: &FeedConfig) -> Result<Self> {
        Self::with_timeout(&config.api_url, config.request_timeout)
    }

    fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("{} cannot be used as a base url", base_url)));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn news_url(&self, limit: usize, scope: &FetchScope) -> Result<Url> {
        let mut url = self.base_url.join("news")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &limit.to_string());
            if let Some(category) = scope.category() {
                query.append_pair("category", category);
            }
        }
        Ok(url)
    }

    pub(crate) fn detail_url(&self, id: &ArticleId) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("{} cannot be used as a base url", self.base_url)))?
            .pop_if_empty()
            .extend(&["news", &id.to_string(), "full"]);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl FeedSource for HttpFeedClient {
    fn name(&self) -> &str {
        self.base_url.as_str()
    }

    async fn fetch_news(&self, limit: usize, scope: &FetchScope) -> Result<Vec<Article>> {
        let url = self.news_url(limit, scope)?;
        let articles = self.get_json::<ListPayload>(url).await?.into_articles();
        debug!("fetched {} articles ({})", articles.len(), scope);
        Ok(articles)
    }

    async fn fetch_detail(&self, id: &ArticleId) -> Result<ArticleDetail> {
        let url = self.detail_url(id)?;
        let payload = self.get_json::<DetailPayload>(url).await?;
        Ok(payload.into_detail(id))
    }
}
