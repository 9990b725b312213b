use futures::future::join;
use nm_core::{Article, ArticleDetail, ArticleId, Coordinates, FeedSource, FetchScope, Result, Snapshot};
use tracing::{debug, warn};

use crate::map::{DEFAULT_CENTER, FOCUS_ZOOM};

/// Map state on the article page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetailMap {
    pub center: Coordinates,
    pub zoom: u8,
    /// False when the article has no location and the city centre is shown.
    pub exact: bool,
    pub open: bool,
}

impl DetailMap {
    fn for_location(coords: Option<Coordinates>) -> Self {
        match coords {
            Some(center) => Self {
                center,
                zoom: FOCUS_ZOOM,
                exact: true,
                open: true,
            },
            None => Self {
                center: DEFAULT_CENTER,
                zoom: FOCUS_ZOOM,
                exact: false,
                open: false,
            },
        }
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    /// An open map without an exact location needs a notice.
    pub fn shows_fallback_notice(&self) -> bool {
        self.open && !self.exact
    }
}

/// Everything the article page shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub detail: ArticleDetail,
    /// The list record, when the article is part of the current snapshot.
    pub article: Option<Article>,
    /// Latest headlines. Empty when they could not be loaded.
    pub sidebar: Vec<Article>,
    pub map: DetailMap,
}

impl DetailView {
    fn new(detail: ArticleDetail, article: Option<Article>, sidebar: Vec<Article>) -> Self {
        let coords = detail.coords.or_else(|| article.as_ref().and_then(|a| a.coords));
        Self {
            map: DetailMap::for_location(coords),
            detail,
            article,
            sidebar,
        }
    }

    pub fn title(&self) -> &str {
        self.detail
            .title
            .as_deref()
            .or_else(|| self.article.as_ref().map(|a| a.title.as_str()))
            .unwrap_or_default()
    }

    /// The detail image overrides the list image.
    pub fn image(&self) -> Option<&str> {
        self.detail
            .image
            .as_deref()
            .or_else(|| self.article.as_ref().and_then(|a| a.image.as_deref()))
    }

    pub fn date(&self) -> Option<&str> {
        self.detail
            .date
            .as_deref()
            .or_else(|| self.article.as_ref().map(|a| a.date.as_str()))
    }

    pub fn source(&self) -> Option<&str> {
        self.detail
            .source
            .as_deref()
            .or_else(|| self.article.as_ref().map(|a| a.source.as_str()))
    }

    pub fn category(&self) -> Option<&str> {
        self.detail
            .category
            .as_deref()
            .or_else(|| self.article.as_ref().map(|a| a.category.as_str()))
            .filter(|c| !c.is_empty())
    }
}

/// Loads one article page. A failed detail fetch is returned to the caller for
/// that article alone; a failed sidebar fetch only leaves the sidebar empty.
pub async fn load_detail(
    source: &dyn FeedSource,
    id: &ArticleId,
    snapshot: Option<&Snapshot>,
    sidebar_limit: usize,
) -> Result<DetailView> {
    let article = match snapshot.map(|s| s.find(id)) {
        Some(Ok(article)) => Some(article.clone()),
        Some(Err(e)) => {
            debug!("{}, using detail fields only", e);
            None
        }
        None => None,
    };

    let (detail, sidebar) = join(
        source.fetch_detail(id),
        source.fetch_news(sidebar_limit, &FetchScope::All),
    )
    .await;

    let detail = detail?;
    let sidebar = sidebar.unwrap_or_else(|e| {
        warn!("failed to load latest news for sidebar: {}", e);
        Vec::new()
    });
    Ok(DetailView::new(detail, article, sidebar))
}
