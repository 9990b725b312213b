//! Derives the visible list from a snapshot. Everything here is pure: the same
//! snapshot and query always produce the same view.

use nm_core::{Article, CategoryFilter};

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Inputs of one materialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery {
    pub category: CategoryFilter,
    pub search: String,
    pub page: usize,
    pub page_size: usize,
}

impl Default for ViewQuery {
    fn default() -> Self {
        Self {
            category: CategoryFilter::All,
            search: String::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ViewQuery {
    pub fn with_category(mut self, category: CategoryFilter) -> Self {
        self.category = category;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Number of items the current page count allows. Page 0 is treated as 1.
    pub fn visible_limit(&self) -> usize {
        self.page.max(1).saturating_mul(self.page_size)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedView<'a> {
    pub items: Vec<&'a Article>,
    pub has_more: bool,
    /// Length of the filtered sequence before truncation.
    pub total: usize,
}

impl<'a> MaterializedView<'a> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn matches_search(article: &Article, needle: &str) -> bool {
    article.title.to_lowercase().contains(needle)
        || article
            .preview
            .as_deref()
            .map_or(false, |preview| preview.to_lowercase().contains(needle))
}

/// Filters by category, then by search term, then truncates to the current
/// page count. Snapshot order is preserved.
pub fn materialize<'a>(articles: &'a [Article], query: &ViewQuery) -> MaterializedView<'a> {
    let needle = query.search.to_lowercase();
    let filtered: Vec<&Article> = articles
        .iter()
        .filter(|article| query.category.matches(article))
        .filter(|article| needle.is_empty() || matches_search(article, &needle))
        .collect();

    let total = filtered.len();
    let mut items = filtered;
    items.truncate(query.visible_limit());
    MaterializedView {
        has_more: items.len() < total,
        items,
        total,
    }
}

/// Page counter. Starts at 1 and only moves forward until reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationCursor {
    page: usize,
}

impl Default for PaginationCursor {
    fn default() -> Self {
        Self { page: 1 }
    }
}

impl PaginationCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn advance(&mut self) -> usize {
        self.page += 1;
        self.page
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nm_core::{ArticleId, Coordinates};

    fn article(id: i64, category: &str) -> Article {
        Article {
            id: ArticleId::Int(id),
            title: format!("Новость номер {}", id),
            preview: Some(format!("Краткое описание {}", id)),
            date: "2025-11-06".to_string(),
            source: "news29.ru".to_string(),
            category: category.to_string(),
            image: None,
            coords: None,
            url: None,
        }
    }

    /// 45 articles, every fourth one (10 in total) tagged sport.
    fn snapshot_45() -> Vec<Article> {
        (1..=45)
            .map(|id| article(id, if id % 4 == 0 && id <= 40 { "sport" } else { "общество" }))
            .collect()
    }

    fn ids(view: &MaterializedView<'_>) -> Vec<ArticleId> {
        view.items.iter().map(|a| a.id.clone()).collect()
    }

    #[test]
    fn test_category_scenario() {
        let articles = snapshot_45();
        let query = ViewQuery::default().with_category("sport".parse().unwrap());
        let view = materialize(&articles, &query);
        assert_eq!(view.len(), 10);
        assert_eq!(view.total, 10);
        assert!(!view.has_more);
    }

    #[test]
    fn test_pagination_scenario() {
        let articles = snapshot_45();
        let page1 = materialize(&articles, &ViewQuery::default());
        assert_eq!(page1.len(), 20);
        assert!(page1.has_more);

        let page2 = materialize(&articles, &ViewQuery::default().with_page(2));
        assert_eq!(page2.len(), 40);
        assert!(page2.has_more);

        let page3 = materialize(&articles, &ViewQuery::default().with_page(3));
        assert_eq!(page3.len(), 45);
        assert!(!page3.has_more);
    }

    #[test]
    fn test_search_without_match() {
        let articles = snapshot_45();
        let view = materialize(&articles, &ViewQuery::default().with_search("xyz-no-match"));
        assert!(view.is_empty());
        assert!(!view.has_more);
    }

    #[test]
    fn test_empty_snapshot() {
        let view = materialize(&[], &ViewQuery::default().with_page(4));
        assert!(view.is_empty());
        assert!(!view.has_more);
        assert_eq!(view.total, 0);
    }

    #[test]
    fn test_category_without_match() {
        let articles = snapshot_45();
        let view = materialize(&articles, &ViewQuery::default().with_category("культура".parse().unwrap()));
        assert!(view.is_empty());
        assert!(!view.has_more);
    }

    #[test]
    fn test_search_title_and_preview_case_insensitive() {
        let mut articles = snapshot_45();
        articles[3].title = "ПОЖАР в Соломбале".to_string();
        articles[10].preview = Some("Тушили пожар всю ночь".to_string());
        articles[11].preview = None;

        let view = materialize(&articles, &ViewQuery::default().with_search("Пожар"));
        assert_eq!(ids(&view), vec![ArticleId::Int(4), ArticleId::Int(11)]);
    }

    #[test]
    fn test_search_and_category_combine() {
        let mut articles = snapshot_45();
        articles[3].title = "Матч сезона".to_string(); // id 4, sport
        articles[4].title = "Матч отменён".to_string(); // id 5, society

        let query = ViewQuery::default()
            .with_category("sport".parse().unwrap())
            .with_search("матч");
        assert_eq!(ids(&materialize(&articles, &query)), vec![ArticleId::Int(4)]);
    }

    #[test]
    fn test_on_map_filter() {
        let mut articles = snapshot_45();
        articles[0].coords = Coordinates::new(64.54, 40.54);
        articles[44].coords = Coordinates::new(64.56, 40.60);

        let view = materialize(&articles, &ViewQuery::default().with_category(CategoryFilter::OnMap));
        assert_eq!(ids(&view), vec![ArticleId::Int(1), ArticleId::Int(45)]);
    }

    #[test]
    fn test_idempotent() {
        let articles = snapshot_45();
        let query = ViewQuery::default().with_search("1").with_page(2);
        assert_eq!(materialize(&articles, &query), materialize(&articles, &query));
    }

    #[test]
    fn test_monotonic_pagination() {
        let articles = snapshot_45();
        let mut previous = ids(&materialize(&articles, &ViewQuery::default()));
        for page in 2..=4 {
            let current = ids(&materialize(&articles, &ViewQuery::default().with_page(page)));
            assert!(current.len() >= previous.len());
            assert_eq!(&current[..previous.len()], previous.as_slice());
            previous = current;
        }
    }

    #[test]
    fn test_filter_reset_yields_first_page() {
        let articles: Vec<Article> = (1..=100)
            .map(|id| article(id, if id % 2 == 0 { "спорт" } else { "другое" }))
            .collect();
        let deep = ViewQuery::default().with_page(4);
        assert_eq!(materialize(&articles, &deep).len(), 80);

        let reset = deep.with_category("other".parse().unwrap()).with_page(1);
        let view = materialize(&articles, &reset);
        let expected: Vec<ArticleId> = articles
            .iter()
            .filter(|a| a.category == "другое")
            .take(20)
            .map(|a| a.id.clone())
            .collect();
        assert_eq!(ids(&view), expected);
        assert!(view.has_more);
    }

    #[test]
    fn test_page_zero_behaves_like_first_page() {
        let articles = snapshot_45();
        let view = materialize(&articles, &ViewQuery::default().with_page(0));
        assert_eq!(view.len(), 20);
    }

    #[test]
    fn test_cursor() {
        let mut cursor = PaginationCursor::new();
        assert_eq!(cursor.page(), 1);
        assert_eq!(cursor.advance(), 2);
        assert_eq!(cursor.advance(), 3);
        cursor.reset();
        assert_eq!(cursor.page(), 1);
    }
}
