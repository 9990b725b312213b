use nm_core::{CategoryFilter, Error, Snapshot};

use crate::materializer::{materialize, MaterializedView, PaginationCursor, ViewQuery};
use crate::scroll::{AdvanceGate, PageTrigger, TriggerEvent};
use crate::synchronizer::{Applied, FeedSynchronizer, FetchOutcome, FetchTicket, SyncState};

/// What the presentation layer talks to: filters and pagination in, visible
/// items and status flags out.
pub struct FeedView {
    sync: FeedSynchronizer,
    category: CategoryFilter,
    search: String,
    page_size: usize,
    cursor: PaginationCursor,
    trigger: Box<dyn PageTrigger>,
}

impl FeedView {
    pub fn new(
        sync: FeedSynchronizer,
        category: CategoryFilter,
        page_size: usize,
        trigger: Box<dyn PageTrigger>,
    ) -> Self {
        Self {
            sync,
            category,
            search: String::new(),
            page_size,
            cursor: PaginationCursor::new(),
            trigger,
        }
    }

    pub fn query(&self) -> ViewQuery {
        ViewQuery {
            category: self.category,
            search: self.search.clone(),
            page: self.cursor.page(),
            page_size: self.page_size,
        }
    }

    pub fn visible(&self) -> MaterializedView<'_> {
        materialize(self.sync.articles(), &self.query())
    }

    /// Re-derives the list and points the trigger at the new sentinel.
    fn relink(&mut self) {
        let query = self.query();
        let view = materialize(self.sync.articles(), &query);
        self.trigger.observe(&view.items);
    }

    /// First load. Unscoped categories go through the cache; a named category
    /// fetches its own snapshot.
    pub fn mount(&mut self) -> Option<FetchTicket> {
        let ticket = if self.category.scope().is_unscoped() {
            Some(self.sync.mount())
        } else {
            self.sync.select_category(self.category)
        };
        self.relink();
        ticket
    }

    pub fn set_category(&mut self, category: CategoryFilter) -> Option<FetchTicket> {
        if category == self.category {
            return None;
        }
        self.category = category;
        self.cursor.reset();
        let ticket = self.sync.select_category(category);
        self.relink();
        ticket
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        let search = search.into();
        if search == self.search {
            return;
        }
        self.search = search;
        self.cursor.reset();
        self.relink();
    }

    fn gate(&self) -> AdvanceGate {
        AdvanceGate {
            pending: self.sync.is_loading(),
            has_more: self.has_more(),
        }
    }

    /// Advances one page if more items exist and nothing is loading.
    pub fn request_page_advance(&mut self) -> bool {
        if !self.gate().is_open() {
            return false;
        }
        self.cursor.advance();
        self.relink();
        true
    }

    /// Feeds a viewport change or a load-more press to the trigger.
    pub fn on_trigger(&mut self, event: TriggerEvent) -> bool {
        let gate = self.gate();
        if self.trigger.on_event(&event, gate) {
            self.request_page_advance()
        } else {
            false
        }
    }

    pub fn on_fetch_started(&mut self, token: u64) {
        self.sync.on_fetch_started(token);
    }

    /// Applies a fetch result. Pagination survives a refresh because the
    /// filters did not change.
    pub fn apply(&mut self, outcome: FetchOutcome) -> Applied {
        let applied = self.sync.complete(outcome);
        if applied != Applied::Discarded {
            self.relink();
        }
        applied
    }

    pub fn loading(&self) -> bool {
        self.sync.is_loading()
    }

    pub fn has_more(&self) -> bool {
        self.visible().has_more
    }

    pub fn error(&self) -> Option<&Error> {
        self.sync.error()
    }

    pub fn take_error(&mut self) -> Option<Error> {
        self.sync.take_error()
    }

    pub fn state(&self) -> SyncState {
        self.sync.state()
    }

    pub fn category(&self) -> CategoryFilter {
        self.category
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn page(&self) -> usize {
        self.cursor.page()
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.sync.snapshot()
    }

    pub fn in_flight(&self) -> Option<&FetchTicket> {
        self.sync.in_flight()
    }
}
