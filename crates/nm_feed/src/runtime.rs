use std::sync::Arc;

use nm_core::FeedSource;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::synchronizer::{FetchOutcome, FetchTicket};
use crate::view::FeedView;

/// Progress of a spawned fetch, delivered back to the owner loop.
#[derive(Debug)]
pub enum FetchMessage {
    Started(u64),
    Finished(FetchOutcome),
}

/// Runs [`FetchTicket`]s on the tokio runtime. Tasks are never aborted; a
/// superseded ticket still reports back and the synchronizer drops it.
#[derive(Clone)]
pub struct FetchRunner {
    source: Arc<dyn FeedSource>,
    tx: mpsc::UnboundedSender<FetchMessage>,
}

impl FetchRunner {
    pub fn new(source: Arc<dyn FeedSource>) -> (Self, mpsc::UnboundedReceiver<FetchMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { source, tx }, rx)
    }

    pub fn source(&self) -> &Arc<dyn FeedSource> {
        &self.source
    }

    pub fn spawn(&self, ticket: FetchTicket) -> JoinHandle<()> {
        let source = self.source.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            if !ticket.delay.is_zero() {
                tokio::time::sleep(ticket.delay).await;
            }
            // The receiver may be gone if the view was torn down.
            let _ = tx.send(FetchMessage::Started(ticket.token));
            let result = source.fetch_news(ticket.limit, &ticket.scope).await;
            let _ = tx.send(FetchMessage::Finished(FetchOutcome::new(&ticket, result)));
        })
    }
}

/// Feeds runner messages into `view` until nothing it cares about is in
/// flight. Returns false if the channel closed first.
pub async fn settle(view: &mut FeedView, rx: &mut mpsc::UnboundedReceiver<FetchMessage>) -> bool {
    while view.in_flight().is_some() {
        match rx.recv().await {
            Some(FetchMessage::Started(token)) => view.on_fetch_started(token),
            Some(FetchMessage::Finished(outcome)) => {
                view.apply(outcome);
            }
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scroll::ScrollTrigger;
    use crate::synchronizer::{Applied, FeedSynchronizer, SyncState};
    use crate::view::FeedView;
    use async_trait::async_trait;
    use nm_core::{Article, ArticleDetail, ArticleId, CategoryFilter, Error, FeedConfig, FetchScope, Result, SessionSlot};
    use nm_storage::{MemorySlot, SnapshotCache};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers each scope after a configurable delay; unknown scopes fail.
    struct ScriptedSource {
        replies: HashMap<FetchScope, (Duration, usize)>,
        calls: Mutex<Vec<FetchScope>>,
    }

    impl ScriptedSource {
        fn new(replies: &[(FetchScope, u64, usize)]) -> Self {
            Self {
                replies: replies
                    .iter()
                    .map(|(scope, ms, n)| (scope.clone(), (Duration::from_millis(*ms), *n)))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl FeedSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn fetch_news(&self, _limit: usize, scope: &FetchScope) -> Result<Vec<Article>> {
            self.calls.lock().unwrap().push(scope.clone());
            let Some((delay, n)) = self.replies.get(scope).copied() else {
                tokio::time::sleep(Duration::from_millis(10)).await;
                return Err(Error::Network("503 Service Unavailable".to_string()));
            };
            tokio::time::sleep(delay).await;
            let category = scope.category().unwrap_or("общество").to_string();
            Ok((1..=n as i64)
                .map(|id| Article {
                    id: ArticleId::Int(id),
                    title: format!("{} {}", category, id),
                    preview: None,
                    date: "2025-11-06".to_string(),
                    source: "news29.ru".to_string(),
                    category: category.clone(),
                    image: None,
                    coords: None,
                    url: None,
                })
                .collect())
        }

        async fn fetch_detail(&self, id: &ArticleId) -> Result<ArticleDetail> {
            Err(Error::NotFoundLocally(id.clone()))
        }
    }

    fn view_over(slot: Arc<MemorySlot>) -> FeedView {
        let config = FeedConfig::default();
        let sync = FeedSynchronizer::new(SnapshotCache::new(slot, "preloaded_news"), &config);
        FeedView::new(sync, CategoryFilter::All, config.page_size, Box::new(ScrollTrigger::default()))
    }

    async fn drain(view: &mut FeedView, rx: &mut mpsc::UnboundedReceiver<FetchMessage>, finished: usize) -> Vec<Applied> {
        let mut applied = Vec::new();
        while applied.len() < finished {
            match rx.recv().await.expect("runner dropped") {
                FetchMessage::Started(token) => view.on_fetch_started(token),
                FetchMessage::Finished(outcome) => applied.push(view.apply(outcome)),
            }
        }
        applied
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_for_superseded_category_is_discarded() {
        let sport = FetchScope::Category("спорт".into());
        let culture = FetchScope::Category("культура".into());
        let source = Arc::new(ScriptedSource::new(&[
            (FetchScope::All, 5, 45),
            (sport.clone(), 300, 12),
            (culture.clone(), 50, 3),
        ]));
        let (runner, mut rx) = FetchRunner::new(source.clone());
        let mut view = view_over(Arc::new(MemorySlot::new()));

        runner.spawn(view.mount().unwrap());
        assert_eq!(drain(&mut view, &mut rx, 1).await, vec![Applied::Replaced]);
        assert_eq!(view.visible().total, 45);

        runner.spawn(view.set_category("sport".parse().unwrap()).unwrap());
        runner.spawn(view.set_category("culture".parse().unwrap()).unwrap());
        let applied = drain(&mut view, &mut rx, 2).await;
        assert_eq!(applied, vec![Applied::Replaced, Applied::Discarded]);

        assert_eq!(view.snapshot().unwrap().scope(), &culture);
        assert_eq!(view.visible().len(), 3);
        assert_eq!(source.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_revalidation_waits_for_delay() {
        let slot = Arc::new(MemorySlot::new());
        let cached: Vec<Article> = (1..=50)
            .map(|id| Article {
                id: ArticleId::Int(id),
                title: format!("cached {}", id),
                preview: None,
                date: "2025-11-05".to_string(),
                source: "news29.ru".to_string(),
                category: "общество".to_string(),
                image: None,
                coords: None,
                url: None,
            })
            .collect();
        slot.write("preloaded_news", &serde_json::to_string(&cached).unwrap()).unwrap();

        let source = Arc::new(ScriptedSource::new(&[(FetchScope::All, 100, 70)]));
        let (runner, mut rx) = FetchRunner::new(source.clone());
        let mut view = view_over(slot.clone());

        let ticket = view.mount().unwrap();
        assert_eq!(ticket.delay, Duration::from_secs(2));
        runner.spawn(ticket);
        assert_eq!(view.visible().len(), 20);
        assert!(!view.loading());

        tokio::time::sleep(Duration::from_millis(1900)).await;
        assert!(source.calls.lock().unwrap().is_empty());
        assert_eq!(view.state(), SyncState::Ready);

        assert_eq!(drain(&mut view, &mut rx, 1).await, vec![Applied::Replaced]);
        assert_eq!(view.visible().total, 70);

        let persisted: Vec<Article> = serde_json::from_str(&slot.read("preloaded_news").unwrap().unwrap()).unwrap();
        assert_eq!(persisted.len(), 70);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_revalidation_keeps_cached_view() {
        let slot = Arc::new(MemorySlot::new());
        let cached: Vec<Article> = (1..=50)
            .map(|id| Article {
                id: ArticleId::Int(id),
                title: format!("cached {}", id),
                preview: None,
                date: String::new(),
                source: String::new(),
                category: "общество".to_string(),
                image: None,
                coords: None,
                url: None,
            })
            .collect();
        slot.write("preloaded_news", &serde_json::to_string(&cached).unwrap()).unwrap();

        // No reply scripted for the unscoped list: every fetch fails.
        let source = Arc::new(ScriptedSource::new(&[]));
        let (runner, mut rx) = FetchRunner::new(source);
        let mut view = view_over(slot);

        runner.spawn(view.mount().unwrap());
        view.request_page_advance();
        view.request_page_advance();

        assert_eq!(drain(&mut view, &mut rx, 1).await, vec![Applied::KeptStale]);
        assert_eq!(view.visible().len(), 50);
        assert!(view.error().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_waits_for_latest_fetch() {
        let source = Arc::new(ScriptedSource::new(&[(FetchScope::All, 40, 25)]));
        let (runner, mut rx) = FetchRunner::new(source);
        let mut view = view_over(Arc::new(MemorySlot::new()));

        runner.spawn(view.mount().unwrap());
        assert!(view.loading());
        assert!(settle(&mut view, &mut rx).await);
        assert!(!view.loading());
        assert_eq!(view.visible().total, 25);
        assert!(view.in_flight().is_none());
    }
}
