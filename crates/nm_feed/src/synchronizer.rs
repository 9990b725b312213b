//! Stale-while-revalidate state machine for the feed snapshot.
//!
//! The synchronizer never performs I/O itself. Operations hand out
//! [`FetchTicket`]s describing the fetch to run; whoever runs it reports back
//! through [`FeedSynchronizer::on_fetch_started`] and
//! [`FeedSynchronizer::complete`]. Every ticket carries a sequence token and
//! only a completion for the latest token is applied, so the final snapshot
//! always belongs to the last fetch the user asked for regardless of the order
//! in which responses arrive.

use std::time::Duration;

use nm_core::{Article, CategoryFilter, Error, FeedConfig, FetchScope, Result, Snapshot};
use nm_storage::SnapshotCache;

use crate::logging::Logger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    ServingCache,
    Fetching { background: bool },
    Ready,
    Error,
}

/// A fetch the caller should run after `delay`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub token: u64,
    pub scope: FetchScope,
    pub limit: usize,
    pub delay: Duration,
    pub background: bool,
}

/// Result of running a [`FetchTicket`].
#[derive(Debug)]
pub struct FetchOutcome {
    pub token: u64,
    pub scope: FetchScope,
    pub result: Result<Vec<Article>>,
}

impl FetchOutcome {
    pub fn new(ticket: &FetchTicket, result: Result<Vec<Article>>) -> Self {
        Self {
            token: ticket.token,
            scope: ticket.scope.clone(),
            result,
        }
    }
}

/// What [`FeedSynchronizer::complete`] did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The displayed snapshot was replaced.
    Replaced,
    /// A background refresh failed; the stale snapshot stays on screen.
    KeptStale,
    /// A foreground fetch failed; the view is now in the error state.
    Failed,
    /// The outcome belonged to a superseded request and was ignored.
    Discarded,
}

pub struct FeedSynchronizer {
    cache: SnapshotCache,
    state: SyncState,
    latest: u64,
    in_flight: Option<FetchTicket>,
    snapshot: Option<Snapshot>,
    error: Option<Error>,
    /// Set once an unscoped fetch has succeeded in this session.
    revalidated: bool,
    preload_limit: usize,
    revalidate_delay: Duration,
    logger: Logger,
}

impl FeedSynchronizer {
    pub fn new(cache: SnapshotCache, config: &FeedConfig) -> Self {
        Self {
            cache,
            state: SyncState::Idle,
            latest: 0,
            in_flight: None,
            snapshot: None,
            error: None,
            revalidated: false,
            preload_limit: config.preload_limit,
            revalidate_delay: config.revalidate_delay,
            logger: Logger::new().with_prefix("🔄 sync"),
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// Articles currently on display, empty when nothing is loaded.
    pub fn articles(&self) -> &[Article] {
        self.snapshot.as_ref().map(Snapshot::articles).unwrap_or(&[])
    }

    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Takes the surfaced error, leaving the error state in place.
    pub fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    /// True while a foreground fetch runs. Background refreshes never show a
    /// loading indication.
    pub fn is_loading(&self) -> bool {
        self.state == SyncState::Fetching { background: false }
    }

    /// The ticket whose outcome will be applied, if it has not completed yet.
    pub fn in_flight(&self) -> Option<&FetchTicket> {
        self.in_flight.as_ref()
    }

    pub fn latest_token(&self) -> u64 {
        self.latest
    }

    fn issue(&mut self, scope: FetchScope, delay: Duration, background: bool) -> FetchTicket {
        self.latest += 1;
        let ticket = FetchTicket {
            token: self.latest,
            scope,
            limit: self.preload_limit,
            delay,
            background,
        };
        self.in_flight = Some(ticket.clone());
        ticket
    }

    /// Invalidates whatever is in flight without issuing a new fetch.
    fn supersede(&mut self) {
        if let Some(ticket) = self.in_flight.take() {
            self.logger.debug(&format!("superseding fetch #{} ({})", ticket.token, ticket.scope));
        }
        self.latest += 1;
    }

    fn serve(&mut self, snapshot: Snapshot) {
        self.snapshot = Some(snapshot);
        self.error = None;
        self.state = SyncState::Ready;
    }

    /// Initial load in unscoped mode. A cached snapshot is served at once and a
    /// delayed background refresh is scheduled; otherwise a foreground fetch
    /// is requested.
    pub fn mount(&mut self) -> FetchTicket {
        match self.cache.read() {
            Some(snapshot) => {
                self.state = SyncState::ServingCache;
                self.logger.info(&format!("serving {} cached articles", snapshot.len()));
                self.serve(snapshot);
                self.issue(FetchScope::All, self.revalidate_delay, true)
            }
            None => {
                self.state = SyncState::Fetching { background: false };
                self.issue(FetchScope::All, Duration::ZERO, false)
            }
        }
    }

    /// Switches the fetch scope to match `category`. Named categories always
    /// fetch fresh; the synthetic ones reuse the unscoped snapshot when one is
    /// available.
    pub fn select_category(&mut self, category: CategoryFilter) -> Option<FetchTicket> {
        let scope = category.scope();
        if !scope.is_unscoped() {
            self.state = SyncState::Fetching { background: false };
            return Some(self.issue(scope, Duration::ZERO, false));
        }

        let displayed_unscoped = self
            .snapshot
            .as_ref()
            .map_or(false, |snapshot| snapshot.scope().is_unscoped());
        if displayed_unscoped {
            // A pending unscoped refresh is still valid for this scope.
            let refreshing = self
                .in_flight
                .as_ref()
                .map_or(false, |ticket| ticket.scope.is_unscoped());
            if refreshing {
                return None;
            }
            self.supersede();
            self.state = SyncState::Ready;
            return self.revalidate();
        }

        if let Some(snapshot) = self.cache.read() {
            self.supersede();
            self.serve(snapshot);
            return self.revalidate();
        }

        self.state = SyncState::Fetching { background: false };
        Some(self.issue(FetchScope::All, Duration::ZERO, false))
    }

    /// Reschedules the background refresh for a cached unscoped snapshot that
    /// has not been refreshed yet, e.g. when the mount refresh was superseded.
    fn revalidate(&mut self) -> Option<FetchTicket> {
        if self.revalidated {
            return None;
        }
        Some(self.issue(FetchScope::All, self.revalidate_delay, true))
    }

    /// Called when a delayed ticket actually goes to the network.
    pub fn on_fetch_started(&mut self, token: u64) {
        let Some(ticket) = self.in_flight.as_ref().filter(|t| t.token == token) else {
            return;
        };
        if ticket.background && self.state == SyncState::Ready {
            self.logger.debug(&format!("revalidating snapshot (fetch #{})", token));
            self.state = SyncState::Fetching { background: true };
        }
    }

    pub fn complete(&mut self, outcome: FetchOutcome) -> Applied {
        let ticket = match self.in_flight.take() {
            Some(ticket) if ticket.token == outcome.token && outcome.token == self.latest => ticket,
            other => {
                self.in_flight = other;
                self.logger.debug(&format!(
                    "discarding stale fetch #{} ({}), latest is #{}",
                    outcome.token, outcome.scope, self.latest
                ));
                return Applied::Discarded;
            }
        };

        match outcome.result {
            Ok(articles) => {
                let snapshot = Snapshot::new(ticket.scope, articles);
                self.logger.info(&format!(
                    "loaded {} articles ({})",
                    snapshot.len(),
                    snapshot.scope()
                ));
                if snapshot.scope().is_unscoped() {
                    self.cache.write(&snapshot);
                    self.revalidated = true;
                }
                self.serve(snapshot);
                Applied::Replaced
            }
            Err(e) if ticket.background && self.snapshot.is_some() => {
                self.logger.warn(&format!(
                    "background refresh failed ({:?}), keeping stale snapshot: {}",
                    e.kind(),
                    e
                ));
                self.state = SyncState::Ready;
                Applied::KeptStale
            }
            Err(e) => {
                self.logger.error(&format!(
                    "failed to load news ({}, {:?}): {}",
                    ticket.scope,
                    e.kind(),
                    e
                ));
                self.snapshot = None;
                self.error = Some(e);
                self.state = SyncState::Error;
                Applied::Failed
            }
        }
    }
}
