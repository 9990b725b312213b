//! Page-advance triggers. The view reports viewport changes and explicit
//! "load more" presses as [`TriggerEvent`]s; a [`PageTrigger`] decides whether
//! one of them should turn into a page advance.

use std::ops::Range;

use nm_core::{Article, ArticleId};

pub const DEFAULT_SENTINEL_OFFSET: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEvent {
    /// Indices of the list items currently inside the viewport.
    Viewport(Range<usize>),
    LoadMore,
}

/// Conditions under which a page advance is allowed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceGate {
    pub pending: bool,
    pub has_more: bool,
}

impl AdvanceGate {
    pub fn is_open(&self) -> bool {
        !self.pending && self.has_more
    }
}

pub trait PageTrigger: Send {
    /// Attach to a freshly rendered list, dropping any previous target.
    fn observe(&mut self, items: &[&Article]);

    /// Stop observing until the next [`PageTrigger::observe`].
    fn disconnect(&mut self);

    /// Returns true when `event` should advance the page.
    fn on_event(&mut self, event: &TriggerEvent, gate: AdvanceGate) -> bool;
}

/// The item a [`ScrollTrigger`] watches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinel {
    pub index: usize,
    pub id: ArticleId,
}

/// Fires once when the item `offset` positions before the end of the list
/// scrolls into view.
#[derive(Debug, Clone)]
pub struct ScrollTrigger {
    offset: usize,
    target: Option<Sentinel>,
    armed: bool,
}

impl Default for ScrollTrigger {
    fn default() -> Self {
        Self::new(DEFAULT_SENTINEL_OFFSET)
    }
}

impl ScrollTrigger {
    pub fn new(offset: usize) -> Self {
        Self {
            offset,
            target: None,
            armed: false,
        }
    }

    pub fn target(&self) -> Option<&Sentinel> {
        self.target.as_ref()
    }
}

impl PageTrigger for ScrollTrigger {
    fn observe(&mut self, items: &[&Article]) {
        self.disconnect();
        if items.is_empty() {
            return;
        }
        // An offset of 0 watches the last item.
        let index = items.len().saturating_sub(self.offset).min(items.len() - 1);
        self.target = Some(Sentinel {
            index,
            id: items[index].id.clone(),
        });
        self.armed = true;
    }

    fn disconnect(&mut self) {
        self.target = None;
        self.armed = false;
    }

    fn on_event(&mut self, event: &TriggerEvent, gate: AdvanceGate) -> bool {
        let TriggerEvent::Viewport(visible) = event else {
            return false;
        };
        let Some(target) = &self.target else {
            return false;
        };
        if !self.armed || !visible.contains(&target.index) || !gate.is_open() {
            return false;
        }
        self.armed = false;
        true
    }
}

/// Manual alternative to [`ScrollTrigger`]: only explicit presses advance.
#[derive(Debug, Clone, Default)]
pub struct LoadMoreButton {
    attached: bool,
}

impl PageTrigger for LoadMoreButton {
    fn observe(&mut self, items: &[&Article]) {
        self.attached = !items.is_empty();
    }

    fn disconnect(&mut self) {
        self.attached = false;
    }

    fn on_event(&mut self, event: &TriggerEvent, gate: AdvanceGate) -> bool {
        self.attached && *event == TriggerEvent::LoadMore && gate.is_open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPEN: AdvanceGate = AdvanceGate { pending: false, has_more: true };

    fn articles(n: i64) -> Vec<Article> {
        (1..=n)
            .map(|id| Article {
                id: ArticleId::Int(id),
                title: format!("{}", id),
                preview: None,
                date: String::new(),
                source: String::new(),
                category: String::new(),
                image: None,
                coords: None,
                url: None,
            })
            .collect()
    }

    fn refs(articles: &[Article]) -> Vec<&Article> {
        articles.iter().collect()
    }

    #[test]
    fn test_sentinel_position() {
        let items = articles(20);
        let mut trigger = ScrollTrigger::default();
        trigger.observe(&refs(&items));
        assert_eq!(trigger.target(), Some(&Sentinel { index: 15, id: ArticleId::Int(16) }));

        let short = articles(3);
        trigger.observe(&refs(&short));
        assert_eq!(trigger.target().map(|s| s.index), Some(0));

        trigger.observe(&[]);
        assert!(trigger.target().is_none());
    }

    #[test]
    fn test_zero_offset_watches_last_item() {
        let items = articles(3);
        let mut trigger = ScrollTrigger::new(0);
        trigger.observe(&refs(&items));
        assert_eq!(trigger.target(), Some(&Sentinel { index: 2, id: ArticleId::Int(3) }));

        assert!(!trigger.on_event(&TriggerEvent::Viewport(0..2), OPEN));
        assert!(trigger.on_event(&TriggerEvent::Viewport(0..3), OPEN));
    }

    #[test]
    fn test_fires_once_when_sentinel_visible() {
        let items = articles(20);
        let mut trigger = ScrollTrigger::default();
        trigger.observe(&refs(&items));

        assert!(!trigger.on_event(&TriggerEvent::Viewport(0..10), OPEN));
        assert!(trigger.on_event(&TriggerEvent::Viewport(8..18), OPEN));
        assert!(!trigger.on_event(&TriggerEvent::Viewport(9..19), OPEN));

        // Re-armed by the next list.
        let more = articles(40);
        trigger.observe(&refs(&more));
        assert!(!trigger.on_event(&TriggerEvent::Viewport(9..19), OPEN));
        assert!(trigger.on_event(&TriggerEvent::Viewport(30..40), OPEN));
    }

    #[test]
    fn test_gate_blocks_advance() {
        let items = articles(20);
        let mut trigger = ScrollTrigger::default();
        trigger.observe(&refs(&items));

        let pending = AdvanceGate { pending: true, has_more: true };
        let exhausted = AdvanceGate { pending: false, has_more: false };
        assert!(!trigger.on_event(&TriggerEvent::Viewport(10..20), pending));
        assert!(!trigger.on_event(&TriggerEvent::Viewport(10..20), exhausted));
        // Still armed once the gate opens.
        assert!(trigger.on_event(&TriggerEvent::Viewport(10..20), OPEN));
    }

    #[test]
    fn test_disconnected_trigger_ignores_viewport() {
        let items = articles(20);
        let mut trigger = ScrollTrigger::default();
        trigger.observe(&refs(&items));
        trigger.disconnect();
        assert!(!trigger.on_event(&TriggerEvent::Viewport(0..20), OPEN));
        assert!(!trigger.on_event(&TriggerEvent::LoadMore, OPEN));
    }

    #[test]
    fn test_load_more_button() {
        let items = articles(20);
        let mut button = LoadMoreButton::default();
        assert!(!button.on_event(&TriggerEvent::LoadMore, OPEN));

        button.observe(&refs(&items));
        assert!(!button.on_event(&TriggerEvent::Viewport(0..20), OPEN));
        assert!(button.on_event(&TriggerEvent::LoadMore, OPEN));
        assert!(button.on_event(&TriggerEvent::LoadMore, OPEN));
        assert!(!button.on_event(&TriggerEvent::LoadMore, AdvanceGate { pending: true, has_more: true }));
    }
}
