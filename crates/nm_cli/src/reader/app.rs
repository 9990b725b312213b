use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use nm_core::{ArticleId, CategoryFilter, Result};
use nm_feed::{Applied, DetailView, FeedView, FetchMessage, FetchTicket, MapPanel, TriggerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
}

pub enum Screen {
    Feed,
    Detail(Box<DetailView>),
    Map { panel: MapPanel, selected: usize },
}

/// Side effects the event loop runs on behalf of the app.
#[derive(Debug, PartialEq)]
pub enum Action {
    None,
    Quit,
    Fetch(FetchTicket),
    OpenDetail(ArticleId),
}

impl From<Option<FetchTicket>> for Action {
    fn from(ticket: Option<FetchTicket>) -> Self {
        ticket.map_or(Action::None, Action::Fetch)
    }
}

/// Reader state. The list keeps its own scroll window so the exact viewport
/// can be reported to the page trigger.
pub struct App {
    view: FeedView,
    tabs: Vec<CategoryFilter>,
    selected: usize,
    offset: usize,
    rows: usize,
    mode: InputMode,
    screen: Screen,
    status: Option<String>,
    map_top_n: usize,
    detail_scroll: u16,
}

impl App {
    pub fn new(view: FeedView, map_top_n: usize) -> Self {
        Self {
            view,
            tabs: CategoryFilter::catalog(),
            selected: 0,
            offset: 0,
            rows: 10,
            mode: InputMode::Normal,
            screen: Screen::Feed,
            status: None,
            map_top_n,
            detail_scroll: 0,
        }
    }

    pub fn view(&self) -> &FeedView {
        &self.view
    }

    pub fn tabs(&self) -> &[CategoryFilter] {
        &self.tabs
    }

    pub fn tab_index(&self) -> usize {
        let category = self.view.category();
        self.tabs.iter().position(|c| *c == category).unwrap_or(0)
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// First visible row and selected row, both as list indices.
    pub fn viewport(&self) -> (usize, usize) {
        (self.offset, self.selected)
    }

    pub fn detail_scroll(&self) -> u16 {
        self.detail_scroll
    }

    pub fn mount(&mut self) -> Option<FetchTicket> {
        let ticket = self.view.mount();
        self.report_viewport();
        ticket
    }

    /// Called by the renderer with the number of list rows that fit.
    pub fn set_rows(&mut self, rows: usize) {
        let rows = rows.max(1);
        if rows == self.rows {
            return;
        }
        self.rows = rows;
        self.scroll_to_selection();
        self.report_viewport();
    }

    fn scroll_to_selection(&mut self) {
        if self.selected < self.offset {
            self.offset = self.selected;
        } else if self.selected >= self.offset + self.rows {
            self.offset = self.selected + 1 - self.rows;
        }
    }

    fn report_viewport(&mut self) {
        let len = self.view.visible().len();
        let end = (self.offset + self.rows).min(len);
        let start = self.offset.min(end);
        self.view.on_trigger(TriggerEvent::Viewport(start..end));
    }

    fn reset_selection(&mut self) {
        self.selected = 0;
        self.offset = 0;
    }

    fn clamp_selection(&mut self) {
        let len = self.view.visible().len();
        self.selected = self.selected.min(len.saturating_sub(1));
        self.offset = self.offset.min(self.selected);
        self.scroll_to_selection();
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.view.visible().len();
        if len == 0 {
            return;
        }
        self.selected = self.selected.saturating_add_signed(delta).min(len - 1);
        self.scroll_to_selection();
        self.report_viewport();
    }

    fn switch_tab(&mut self, delta: isize) -> Action {
        let len = self.tabs.len() as isize;
        let index = (self.tab_index() as isize + delta).rem_euclid(len) as usize;
        let ticket = self.view.set_category(self.tabs[index]);
        self.reset_selection();
        self.status = None;
        self.report_viewport();
        ticket.into()
    }

    fn update_search(&mut self, edit: impl FnOnce(&mut String)) {
        let mut search = self.view.search().to_string();
        edit(&mut search);
        self.view.set_search(search);
        self.reset_selection();
        self.report_viewport();
    }

    fn open_map(&mut self) {
        let articles = self.view.snapshot().map(|s| s.articles()).unwrap_or(&[]);
        let panel = MapPanel::from_articles(articles, self.map_top_n);
        self.screen = Screen::Map { panel, selected: 0 };
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Action {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }
        if self.mode == InputMode::Search {
            return self.on_search_key(key);
        }
        match self.screen {
            Screen::Feed => self.on_feed_key(key),
            Screen::Detail(_) => self.on_detail_key(key),
            Screen::Map { .. } => self.on_map_key(key),
        }
    }

    fn on_search_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Enter => self.mode = InputMode::Normal,
            KeyCode::Esc => {
                self.mode = InputMode::Normal;
                self.update_search(String::clear);
            }
            KeyCode::Backspace => self.update_search(|s| {
                s.pop();
            }),
            KeyCode::Char(c) => self.update_search(|s| s.push(c)),
            _ => {}
        }
        Action::None
    }

    fn on_feed_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
            KeyCode::Tab | KeyCode::Right => return self.switch_tab(1),
            KeyCode::BackTab | KeyCode::Left => return self.switch_tab(-1),
            KeyCode::Char('/') => self.mode = InputMode::Search,
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
            KeyCode::PageDown => self.move_selection(self.rows as isize),
            KeyCode::PageUp => self.move_selection(-(self.rows as isize)),
            KeyCode::Home => self.move_selection(isize::MIN),
            KeyCode::Char('m') => self.open_map(),
            KeyCode::Enter => {
                let selected = self.view.visible().items.get(self.selected).map(|a| a.id.clone());
                if let Some(id) = selected {
                    self.status = Some(format!("Loading article {}…", id));
                    return Action::OpenDetail(id);
                }
            }
            _ => {}
        }
        Action::None
    }

    fn on_detail_key(&mut self, key: KeyEvent) -> Action {
        let Screen::Detail(detail) = &mut self.screen else {
            return Action::None;
        };
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Backspace => self.screen = Screen::Feed,
            KeyCode::Char('g') => detail.map.toggle(),
            KeyCode::Down | KeyCode::Char('j') => self.detail_scroll = self.detail_scroll.saturating_add(1),
            KeyCode::Up | KeyCode::Char('k') => self.detail_scroll = self.detail_scroll.saturating_sub(1),
            _ => {}
        }
        Action::None
    }

    fn on_map_key(&mut self, key: KeyEvent) -> Action {
        let Screen::Map { panel, selected } = &mut self.screen else {
            return Action::None;
        };
        let len = panel.entries().len();
        let step: isize = match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('m') => {
                self.screen = Screen::Feed;
                return Action::None;
            }
            KeyCode::Enter => {
                return panel
                    .entries()
                    .get(*selected)
                    .map_or(Action::None, |entry| Action::OpenDetail(entry.id.clone()));
            }
            KeyCode::Down | KeyCode::Char('j') => 1,
            KeyCode::Up | KeyCode::Char('k') => -1,
            _ => return Action::None,
        };
        if len == 0 {
            return Action::None;
        }
        *selected = selected.saturating_add_signed(step).min(len - 1);
        let id = panel.entries()[*selected].id.clone();
        if let Err(e) = panel.focus(&id) {
            self.status = Some(e.to_string());
        }
        Action::None
    }

    pub fn on_fetch(&mut self, message: FetchMessage) {
        match message {
            FetchMessage::Started(token) => self.view.on_fetch_started(token),
            FetchMessage::Finished(outcome) => {
                if self.view.apply(outcome) == Applied::Discarded {
                    return;
                }
                self.clamp_selection();
                self.report_viewport();
                if let Screen::Map { .. } = self.screen {
                    self.open_map();
                }
            }
        }
    }

    pub fn on_detail(&mut self, id: &ArticleId, result: Result<DetailView>) {
        match result {
            Ok(detail) => {
                self.status = None;
                self.detail_scroll = 0;
                self.screen = Screen::Detail(Box::new(detail));
            }
            Err(e) => self.status = Some(format!("Could not load article {}: {}", id, e)),
        }
    }
}
