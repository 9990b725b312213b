use nm_core::Coordinates;
use nm_feed::{DetailView, MapPanel};
use tui::backend::Backend;
use tui::layout::{Constraint, Direction, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Span, Spans};
use tui::widgets::canvas::{Canvas, Map, MapResolution};
use tui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap};
use tui::Frame;

use super::app::{App, InputMode, Screen};
use crate::render;

const KEY_HINTS: &str = "tab category · / search · ⏎ open · m map · q quit";

pub fn draw<B: Backend>(f: &mut Frame<B>, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(1)].as_ref())
        .split(f.size());

    if let Screen::Feed = app.screen() {
        app.set_rows(chunks[1].height.saturating_sub(2) as usize);
    }

    render_tabs(f, app, chunks[0]);
    match app.screen() {
        Screen::Feed => render_feed(f, app, chunks[1]),
        Screen::Detail(detail) => render_detail(f, app, detail, chunks[1]),
        Screen::Map { panel, selected } => render_map(f, panel, *selected, chunks[1]),
    }
    render_status(f, app, chunks[2]);
}

fn render_tabs<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let titles: Vec<Spans> = app
        .tabs()
        .iter()
        .map(|category| Spans::from(category.wire_label()))
        .collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(" newsmap "))
        .select(app.tab_index())
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, area);
}

fn render_feed<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let feed = app.view();
    let visible = feed.visible();
    let title = format!(" {} · {} of {} ", feed.category().wire_label(), visible.len(), visible.total);
    let block = Block::default().borders(Borders::ALL).title(title);

    let placeholder = if let Some(e) = feed.error() {
        Some(format!("Could not load news: {}", e))
    } else if visible.is_empty() && feed.loading() {
        Some("Loading news…".to_string())
    } else if visible.is_empty() {
        Some("No news found.".to_string())
    } else {
        None
    };
    if let Some(text) = placeholder {
        f.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: true }), area);
        return;
    }

    let (offset, selected) = app.viewport();
    let end = (offset + app.rows()).min(visible.len());
    let items: Vec<ListItem> = visible.items[offset.min(end)..end]
        .iter()
        .map(|article| {
            ListItem::new(Spans::from(vec![
                Span::styled(format!("{:<12}", article.date), Style::default().fg(Color::DarkGray)),
                Span::raw(render::article_line(article)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    state.select(Some(selected.saturating_sub(offset)));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_detail<B: Backend>(f: &mut Frame<B>, app: &App, detail: &DetailView, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(68), Constraint::Percentage(32)].as_ref())
        .split(area);

    let mut lines = vec![Spans::from(Span::styled(
        detail.title().to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    let meta: Vec<&str> = [detail.date(), detail.source(), detail.category()]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect();
    lines.push(Spans::from(Span::styled(meta.join(" · "), Style::default().fg(Color::DarkGray))));
    if let Some(image) = detail.image() {
        lines.push(Spans::from(format!("🖼  {}", image)));
    }
    lines.push(Spans::default());
    lines.extend(render::plain_text(&detail.detail.content).lines().map(|line| Spans::from(line.to_string())));

    let body = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" esc back · g map "))
        .wrap(Wrap { trim: true })
        .scroll((app.detail_scroll(), 0));
    f.render_widget(body, columns[0]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(columns[1]);

    if detail.map.open {
        let title = if detail.map.exact {
            format!(" {} ", detail.map.center)
        } else {
            " Location not specified, showing city centre ".to_string()
        };
        let markers = if detail.map.exact { vec![(detail.map.center, true)] } else { Vec::new() };
        draw_map(f, side[0], title, detail.map.center, detail.map.zoom, &markers);
    } else {
        let hint = Paragraph::new("Press g to show the map")
            .block(Block::default().borders(Borders::ALL).title(" map "));
        f.render_widget(hint, side[0]);
    }

    let sidebar: Vec<ListItem> = detail
        .sidebar
        .iter()
        .map(|article| ListItem::new(article.title.clone()))
        .collect();
    f.render_widget(
        List::new(sidebar).block(Block::default().borders(Borders::ALL).title(" latest ")),
        side[1],
    );
}

fn render_map<B: Backend>(f: &mut Frame<B>, panel: &MapPanel, selected: usize, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(area);

    let markers: Vec<(Coordinates, bool)> = panel
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| (entry.coords, i == selected))
        .collect();
    let title = format!(" {} · zoom {} ", panel.center(), panel.zoom());
    draw_map(f, columns[0], title, panel.center(), panel.zoom(), &markers);

    let items: Vec<ListItem> = panel
        .entries()
        .iter()
        .map(|entry| {
            ListItem::new(vec![
                Spans::from(entry.title.clone()),
                Spans::from(Span::styled(
                    format!("{} · {}", entry.date, entry.category),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        })
        .collect();
    let block = Block::default().borders(Borders::ALL).title(" latest on the map · esc back ");
    if items.is_empty() {
        f.render_widget(Paragraph::new("No geotagged news.").block(block), columns[1]);
        return;
    }
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default();
    state.select(Some(selected));
    f.render_stateful_widget(list, columns[1], &mut state);
}

/// Coastline canvas around `center`. Higher zoom narrows the window.
fn draw_map<B: Backend>(
    f: &mut Frame<B>,
    area: Rect,
    title: String,
    center: Coordinates,
    zoom: u8,
    markers: &[(Coordinates, bool)],
) {
    let span = 1440.0 / 2f64.powi(zoom as i32);
    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .x_bounds([center.lon - span, center.lon + span])
        .y_bounds([center.lat - span / 2.0, center.lat + span / 2.0])
        .paint(|ctx| {
            ctx.draw(&Map {
                color: Color::DarkGray,
                resolution: MapResolution::High,
            });
            ctx.layer();
            for (coords, highlighted) in markers {
                let color = if *highlighted { Color::Yellow } else { Color::Red };
                ctx.print(coords.lon, coords.lat, Span::styled("●", Style::default().fg(color)));
            }
        });
    f.render_widget(canvas, area);
}

fn render_status<B: Backend>(f: &mut Frame<B>, app: &App, area: Rect) {
    let text = match app.mode() {
        InputMode::Search => format!("/{}▏", app.view().search()),
        InputMode::Normal => {
            let mut parts: Vec<String> = Vec::new();
            if let Some(status) = app.status() {
                parts.push(status.to_string());
            } else if app.view().loading() {
                parts.push("⟳ loading".to_string());
            }
            if !app.view().search().is_empty() {
                parts.push(format!("search: {}", app.view().search()));
            }
            parts.push(KEY_HINTS.to_string());
            parts.join("  │  ")
        }
    };
    f.render_widget(Paragraph::new(text).style(Style::default().fg(Color::Gray)), area);
}
