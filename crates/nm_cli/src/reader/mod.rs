//! Interactive terminal reader.

mod app;
mod ui;

pub use app::App;

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use nm_core::{ArticleId, Result};
use nm_feed::{load_detail, DetailView, FetchMessage, FetchRunner};
use tokio::sync::mpsc;
use tracing::debug;
use tui::backend::{Backend, CrosstermBackend};
use tui::Terminal;

use app::Action;

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    terminal.clear()?;
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the reader until the user quits. Fetch results arrive on `rx`.
pub async fn run(
    mut app: App,
    runner: FetchRunner,
    mut rx: mpsc::UnboundedReceiver<FetchMessage>,
    sidebar_limit: usize,
) -> Result<()> {
    let mut terminal = setup_terminal()?;

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_app(&mut terminal, &mut app, &runner, &mut rx, sidebar_limit).await;
    restore_terminal(&mut terminal)?;
    result
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &FetchRunner,
    rx: &mut mpsc::UnboundedReceiver<FetchMessage>,
    sidebar_limit: usize,
) -> Result<()> {
    let (detail_tx, mut detail_rx) = mpsc::unbounded_channel::<(ArticleId, Result<DetailView>)>();
    if let Some(ticket) = app.mount() {
        runner.spawn(ticket);
    }

    let mut input_interval = tokio::time::interval(Duration::from_millis(50));
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        tokio::select! {
            Some(message) = rx.recv() => app.on_fetch(message),
            Some((id, result)) = detail_rx.recv() => app.on_detail(&id, result),
            _ = input_interval.tick() => {
                while event::poll(Duration::ZERO)? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match app.on_key(key) {
                        Action::None => {}
                        Action::Quit => return Ok(()),
                        Action::Fetch(ticket) => {
                            debug!("spawning fetch #{} ({})", ticket.token, ticket.scope);
                            runner.spawn(ticket);
                        }
                        Action::OpenDetail(id) => {
                            let source = runner.source().clone();
                            let snapshot = app.view().snapshot().cloned();
                            let tx = detail_tx.clone();
                            tokio::spawn(async move {
                                let result = load_detail(source.as_ref(), &id, snapshot.as_ref(), sidebar_limit).await;
                                let _ = tx.send((id, result));
                            });
                        }
                    }
                }
            }
        }
    }
}
