use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use nm_client::HttpFeedClient;
use nm_core::config::PRELOADED_NEWS_KEY;
use nm_core::{ArticleId, CategoryFilter, FeedConfig, FeedSource, Result};
use nm_feed::{
    init_logging, load_detail, settle, FeedSynchronizer, FeedView, FetchMessage, FetchRunner, FetchTicket,
    LoadMoreButton, Logger, MapPanel, PageTrigger, ScrollTrigger, TriggerEvent,
};
use nm_storage::{create_slot, SnapshotCache};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::Level;

mod render;
mod reader;

#[derive(Debug, Clone, PartialEq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total = Duration::ZERO;
        let mut current_number = String::new();
        let mut current_unit = String::new();
        let mut has_number = false;

        let mut flush = |number: &mut String, unit: &mut String| -> std::result::Result<(), String> {
            let value: u64 = number
                .parse()
                .map_err(|_| "Invalid number in duration".to_string())?;
            total += match unit.as_str() {
                "ms" => Duration::from_millis(value),
                "" | "s" => Duration::from_secs(value),
                "m" => Duration::from_secs(value * 60),
                "h" => Duration::from_secs(value * 3600),
                "d" => Duration::from_secs(value * 86400),
                other => return Err(format!("Invalid duration unit: {}", other)),
            };
            number.clear();
            unit.clear();
            Ok(())
        };

        for c in s.chars() {
            if c.is_ascii_digit() {
                if !current_unit.is_empty() {
                    flush(&mut current_number, &mut current_unit)?;
                }
                current_number.push(c);
                has_number = true;
            } else if c.is_ascii_alphabetic() {
                if current_number.is_empty() {
                    return Err(format!("Duration unit without a number: {}", c));
                }
                current_unit.push(c);
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // A trailing bare number counts as seconds.
        if !current_number.is_empty() {
            flush(&mut current_number, &mut current_unit)?;
        }

        if !has_number {
            return Err("Duration must include a number".to_string());
        }

        Ok(HumanDuration(total))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Reader for the newsmap feed service", long_about = None)]
pub struct Cli {
    /// Base URL of the content service (overrides NEWSMAP_API_URL)
    #[arg(long)]
    api_url: Option<String>,
    /// Directory backing the file session slot (overrides NEWSMAP_SESSION_DIR)
    #[arg(long)]
    session_dir: Option<PathBuf>,
    /// Session slot for the snapshot cache: memory or file
    #[arg(long, default_value = "file")]
    slot: String,
    #[arg(long)]
    page_size: Option<usize>,
    /// Delay before revalidating a cached snapshot (e.g. 2s, 500ms)
    #[arg(long)]
    revalidate_delay: Option<HumanDuration>,
    #[arg(long, default_value = "info")]
    log_level: Level,
    /// Write logs to this file instead of stderr. The tui always logs to a file.
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Drop the cached snapshot before starting
    #[arg(long)]
    fresh_session: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print the news list
    List {
        /// Category alias or name, see `nm categories`
        #[arg(long, default_value = "all")]
        category: CategoryFilter,
        #[arg(long, default_value = "")]
        search: String,
        /// Number of pages to show
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Print one article with the latest news
    Show { id: ArticleId },
    /// Print the latest geotagged news
    Map,
    /// List the category filters
    Categories,
    /// Interactive reader
    Tui {
        #[arg(long, default_value = "all")]
        category: CategoryFilter,
    },
}

impl Cli {
    /// Environment first, then flags.
    fn config(&self) -> Result<FeedConfig> {
        let mut config = FeedConfig::from_env()?;
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(dir) = &self.session_dir {
            config.session_dir = dir.clone();
        }
        if let Some(size) = self.page_size {
            config.page_size = size;
        }
        if let Some(delay) = &self.revalidate_delay {
            config.revalidate_delay = delay.0;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Everything needed to drive one feed view from the command line.
struct Session {
    config: FeedConfig,
    source: Arc<dyn FeedSource>,
    cache: Option<SnapshotCache>,
}

impl Session {
    fn open_feed(
        &mut self,
        category: CategoryFilter,
        trigger: Box<dyn PageTrigger>,
    ) -> Result<(FeedView, FetchRunner, UnboundedReceiver<FetchMessage>)> {
        let cache = self.cache.take().ok_or_else(|| {
            nm_core::Error::Config("session cache is already in use".to_string())
        })?;
        let sync = FeedSynchronizer::new(cache, &self.config);
        let view = FeedView::new(sync, category, self.config.page_size, trigger);
        let (runner, rx) = FetchRunner::new(self.source.clone());
        Ok((view, runner, rx))
    }
}

/// Runs the mount fetch for a one-shot command and calls `print` once the
/// list is ready. A cached snapshot is printed straight away and then
/// revalidated without the interactive delay so the next run starts fresh; a
/// cold mount waits for the foreground fetch and fails on its error.
async fn load_and_print<F>(
    view: &mut FeedView,
    runner: &FetchRunner,
    rx: &mut UnboundedReceiver<FetchMessage>,
    mut print: F,
) -> Result<()>
where
    F: FnMut(&mut FeedView),
{
    match view.mount() {
        Some(ticket) if ticket.background => {
            print(&mut *view);
            runner.spawn(FetchTicket {
                delay: Duration::ZERO,
                ..ticket
            });
            settle(view, rx).await;
        }
        Some(ticket) => {
            runner.spawn(ticket);
            settle(view, rx).await;
            if let Some(e) = view.take_error() {
                return Err(e);
            }
            print(&mut *view);
        }
        None => print(&mut *view),
    }
    Ok(())
}

/// Prints the list. Output comes from the session cache when it has one; the
/// cache is refreshed before the command exits.
async fn list(session: &mut Session, category: CategoryFilter, search: String, pages: usize) -> Result<()> {
    let (mut view, runner, mut rx) = session.open_feed(category, Box::new(LoadMoreButton::default()))?;
    view.set_search(search);
    load_and_print(&mut view, &runner, &mut rx, |view| {
        for _ in 1..pages.max(1) {
            if !view.on_trigger(TriggerEvent::LoadMore) {
                break;
            }
        }
        render::print_view(&view.visible());
    })
    .await
}

async fn show(session: &mut Session, id: ArticleId) -> Result<()> {
    let snapshot = session.cache.as_mut().and_then(SnapshotCache::read);
    let view = load_detail(
        session.source.as_ref(),
        &id,
        snapshot.as_ref(),
        session.config.sidebar_limit,
    )
    .await?;
    render::print_detail(&view);
    Ok(())
}

async fn map(session: &mut Session) -> Result<()> {
    let (mut view, runner, mut rx) = session.open_feed(CategoryFilter::All, Box::new(LoadMoreButton::default()))?;
    let top_n = session.config.map_top_n;
    load_and_print(&mut view, &runner, &mut rx, |view| {
        let articles = view.snapshot().map(|s| s.articles()).unwrap_or(&[]);
        render::print_map(&MapPanel::from_articles(articles, top_n));
    })
    .await
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config()?;

    let log_file = match (&cli.log_file, &cli.command) {
        (Some(path), _) => Some(path.clone()),
        (None, Commands::Tui { .. }) => Some(config.session_dir.join("nm.log")),
        (None, _) => None,
    };
    let logger: Logger = init_logging(cli.log_level, log_file.as_deref())?.with_prefix("📰 nm");

    let slot = create_slot(&cli.slot, &config.session_dir)?;
    let mut cache = SnapshotCache::new(slot, PRELOADED_NEWS_KEY);
    if cli.fresh_session {
        cache.clear();
        logger.info("🧹 cleared session cache");
    }

    let source: Arc<dyn FeedSource> = Arc::new(HttpFeedClient::from_config(&config)?);
    logger.debug(&format!("using {} source at {}", source.name(), config.api_url));

    let mut session = Session {
        config,
        source,
        cache: Some(cache),
    };

    match cli.command {
        Commands::List { category, search, pages } => list(&mut session, category, search, pages).await?,
        Commands::Show { id } => show(&mut session, id).await?,
        Commands::Map => map(&mut session).await?,
        Commands::Categories => render::print_categories(),
        Commands::Tui { category } => {
            let trigger = Box::new(ScrollTrigger::new(session.config.sentinel_offset));
            let (view, runner, rx) = session.open_feed(category, trigger)?;
            let app = reader::App::new(view, session.config.map_top_n);
            reader::run(app, runner, rx, session.config.sidebar_limit).await?;
        }
    }

    Ok(())
}
