use nm_core::{Article, CategoryFilter};
use nm_feed::{DetailView, MapPanel, MaterializedView};
use scraper::Html;

const BLOCK_ELEMENTS: &[&str] = &["p", "div", "li", "h1", "h2", "h3", "h4", "blockquote", "br"];

/// Flattens article HTML to text. Script and style bodies are dropped, block
/// elements start a new line.
pub fn plain_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    for node in fragment.root_element().descendants() {
        if let Some(element) = node.value().as_element() {
            if BLOCK_ELEMENTS.contains(&element.name()) {
                out.push('\n');
            }
            continue;
        }
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |e| matches!(e.name(), "script" | "style"))
        });
        if !hidden {
            out.push_str(text);
        }
    }
    out.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn article_line(article: &Article) -> String {
    let mut line = format!("[{}] {}", article.id, article.title);
    if !article.category.is_empty() {
        line.push_str(&format!(" ({})", article.category));
    }
    if article.has_location() {
        line.push_str(" 📍");
    }
    line
}

pub fn article_meta(article: &Article) -> String {
    [article.date.as_str(), article.source.as_str()]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" · ")
}

pub fn print_view(view: &MaterializedView<'_>) {
    if view.is_empty() {
        println!("No news found.");
        return;
    }
    for article in &view.items {
        println!("{}", article_line(article));
        let meta = article_meta(article);
        if !meta.is_empty() {
            println!("    {}", meta);
        }
    }
    println!();
    if view.has_more {
        println!("Showing {} of {} (use --pages to see more)", view.len(), view.total);
    } else {
        println!("Showing {} of {}", view.len(), view.total);
    }
}

pub fn print_categories() {
    for category in CategoryFilter::catalog() {
        println!("{:<10} {}", category.label(), category.wire_label());
    }
}

pub fn print_detail(view: &DetailView) {
    println!("{}", view.title());
    let meta: Vec<&str> = [view.date(), view.source(), view.category()]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect();
    if !meta.is_empty() {
        println!("{}", meta.join(" · "));
    }
    if let Some(image) = view.image() {
        println!("🖼  {}", image);
    }
    println!();
    println!("{}", plain_text(&view.detail.content));
    println!();
    if view.map.exact {
        println!("📍 {} (zoom {})", view.map.center, view.map.zoom);
    } else {
        println!("📍 Location not specified, showing city centre {}", view.map.center);
    }

    if !view.sidebar.is_empty() {
        println!();
        println!("Latest news:");
        for article in &view.sidebar {
            println!("  {}", article_line(article));
        }
    }
}

pub fn print_map(panel: &MapPanel) {
    println!("Centre {} · zoom {}", panel.center(), panel.zoom());
    if panel.entries().is_empty() {
        println!("No geotagged news.");
        return;
    }
    for entry in panel.entries() {
        println!("📍 {:<22} [{}] {} ({})", entry.coords.to_string(), entry.id, entry.title, entry.date);
    }
}
