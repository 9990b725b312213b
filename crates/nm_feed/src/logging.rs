use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::{Mutex, Once};

use tracing::Level;

static INIT: Once = Once::new();

/// Prefixing wrapper around the `tracing` macros, one per engine component.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    prefixes: VecDeque<String>,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            prefixes: VecDeque::new(),
        }
    }

    pub fn with_new_prefixes(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.clear();
        self.prefixes.push_back(prefix.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push_back(prefix.into());
        self
    }

    fn prefix(&self) -> String {
        self.prefixes.iter().map(|p| format!("{} ", p)).collect()
    }

    pub fn info(&self, message: &str) {
        tracing::info!("{}{}", self.prefix(), message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!("{}{}", self.prefix(), message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!("{}{}", self.prefix(), message);
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!("{}{}", self.prefix(), message);
    }
}

/// Installs the global fmt subscriber once. With `log_file` set, output goes
/// to that file instead of stderr so a full-screen UI stays intact.
pub fn init_logging(level: Level, log_file: Option<&Path>) -> io::Result<Logger> {
    let file = match log_file {
        Some(path) => Some(open_log_file(path)?),
        None => None,
    };

    if !tracing::dispatcher::has_been_set() {
        INIT.call_once(|| {
            let builder = tracing_subscriber::fmt().with_max_level(level);
            match file {
                Some(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
                None => builder.with_writer(io::stderr).init(),
            }
        });
    }
    Ok(Logger::new())
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}
