//! # catlog
//! Category-routed logger with per-sink format templates.
//!
//! ## Usage
//! ```toml
//! // Cargo.toml
//! ...
//! [dependencies]
//! catlog = "0.1.0"
//! ```
//!
//! ```rust
//! use catlog::logger_config;
//!
//! let _guard = logger_config()
//!     .with_format("%t [%-7l] <%c> %m")
//!     .init_global();
//! catlog::info!("Hello, world!");
//! log::info!("records of the log crate are routed too");
//! // guard flushes and releases the sinks when dropped
//! ```
//!
//! ## Categories
//! Records carrying a category go to the sinks registered for it. Forwarded
//! categories and the default category also reach the global sinks.
//! ```rust
//! use std::sync::Arc;
//! use catlog::{ChannelSink, logger_config};
//!
//! let (network, lines) = ChannelSink::unbounded();
//! network.template().set("%l: %m");
//! let logger = logger_config()
//!     .no_console()
//!     .with_category_sink("network", Arc::new(network))
//!     .build();
//!
//! logger.write(catlog::Level::Warning, catlog::location!(), Some("network"), "timeout");
//! assert_eq!(lines.try_recv().unwrap(), "Warning: timeout");
//! ```
//!
//! ## Logging to files
//! ```rust
//! use catlog::logger_config;
//!
//! let logger = logger_config()
//!     .with_log_file("/tmp/catlog_doc.log")
//!     .with_format("%l %m")
//!     .no_console()
//!     .build();
//! logger.info(catlog::location!(), "Hello, file!");
//! assert!(std::fs::read_to_string("/tmp/catlog_doc.log").unwrap().ends_with("Info Hello, file!\n"));
//! ```

#[macro_use]
mod macros;
mod bridge;
mod stream;
mod timing;

pub use bridge::LogBridge;
pub use catlog_core::{
    CATLOG_CONFIG, CatLogConfig, ChannelSink, ConsoleSink, DEFAULT_TEMPLATE, FileSink, Level,
    Location, LoggerGuard, ParseLevelError, Record, Router, Sink, Template, format_timestamp,
    strip_function_name,
};
pub use stream::LogStream;
pub use timing::TimingGuard;

use chrono::{DateTime, Local};
use std::{
    path::Path,
    sync::{Arc, LazyLock, Mutex, PoisonError},
};

/// Process-wide logger, writing through [`Router::global`].
static LOGGER: LazyLock<Logger> = LazyLock::new(|| Logger::new(Router::global()));

/// Entry point of log calls: builds records and hands them to a [`Router`].
pub struct Logger {
    router: Arc<Router>,
    stream: Mutex<String>,
}

impl Logger {
    pub fn new(router: Arc<Router>) -> Self {
        Self {
            router,
            stream: Mutex::new(String::new()),
        }
    }

    /// A logger for one subsystem: uncategorised records get
    /// `default_category` and are routed through the process-wide sinks.
    pub fn scoped(default_category: &str) -> Self {
        let router = Router::scoped();
        router.set_default_category(Some(default_category));
        Self::new(Arc::new(router))
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn write(
        &self,
        level: Level,
        location: Location<'_>,
        category: Option<&str>,
        message: &str,
    ) {
        let record = Record::new(level, location, message).with_category(category);
        self.router.dispatch(&record);
    }

    /// Like [`Logger::write`], with an explicit timestamp.
    pub fn write_at(
        &self,
        timestamp: DateTime<Local>,
        level: Level,
        location: Location<'_>,
        category: Option<&str>,
        message: &str,
    ) {
        let record = Record::new(level, location, message)
            .with_category(category)
            .at(timestamp);
        self.router.dispatch(&record);
    }

    pub fn trace(&self, location: Location<'_>, message: &str) {
        self.write(Level::Trace, location, None, message);
    }

    pub fn debug(&self, location: Location<'_>, message: &str) {
        self.write(Level::Debug, location, None, message);
    }

    pub fn info(&self, location: Location<'_>, message: &str) {
        self.write(Level::Info, location, None, message);
    }

    pub fn warning(&self, location: Location<'_>, message: &str) {
        self.write(Level::Warning, location, None, message);
    }

    pub fn error(&self, location: Location<'_>, message: &str) {
        self.write(Level::Error, location, None, message);
    }

    /// Writes a fatal record and aborts the process.
    pub fn fatal(&self, location: Location<'_>, message: &str) {
        self.write(Level::Fatal, location, None, message);
    }

    /// Writes a fatal `ASSERT: "<condition>"` record when `condition` is false.
    pub fn assert(&self, condition: bool, location: Location<'_>, condition_text: &str) {
        if !condition {
            let message = format!("ASSERT: \"{condition_text}\"");
            self.write(Level::Fatal, location, None, &message);
        }
    }

    /// Starts a record assembled piece by piece. It is written when the
    /// returned handle is dropped; other streams of this logger wait until then.
    pub fn stream<'a>(&'a self, level: Level, location: Location<'a>) -> LogStream<'a> {
        let buffer = self.stream.lock().unwrap_or_else(PoisonError::into_inner);
        LogStream::new(self, buffer, level, location)
    }
}

/// The process-wide logger used by the macros.
pub fn logger() -> &'static Logger {
    &LOGGER
}

/// Collects sinks and routing rules, then applies them to a [`Router`].
pub struct ConfigBuilder {
    console: bool,
    colors: bool,
    format: Option<String>,
    log_file: Option<FileSink>,
    default_category: Option<String>,
    sinks: Vec<(Option<String>, Arc<dyn Sink>)>,
    forwards: Vec<String>,
    log_bridge: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            console: true,
            colors: true,
            format: None,
            log_file: None,
            default_category: None,
            sinks: Vec::new(),
            forwards: Vec::new(),
            log_bridge: true,
        }
    }
}

impl ConfigBuilder {
    fn configure(self, router: &Router) {
        let Self {
            console,
            colors,
            format,
            log_file,
            default_category,
            sinks,
            forwards,
            log_bridge: _,
        } = self;
        if console {
            let sink = ConsoleSink::new().with_colors(colors);
            if let Some(format) = &format {
                sink.template().set(&format!("{format}\n"));
            }
            router.register_sink(Arc::new(sink), None);
        }
        if let Some(file) = log_file {
            if let Some(format) = &format {
                file.template().set(&format!("{format}\n"));
            }
            router.register_sink(Arc::new(file), None);
        }
        for (category, sink) in sinks {
            router.register_sink(sink, category.as_deref());
        }
        for category in &forwards {
            router.set_forward(category, true);
        }
        if default_category.is_some() {
            router.set_default_category(default_category.as_deref());
        }
    }

    /// Disables the console sink.
    pub fn no_console(self) -> Self {
        Self {
            console: false,
            ..self
        }
    }
    /// Enables or disables the console sink.
    pub fn with_console(self, yes: bool) -> Self {
        Self {
            console: yes,
            ..self
        }
    }
    /// Colours console lines by level.
    pub fn with_colors(self, yes: bool) -> Self {
        Self {
            colors: yes,
            ..self
        }
    }
    /// Template of the console and file sinks, a newline is appended.
    pub fn with_format(self, format: &str) -> Self {
        Self {
            format: Some(format.into()),
            ..self
        }
    }
    /// Appends to a log file. The file is created on the first record.
    pub fn with_log_file<P: AsRef<Path>>(self, path: P) -> Self {
        Self {
            log_file: Some(FileSink::new(path)),
            ..self
        }
    }
    /// Logs to a fresh timestamped file in `directory`, keeping at most
    /// `max_files` files with the same prefix.
    pub fn with_rotating_log_file<P: AsRef<Path>>(
        self,
        prefix: &str,
        directory: P,
        max_files: u32,
    ) -> Result<Self, std::io::Error> {
        Ok(Self {
            log_file: Some(FileSink::rotating(prefix, directory, max_files)?),
            ..self
        })
    }
    /// Category given to records that carry none.
    pub fn with_default_category(self, category: &str) -> Self {
        Self {
            default_category: Some(category.into()),
            ..self
        }
    }
    /// Registers an additional global sink.
    pub fn with_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push((None, sink));
        self
    }
    /// Registers a sink for the records of `category`.
    pub fn with_category_sink(mut self, category: &str, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push((Some(category.into()), sink));
        self
    }
    /// Sends the records of `category` to the global sinks as well.
    pub fn with_forward(mut self, category: &str) -> Self {
        self.forwards.push(category.into());
        self
    }
    /// Leaves the `log` crate alone.
    pub fn no_log_bridge(self) -> Self {
        Self {
            log_bridge: false,
            ..self
        }
    }
    /// Registers the configured sinks and rules on [`Router::global`] and
    /// routes the `log` crate into it. Dropping the guard releases the sinks.
    #[must_use = "the sinks are released when the guard is dropped; bind it with `let _guard = ...`"]
    pub fn init_global(self) -> LoggerGuard {
        let router = Router::global();
        let log_bridge = self.log_bridge;
        self.configure(&router);
        if log_bridge {
            // a logger of the log crate may already be installed
            let _ = LogBridge::install(logger());
        }
        LoggerGuard::new(router)
    }
    /// Builds an isolated logger with its own router.
    pub fn build(self) -> Logger {
        let router = Router::new();
        self.configure(&router);
        Logger::new(Arc::new(router))
    }
}

/// Starts a configuration with a coloured console sink and the `log` bridge.
pub fn logger_config() -> ConfigBuilder {
    ConfigBuilder::default()
}
