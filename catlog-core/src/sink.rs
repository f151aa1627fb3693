use std::{
    io::Write,
    sync::atomic::{AtomicBool, Ordering},
};

use colored::Colorize;
use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::{config::CATLOG_CONFIG, level::Level, record::Record, template::Template};

/// Destination of log records.
///
/// The router calls [`Sink::write`] once per matched record, synchronously
/// and in registration order. A sink renders the record itself (usually with
/// its own [`Template`]) and is free to drop it: failures stay inside the sink
/// and are reported on stderr, never to the caller.
pub trait Sink: Send + Sync {
    fn write(&self, record: &Record<'_>);

    /// Flushes buffered output. Called before the process aborts on a fatal record.
    fn flush(&self) {}
}

/// Writes rendered records to stderr.
pub struct ConsoleSink {
    template: Template,
    environment: Option<Template>,
    ignore_environment: AtomicBool,
    colors: bool,
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleSink {
    /// Creates a console sink with the default template. When
    /// `CATLOG_MESSAGE_PATTERN` is set it takes precedence over the sink's own
    /// template, see [`ConsoleSink::ignore_environment_pattern`].
    pub fn new() -> Self {
        Self {
            template: Template::default(),
            environment: CATLOG_CONFIG
                .message_pattern()
                .map(|pattern| Template::new(&format!("{pattern}\n"))),
            ignore_environment: AtomicBool::new(false),
            colors: false,
        }
    }

    /// Colours each line according to its level.
    pub fn with_colors(self, yes: bool) -> Self {
        Self {
            colors: yes,
            ..self
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn ignore_environment_pattern(&self, ignore: bool) {
        self.ignore_environment.store(ignore, Ordering::Relaxed);
    }

    fn active_template(&self) -> &Template {
        match &self.environment {
            Some(template) if !self.ignore_environment.load(Ordering::Relaxed) => template,
            _ => &self.template,
        }
    }
}

impl Sink for ConsoleSink {
    fn write(&self, record: &Record<'_>) {
        let mut line = self.active_template().render(record);
        if self.colors {
            line = colorize(&line, record.level());
        }
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn colorize(line: &str, level: Level) -> String {
    let body = line.trim_end_matches('\n');
    let tail = &line[body.len()..];
    let body = match level {
        Level::Fatal => body.red().bold(),
        Level::Error => body.red(),
        Level::Warning => body.yellow(),
        Level::Info => body.green(),
        Level::Debug => body.blue(),
        Level::Trace => body.purple(),
    };
    format!("{body}{tail}")
}

/// Emits each rendered record on a channel, for consumers such as a UI.
pub struct ChannelSink {
    template: Template,
    sender: Sender<String>,
}

impl ChannelSink {
    pub fn new(sender: Sender<String>) -> Self {
        Self {
            template: Template::default(),
            sender,
        }
    }

    /// Creates a sink together with the receiving end of an unbounded channel.
    pub fn unbounded() -> (Self, Receiver<String>) {
        let (sender, receiver) = unbounded();
        (Self::new(sender), receiver)
    }

    pub fn template(&self) -> &Template {
        &self.template
    }
}

impl Sink for ChannelSink {
    fn write(&self, record: &Record<'_>) {
        // a dropped receiver just means nobody listens any more
        let _ = self.sender.send(self.template.render(record));
    }
}
