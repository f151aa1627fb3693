use std::{
    fmt::{self, Write},
    sync::MutexGuard,
};

use crate::{Level, Location, Logger};

/// A record assembled piece by piece.
///
/// Holds the stream lock of its [`Logger`] and writes the accumulated text
/// as one record when dropped. Nothing is written if no text was appended.
pub struct LogStream<'a> {
    logger: &'a Logger,
    buffer: MutexGuard<'a, String>,
    level: Level,
    location: Location<'a>,
    category: Option<&'a str>,
}

impl<'a> LogStream<'a> {
    pub(crate) fn new(
        logger: &'a Logger,
        buffer: MutexGuard<'a, String>,
        level: Level,
        location: Location<'a>,
    ) -> Self {
        Self {
            logger,
            buffer,
            level,
            location,
            category: None,
        }
    }

    pub fn in_category(mut self, category: &'a str) -> Self {
        self.category = Some(category);
        self
    }

    pub fn append<T: fmt::Display>(mut self, value: T) -> Self {
        // writing into a String cannot fail
        let _ = write!(self.buffer, "{value}");
        self
    }
}

impl Write for LogStream<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buffer.push_str(s);
        Ok(())
    }
}

impl Drop for LogStream<'_> {
    fn drop(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let message = std::mem::take(&mut *self.buffer);
        self.logger
            .write(self.level, self.location, self.category, &message);
    }
}
