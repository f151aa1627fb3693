use chrono::{DateTime, Local};

use crate::level::Level;

/// Call-site information captured where a record is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location<'a> {
    pub file: &'a str,
    pub line: u32,
    pub function: &'a str,
}

impl<'a> Location<'a> {
    pub const fn new(file: &'a str, line: u32, function: &'a str) -> Self {
        Self {
            file,
            line,
            function,
        }
    }
}

/// One log record. Built per call, never stored by the router.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    timestamp: DateTime<Local>,
    level: Level,
    location: Location<'a>,
    category: Option<&'a str>,
    message: &'a str,
}

impl<'a> Record<'a> {
    /// Creates an uncategorised record stamped with the current local time.
    pub fn new(level: Level, location: Location<'a>, message: &'a str) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            location,
            category: None,
            message,
        }
    }

    pub fn at(self, timestamp: DateTime<Local>) -> Self {
        Self { timestamp, ..self }
    }

    pub fn with_category(self, category: Option<&'a str>) -> Self {
        Self { category, ..self }
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn location(&self) -> Location<'a> {
        self.location
    }

    pub fn file(&self) -> &'a str {
        self.location.file
    }

    pub fn line(&self) -> u32 {
        self.location.line
    }

    pub fn function(&self) -> &'a str {
        self.location.function
    }

    /// Explicit category of the record; `None` means the router's default category.
    pub fn category(&self) -> Option<&'a str> {
        self.category
    }

    pub fn message(&self) -> &'a str {
        self.message
    }
}
