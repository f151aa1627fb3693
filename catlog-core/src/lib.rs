//! # catlog-core
//! Core of catlog: records, format templates, sinks and the category router.
//!
//! A [`Router`] owns global and per-category sets of [`Sink`]s and delivers
//! each [`Record`] to the sets its category selects. Sinks render records with
//! their own [`Template`].
//!
//! ```rust
//! use std::sync::Arc;
//! use catlog_core::{ChannelSink, Level, Location, Record, Router};
//!
//! let router = Router::new();
//! let (sink, lines) = ChannelSink::unbounded();
//! sink.template().set("[%-7l] %m");
//! router.register_sink(Arc::new(sink), Some("net"));
//!
//! let location = Location::new(file!(), line!(), "main");
//! router.dispatch(&Record::new(Level::Warning, location, "timeout").with_category(Some("net")));
//! assert_eq!(lines.try_recv().unwrap(), "[Warning] timeout");
//! ```

mod config;
mod file_sink;
mod level;
mod record;
mod router;
mod signature;
mod sink;
mod template;
mod timestamp;

pub use config::{CATLOG_CONFIG, CatLogConfig};
pub use file_sink::FileSink;
pub use level::{Level, ParseLevelError};
pub use record::{Location, Record};
pub use router::{Diagnostics, LoggerGuard, Router};
pub use signature::strip_function_name;
pub use sink::{ChannelSink, ConsoleSink, Sink};
pub use template::{DEFAULT_TEMPLATE, Template};
pub use timestamp::{DEFAULT_TIMESTAMP_PATTERN, format_timestamp};
