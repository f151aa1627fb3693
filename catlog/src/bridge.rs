use log::{LevelFilter, Log, Metadata, SetLoggerError};

use crate::{Level, Location, Logger};

/// Routes the records of the `log` crate through a [`Logger`].
///
/// A record whose target differs from its module path (`log::info!(target:
/// "net", ...)`) is written in the category named by the target.
pub struct LogBridge {
    logger: &'static Logger,
}

impl LogBridge {
    pub fn new(logger: &'static Logger) -> Self {
        Self { logger }
    }

    /// Installs the bridge as the logger of the `log` crate.
    pub fn install(logger: &'static Logger) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(Self::new(logger)))?;
        log::set_max_level(LevelFilter::Trace);
        Ok(())
    }
}

impl Log for LogBridge {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let target = record.target();
        let category = (!target.is_empty() && record.module_path() != Some(target)).then_some(target);
        let location = Location::new(
            record.file().unwrap_or("<unknown>"),
            record.line().unwrap_or(0),
            record.module_path().unwrap_or_default(),
        );
        let message = record.args().to_string();
        self.logger
            .write(Level::from(record.level()), location, category, &message);
    }

    fn flush(&self) {
        self.logger.router().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChannelSink, logger_config};
    use std::sync::Arc;

    fn bridge() -> (LogBridge, crossbeam_channel::Receiver<String>, crossbeam_channel::Receiver<String>) {
        let (global, global_lines) = ChannelSink::unbounded();
        let (net, net_lines) = ChannelSink::unbounded();
        global.template().set("%l %C:%i %m");
        net.template().set("%l %m");
        let logger = logger_config()
            .no_console()
            .with_sink(Arc::new(global))
            .with_category_sink("net", Arc::new(net))
            .build();
        (LogBridge::new(Box::leak(Box::new(logger))), global_lines, net_lines)
    }

    #[test]
    fn test_module_target_is_uncategorised() {
        let (bridge, global, net) = bridge();
        bridge.log(
            &log::Record::builder()
                .level(log::Level::Warn)
                .target("app::db")
                .module_path(Some("app::db"))
                .file(Some("src/db.rs"))
                .line(Some(12))
                .args(format_args!("slow query"))
                .build(),
        );
        assert_eq!(global.try_recv().unwrap(), "Warning app::db:12 slow query");
        assert!(net.try_recv().is_err());
    }

    #[test]
    fn test_custom_target_becomes_category() {
        let (bridge, global, net) = bridge();
        bridge.log(
            &log::Record::builder()
                .level(log::Level::Info)
                .target("net")
                .module_path(Some("app::server"))
                .args(format_args!("listening"))
                .build(),
        );
        assert_eq!(net.try_recv().unwrap(), "Info listening");
        assert!(global.try_recv().is_err());
        assert!(bridge.enabled(&Metadata::builder().build()));
        bridge.flush();
    }
}
