use std::time::{Duration, Instant};

use crate::{Level, Location, Logger, strip_function_name};

/// Logs how long a scope took when dropped.
///
/// The record reads `"<block>" finished in 12 ms`, or
/// `Function <name> finished in 12 ms` without a block label. Durations of ten
/// seconds or more are given in whole seconds.
pub struct TimingGuard<'a> {
    logger: &'a Logger,
    level: Level,
    location: Location<'a>,
    block: Option<String>,
    start: Instant,
}

impl<'a> TimingGuard<'a> {
    pub fn new(
        logger: &'a Logger,
        level: Level,
        location: Location<'a>,
        block: Option<&str>,
    ) -> Self {
        Self {
            logger,
            level,
            location,
            block: block.map(str::to_string),
            start: Instant::now(),
        }
    }
}

impl Drop for TimingGuard<'_> {
    fn drop(&mut self) {
        let elapsed = format_elapsed(self.start.elapsed());
        let message = match &self.block {
            Some(block) => format!("\"{block}\" finished in {elapsed}"),
            None => format!(
                "Function {} finished in {elapsed}",
                strip_function_name(self.location.function)
            ),
        };
        self.logger.write(self.level, self.location, None, &message);
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    if elapsed >= Duration::from_secs(10) {
        format!("{} s", elapsed.as_secs())
    } else {
        format!("{} ms", elapsed.as_millis())
    }
}
