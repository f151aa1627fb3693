use std::{path::PathBuf, sync::Arc};

use catlog::{ChannelSink, Level, Logger, logger_config};

fn main() {
    let dir = PathBuf::from("/tmp/catlog_example_categories");
    let _ = std::fs::remove_dir_all(&dir);

    let (network, network_lines) = ChannelSink::unbounded();
    network.template().set("%t{HH:mm:ss} %L %m");

    let _guard = logger_config()
        .with_format("%t [%-7l] <%c> %m")
        .with_rotating_log_file("app_", &dir, 3)
        .unwrap()
        .with_category_sink("network", Arc::new(network))
        .init_global();

    catlog::info!("application started");
    catlog::warning!(category: "network", "connection to {} timed out", "10.0.0.7");

    let database = Logger::scoped("database");
    database.info(catlog::location!(), "no sink takes this category, so it falls back to stderr");

    {
        let _timer = catlog::log_time!(Level::Info, "work");
        let mut stream = catlog::log_stream!(Level::Debug);
        for i in 0..3 {
            stream = stream.append(format_args!("step {i}; "));
        }
    }

    log::info!(target: "network", "the log crate reaches categories too");

    println!("\n--- Network sink ---");
    for line in network_lines.try_iter() {
        println!("  {line}");
    }
    println!("Log directory: {}", dir.display());
}
