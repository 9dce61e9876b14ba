use chyron::cli::Args;
use chyron::config::Settings;
use chyron::paths::{self, PathConfig};
use chyron::server::Gateway;

use anyhow::Context;
use clap::Parser;
use log::{info, warn};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for log setup)
    let args = Args::parse();

    // Create path configuration from CLI args and environment
    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());

    // Ensure directories exist
    if let Err(e) = paths::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {}", e);
    }

    // Determine log level based on verbosity flags
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    // Initialize logger based on --log flag
    if let Some(log_path_opt) = &args.log_file {
        // File logging with specified verbosity level
        let log_path = log_path_opt
            .as_ref()
            .cloned()
            .unwrap_or_else(|| paths::data_file("chyron.log", &path_config));

        let file = std::fs::File::create(&log_path)
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;

        env_logger::Builder::new()
            .filter_level(log_level)
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!(
            "Logging to file: {} (level: {:?})",
            log_path.display(),
            log_level
        );
    } else {
        // Console logging with specified verbosity level (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .format_timestamp_millis()
            .init();
    }

    // Load settings (config file is optional), then apply CLI overrides
    let config_path = paths::config_file("chyron.json", &path_config);
    let mut settings = Settings::load_or_default(&config_path)?;
    settings.apply_cli(&args);

    if settings.password == Settings::default().password {
        warn!(
            "Using the default password; set one in {} or via --password",
            config_path.display()
        );
    }

    info!(
        "Control endpoint: {} (target '{}', reply timeout {} ms, queue bound {} ms)",
        settings.channel_addr,
        settings.target_node,
        settings.reply_timeout_ms,
        settings.max_queue_wait_ms
    );

    let gateway = Gateway::new(Arc::new(settings));
    gateway.run()
}
