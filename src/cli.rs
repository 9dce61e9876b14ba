use clap::Parser;
use std::path::PathBuf;

// Build version with transport info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Control: plain-text request/reply (drawtext reinit)\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Overlay control gateway for live ffmpeg pipelines
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Interface and port to listen on (overrides config)
    #[arg(short = 'L', long = "listen", value_name = "ADDR:PORT")]
    pub listen: Option<String>,

    /// Control endpoint of the rendering process (overrides config)
    #[arg(short = 'C', long = "channel", value_name = "ADDR:PORT")]
    pub channel: Option<String>,

    /// Accepted username (overrides config)
    #[arg(short = 'u', long = "user", value_name = "NAME")]
    pub user: Option<String>,

    /// Accepted password (overrides config)
    #[arg(short = 'p', long = "password", value_name = "SECRET")]
    pub password: Option<String>,

    /// Filter instance addressed by reinit commands (overrides config)
    #[arg(long = "target", value_name = "NODE")]
    pub target: Option<String>,

    /// Reply deadline for one control-channel exchange, in milliseconds
    #[arg(short = 't', long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Enable debug logging to file (default: chyron.log)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE")]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}
