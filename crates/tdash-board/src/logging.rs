use crate::config::Config;
use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Where log lines end up. The TUI owns stdout, so logs are dropped unless
/// explicitly routed somewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Sink,
    Stdout,
    File,
}

pub fn log_target(config: &Config) -> LogTarget {
    if config.log_file {
        LogTarget::File
    } else if config.log_stdout {
        LogTarget::Stdout
    } else {
        LogTarget::Sink
    }
}

pub fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_target(config) {
        LogTarget::Stdout => {
            let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        }
        LogTarget::File => match open_log_file(config) {
            Ok(file) => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init();
            }
            Err(_) => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(io::sink)
                    .try_init();
            }
        },
        LogTarget::Sink => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init();
        }
    }
}

fn open_log_file(config: &Config) -> io::Result<fs::File> {
    fs::create_dir_all(&config.state_dir)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())
}
