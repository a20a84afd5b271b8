// Logging for the tabstore binary, powered by tracing-subscriber.
//
// `log::*` records from the library are routed through the same subscriber
// by the fmt builder's `try_init`.

use std::fs::{self, OpenOptions};
use std::path::Path;

use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "tabstore.log";

fn build_env_filter(level: &str) -> anyhow::Result<EnvFilter> {
    // RUST_LOG wins over the command line level.
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level)
        .map_err(|e| anyhow::anyhow!("Invalid log level '{}': {}", level, e))
}

/// Logs to stderr. Used by the line-oriented REPL.
pub fn init_stderr(level: &str) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(level)?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))
}

/// Logs to `<dir>/tabstore.log`, keeping the terminal free for the TUI.
pub fn init_file(level: &str, dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))?;

    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(level)?)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install logger: {}", e))
}
