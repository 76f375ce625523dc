//! Command-line arguments for the Feed Client.
//!
//! This module defines the CLI interface using `clap`. See `main` for end-to-end usage.
use clap::Parser;
use feed_client::ClientConfig;
use feed_client::config::{DEFAULT_OUTPUT, timeout_from_millis};
use feed_common::net::{DEFAULT_HOST, DEFAULT_PORT};
use std::path::PathBuf;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Feed server host name or IP address.
    #[clap(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Feed server TCP port.
    #[clap(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Path of the JSON file receiving the sorted records.
    #[clap(long, default_value = DEFAULT_OUTPUT)]
    pub output: String,

    /// Read timeout per connection in milliseconds (0 waits forever).
    #[clap(long, default_value_t = 10_000)]
    pub read_timeout_ms: u64,

    /// Write timeout per connection in milliseconds (0 waits forever).
    #[clap(long, default_value_t = 0)]
    pub write_timeout_ms: u64,

    /// Connect timeout in milliseconds (0 uses the OS default).
    #[clap(long, default_value_t = 0)]
    pub connect_timeout_ms: u64,
}

impl Args {
    /// Converts the parsed arguments into the client configuration.
    pub fn into_config(self) -> ClientConfig {
        ClientConfig {
            host: self.host.trim().replace('"', ""),
            port: self.port,
            output: normalize_path(&self.output),
            connect_timeout: timeout_from_millis(self.connect_timeout_ms),
            read_timeout: timeout_from_millis(self.read_timeout_ms),
            write_timeout: timeout_from_millis(self.write_timeout_ms),
        }
    }
}

/// Normalize a CLI-provided path string by trimming whitespace and matching quotes.
///
/// This allows passing Windows paths in quotes without breaking parsing.
fn normalize_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let no_quotes = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    PathBuf::from(no_quotes)
}
