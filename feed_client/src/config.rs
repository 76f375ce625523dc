//! Runtime settings of the feed client.
use std::path::PathBuf;
use std::time::Duration;

use feed_common::net::{DEFAULT_HOST, DEFAULT_PORT, addr};

/// Default read timeout applied to every connection.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default location of the JSON output.
pub const DEFAULT_OUTPUT: &str = "output.json";

/// Where to connect, how long to wait, and where to write the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Feed server host name or IP address.
    pub host: String,
    /// Feed server TCP port.
    pub port: u16,
    /// Destination of the sorted records.
    pub output: PathBuf,
    /// Limit for establishing a connection; `None` waits for the OS.
    pub connect_timeout: Option<Duration>,
    /// Limit for each read; `None` blocks indefinitely.
    pub read_timeout: Option<Duration>,
    /// Limit for each write; `None` blocks indefinitely.
    pub write_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            output: PathBuf::from(DEFAULT_OUTPUT),
            connect_timeout: None,
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
            write_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Server address as "host:port".
    pub fn address(&self) -> String {
        addr(&self.host, self.port)
    }
}

/// Converts a millisecond setting into a timeout, where `0` disables it.
pub fn timeout_from_millis(millis: u64) -> Option<Duration> {
    (millis > 0).then(|| Duration::from_millis(millis))
}
