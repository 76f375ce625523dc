//! Shared networking constants and helpers used by client and server.

/// TCP port the feed server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 3000;

/// Host the client connects to unless told otherwise.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Helper to format a host and port like "host:port".
pub fn addr(host: &str, port: u16) -> String {
    format!("{}:{}", host, port)
}
