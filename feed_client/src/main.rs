//! Feed Client — downloads every record from a binary market-data feed server,
//! repairs sequence gaps with individual resend requests, and writes the sorted
//! result as JSON.
//!
//! Usage example (CLI):
//! ```bash
//! feed_client --host 127.0.0.1 --port 3000 --output ./output.json
//! ```
//!
//! Logging goes through `env_logger`; set `RUST_LOG=debug` to see the state of
//! every exchange.
#![warn(missing_docs)]
mod args;

use crate::args::Args;
use clap::Parser;
use feed_client::{JsonFileSink, RecordSink, SessionClient, TcpTransport};
use feed_common::{FeedError, LogSink, Result};
use log::{info, warn};

fn main() -> Result<(), FeedError> {
    init_logger();
    let config = Args::parse().into_config();

    let transport = TcpTransport::new(&config);
    info!("Connecting to feed server at {}", transport.address());
    let session = SessionClient::new(transport, LogSink);

    // Fatal errors are already logged by `run`; nothing is written for them.
    let outcome = feed_client::run(&session)?;
    if !outcome.report.is_complete() {
        warn!(
            "{} sequences could not be recovered (failed resends: {}, unreachable ranges: {})",
            outcome.report.still_missing(),
            outcome.report.failed.len(),
            outcome.report.out_of_range.len()
        );
    }

    let mut sink = JsonFileSink::new(&config.output);
    sink.write(&outcome.records)?;
    info!(
        "Wrote {} records to {}",
        outcome.records.len(),
        sink.path().display()
    );
    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
