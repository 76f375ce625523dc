//! Feed Server — a reference implementation of the binary market-data feed.
//!
//! Listens on TCP and answers two requests:
//!
//! - `[0x01]` stream-all: every record of the tape as 17-byte frames, then close.
//! - `[0x02, seq]` resend: the single record with that sequence.
//!
//! Faults can be injected from the command line to exercise client recovery:
//! ```bash
//! feed_server --port 3000 --count 14 --skip 3,7 --corrupt 2 --chunk-size 5
//! ```
#![warn(missing_docs)]
mod args;

use crate::args::Args;
use clap::Parser;
use feed_common::net::addr;
use feed_common::{FeedError, Result};
use feed_server::{Dataset, FeedServer, shutdown_on_ctrlc};
use log::info;

fn main() -> Result<(), FeedError> {
    init_logger();
    let args = Args::parse();

    let dataset = Dataset::generate(args.count, args.seed)
        .skip(args.skip.iter().copied())
        .corrupt(args.corrupt.iter().copied())
        .corrupt_on_resend(args.corrupt_resend);
    info!(
        "Serving {} records (skipped: {:?}, corrupted: {:?})",
        dataset.len(),
        args.skip,
        args.corrupt
    );

    let server =
        FeedServer::bind(&addr("0.0.0.0", args.port), dataset)?.with_chunk_size(args.chunk_size);

    let shutdown = shutdown_on_ctrlc()?;
    server.run(shutdown)
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
