//! Command-line arguments for the Feed Server.
use clap::Parser;
use feed_common::net::DEFAULT_PORT;

use feed_server::server::DEFAULT_CHUNK_SIZE;

/// Parsed command-line arguments.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// TCP port to listen on.
    #[clap(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Number of records in the tape (sequences 1..=count).
    #[clap(long, default_value_t = 14)]
    pub count: u16,

    /// Sequences left out of the stream-all response, comma separated.
    #[clap(long, value_delimiter = ',')]
    pub skip: Vec<i32>,

    /// Sequences streamed with a zero quantity, comma separated.
    #[clap(long, value_delimiter = ',')]
    pub corrupt: Vec<i32>,

    /// Corrupt those sequences on resend as well.
    #[clap(long)]
    pub corrupt_resend: bool,

    /// Size in bytes of the pieces the stream-all response is written in.
    #[clap(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// Seed of the record generator.
    #[clap(long, default_value_t = 7)]
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fault_lists() {
        let args = Args::parse_from([
            "feed_server",
            "--skip",
            "3,7",
            "--corrupt",
            "2",
            "--corrupt-resend",
        ]);
        assert_eq!(args.skip, vec![3, 7]);
        assert_eq!(args.corrupt, vec![2]);
        assert!(args.corrupt_resend);
        assert_eq!(args.port, DEFAULT_PORT);
    }
}
