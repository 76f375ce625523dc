//! Feed Client: downloads a complete, gap-free record set from a feed server.
//!
//! A run has two phases:
//!
//! - stream-all: one connection on which the server sends every record and then
//!   closes. Bytes are reassembled into 17-byte frames, decoded and validated;
//!   invalid frames are dropped.
//! - recovery: every sequence missing from `1..=max` is requested again with a
//!   resend on its own short-lived connection.
//!
//! The result is sorted by sequence and handed to a [`output::RecordSink`].
//!
//! Fatal conditions are a transport failure during stream-all and a stream
//! that produced no valid record at all. Both end the run without output.
#![warn(missing_docs)]
pub mod config;
pub mod output;
pub mod recovery;
pub mod session;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

use feed_common::{FeedLogger, Record, Result};

pub use config::ClientConfig;
pub use output::{JsonFileSink, RecordSink};
pub use recovery::{RecoveryReport, recover};
pub use session::SessionClient;
pub use transport::{Connection, TcpTransport, Transport};

/// Records and recovery statistics of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOutcome {
    /// Every validated record, ascending by sequence.
    pub records: Vec<Record>,
    /// What the recovery pass requested, recovered and gave up on.
    pub report: RecoveryReport,
}

/// Streams all records, repairs gaps, and returns the sorted result.
///
/// Fatal errors are logged through the session's logger before they are
/// returned.
pub fn run<T: Transport, L: FeedLogger>(session: &SessionClient<T, L>) -> Result<FeedOutcome> {
    let logger = session.logger();
    let mut records = session
        .stream_all()
        .inspect_err(|e| logger.error(&format!("Fatal: stream-all failed: {}", e)))?;
    let report = recover(session, &mut records)
        .inspect_err(|e| logger.error(&format!("Fatal: recovery aborted: {}", e)))?;

    let records = records.into_sorted();
    logger.info(&format!(
        "Run complete: {} records, {} recovered, {} still missing",
        records.len(),
        report.recovered.len(),
        report.still_missing()
    ));
    Ok(FeedOutcome { records, report })
}
