//! Gap repair through individual resend requests.
//!
//! After the stream-all exchange, every sequence missing from `1..=max` is
//! requested again, one connection at a time and in ascending order. A failed
//! resend is logged and leaves that sequence missing; recovery moves on to the
//! next one.
//!
//! Gaps above the largest sequence a resend request can carry are never
//! requested. They are kept as ranges and reported with a single event.
use std::ops::RangeInclusive;

use feed_common::request::MAX_RESEND_SEQUENCE;
use feed_common::{FeedError, FeedLogger, RecordSet, Result, gaps};

use crate::session::{SessionClient, describe};
use crate::transport::Transport;

/// Outcome of one recovery pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Resendable sequences that were missing after the stream, ascending.
    pub requested: Vec<i32>,
    /// Sequences recovered by a resend.
    pub recovered: Vec<i32>,
    /// Requested sequences that are still missing.
    pub failed: Vec<i32>,
    /// Missing ranges that no resend request can reach.
    pub out_of_range: Vec<RangeInclusive<i32>>,
}

impl RecoveryReport {
    /// Returns `true` when every gap was repaired.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.out_of_range.is_empty()
    }

    /// Number of sequences still missing after recovery.
    pub fn still_missing(&self) -> u64 {
        self.failed.len() as u64 + range_len(&self.out_of_range)
    }
}

fn range_len(ranges: &[RangeInclusive<i32>]) -> u64 {
    ranges
        .iter()
        .map(|r| u64::from(r.end().abs_diff(*r.start())) + 1)
        .sum()
}

/// Requests every missing sequence and appends what comes back to `records`.
///
/// Fails only when `records` is empty, since the range to check is then
/// undefined.
pub fn recover<T: Transport, L: FeedLogger>(
    session: &SessionClient<T, L>,
    records: &mut RecordSet,
) -> Result<RecoveryReport> {
    let logger = session.logger();
    let mut report = RecoveryReport::default();

    let sequences = records.sequences();
    for gap in gaps::missing_ranges(&sequences)? {
        let (start, end) = gap.into_inner();
        if start <= MAX_RESEND_SEQUENCE {
            report.requested.extend(start..=end.min(MAX_RESEND_SEQUENCE));
        }
        if end > MAX_RESEND_SEQUENCE {
            report
                .out_of_range
                .push(start.max(MAX_RESEND_SEQUENCE + 1)..=end);
        }
    }

    if report.requested.is_empty() && report.out_of_range.is_empty() {
        logger.info("No gaps detected");
    } else if !report.requested.is_empty() {
        logger.info(&format!(
            "{} missing sequences to request, {} to {}",
            report.requested.len(),
            report.requested[0],
            report.requested[report.requested.len() - 1]
        ));
    }
    if let Some(first) = report.out_of_range.first() {
        logger.error(&format!(
            "{} missing sequences in {} ranges starting at {:?} stay missing: {}",
            range_len(&report.out_of_range),
            report.out_of_range.len(),
            first,
            FeedError::ResendOutOfRange(*first.start())
        ));
    }

    for &sequence in &report.requested {
        match session.resend(sequence) {
            Ok(record) => {
                logger.info(&describe("Resend recovered", &record));
                report.recovered.push(sequence);
                records.push(record);
            }
            Err(e) => {
                logger.error(&format!(
                    "Resend of sequence {} failed, it stays missing: {}",
                    sequence, e
                ));
                report.failed.push(sequence);
            }
        }
    }
    Ok(report)
}
