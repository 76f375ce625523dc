//! Gap detection over received sequence numbers.
//!
//! Gaps are reported as inclusive ranges between consecutive received
//! sequences, so the work done is bounded by the number of records received
//! rather than by the largest sequence among them.
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use crate::error::FeedError;
use crate::result::Result;

/// Every run of absent sequences in `1..=max(sequences)`, ascending.
///
/// An empty set has no defined maximum and fails with `EmptySequenceSet`.
pub fn missing_ranges(
    sequences: &BTreeSet<i32>,
) -> Result<impl Iterator<Item = RangeInclusive<i32>> + '_> {
    if sequences.is_empty() {
        return Err(FeedError::EmptySequenceSet);
    }
    let mut next = 1i32;
    Ok(sequences
        .iter()
        .copied()
        .filter(|&s| s >= 1)
        .filter_map(move |s| {
            let gap = (s > next).then(|| next..=s - 1);
            next = s.saturating_add(1);
            gap
        }))
}

/// Every absent sequence in `1..=max(sequences)`, ascending and lazily.
pub fn missing(sequences: &BTreeSet<i32>) -> Result<impl Iterator<Item = i32> + '_> {
    Ok(missing_ranges(sequences)?.flatten())
}
