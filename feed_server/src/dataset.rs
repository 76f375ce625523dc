//! Records served by the reference feed server.
//!
//! A `Dataset` holds one contiguous run of records starting at sequence 1 and
//! decides how each of them goes out on the wire:
//!
//! - skipped sequences are left out of the stream-all response but can still
//!   be fetched with a resend;
//! - corrupted sequences are sent with a zero quantity in the stream, and on
//!   resend as well when `corrupt_on_resend` is set.
//!
//! Generated prices follow a small random walk per symbol so that a run looks
//! like a real tape rather than noise.
use std::collections::{HashMap, HashSet};

use feed_common::{Frame, Record, Result, Side};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Symbols the generator picks from.
pub const SYMBOLS: [&str; 4] = ["MSFT", "AAPL", "AMZN", "META"];

const INITIAL_PRICE: i32 = 100;

/// The full record tape plus the faults to inject when serving it.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    skipped: HashSet<i32>,
    corrupted: HashSet<i32>,
    corrupt_on_resend: bool,
}

impl Dataset {
    /// Generates `count` records with sequences `1..=count`.
    pub fn generate(count: u16, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut prices: HashMap<&str, i32> =
            SYMBOLS.iter().map(|s| (*s, INITIAL_PRICE)).collect();

        let records = (1..=i32::from(count))
            .map(|sequence| {
                let symbol = SYMBOLS[rng.random_range(0..SYMBOLS.len())];
                let price = prices.entry(symbol).or_insert(INITIAL_PRICE);
                *price = next_price(&mut rng, *price);
                Record {
                    symbol: symbol.to_string(),
                    side: if rng.random_bool(0.5) { Side::Buy } else { Side::Sell },
                    quantity: rng.random_range(1..=100),
                    price: *price,
                    sequence,
                }
            })
            .collect();
        Self::from_records(records)
    }

    /// Serves exactly these records.
    pub fn from_records(records: Vec<Record>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    /// Leaves `sequences` out of the stream-all response.
    pub fn skip(mut self, sequences: impl IntoIterator<Item = i32>) -> Self {
        self.skipped.extend(sequences);
        self
    }

    /// Sends `sequences` with a zero quantity in the stream-all response.
    pub fn corrupt(mut self, sequences: impl IntoIterator<Item = i32>) -> Self {
        self.corrupted.extend(sequences);
        self
    }

    /// Also corrupts those sequences when they are resent.
    pub fn corrupt_on_resend(mut self, enabled: bool) -> Self {
        self.corrupt_on_resend = enabled;
        self
    }

    /// Number of records in the tape.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the tape holds no record.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The tape as generated, before any fault injection.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Concatenated frames of the stream-all response.
    pub fn stream_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        for record in self
            .records
            .iter()
            .filter(|r| !self.skipped.contains(&r.sequence))
        {
            let corrupt = self.corrupted.contains(&record.sequence);
            bytes.extend_from_slice(&wire_frame(record, corrupt)?);
        }
        Ok(bytes)
    }

    /// Frame answering a resend for `sequence`, if the tape has it.
    pub fn resend_frame(&self, sequence: i32) -> Result<Option<Frame>> {
        let Some(record) = self.records.iter().find(|r| r.sequence == sequence) else {
            return Ok(None);
        };
        let corrupt = self.corrupt_on_resend && self.corrupted.contains(&sequence);
        wire_frame(record, corrupt).map(Some)
    }
}

/// Small random walk around `current`, never dropping below 1.
fn next_price(rng: &mut StdRng, current: i32) -> i32 {
    let change: i32 = rng.random_range(-2..=2);
    (current + change).max(1)
}

fn wire_frame(record: &Record, corrupt: bool) -> Result<Frame> {
    if corrupt {
        let broken = Record {
            quantity: 0,
            ..record.clone()
        };
        broken.encode()
    } else {
        record.encode()
    }
}
