//! Market-data record and its fixed-width wire codec.
//!
//! Every record travels as a 17-byte frame with big-endian integers:
//!
//! | offset | len | field    | encoding                        |
//! |--------|-----|----------|---------------------------------|
//! | 0      | 4   | symbol   | ASCII letters, trailing padding |
//! | 4      | 1   | side     | ASCII `B` / `S`                 |
//! | 5      | 4   | quantity | i32 BE                          |
//! | 9      | 4   | price    | i32 BE                          |
//! | 13     | 4   | sequence | i32 BE                          |
//!
//! The byte layout is described by `WireRecord` and laid out with `bincode`
//! in its big-endian fixed-int configuration, which writes fixed arrays and
//! integers without any length prefixes. Field contracts are checked after
//! the raw layout is read.
use std::collections::BTreeSet;

use bincode::config::{self, Config};
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{FeedError, ValidationError};
use crate::result::Result;

/// Size of one wire record in bytes.
pub const FRAME_LEN: usize = 17;

/// Maximum number of symbol characters.
pub const SYMBOL_LEN: usize = 4;

/// One complete wire record.
pub type Frame = [u8; FRAME_LEN];

const SIDE_BUY: u8 = b'B';
const SIDE_SELL: u8 = b'S';
const SYMBOL_FILL: u8 = b' ';

/// Trade direction of a record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Side {
    /// Buy-side update (`B` on the wire).
    #[strum(to_string = "Buy", serialize = "B")]
    Buy,
    /// Sell-side update (`S` on the wire).
    #[strum(to_string = "Sell", serialize = "S")]
    Sell,
}

impl Side {
    /// Wire indicator byte for this side.
    pub fn as_byte(self) -> u8 {
        match self {
            Side::Buy => SIDE_BUY,
            Side::Sell => SIDE_SELL,
        }
    }

    /// Parses a wire indicator byte.
    pub fn from_byte(byte: u8) -> std::result::Result<Self, ValidationError> {
        match byte {
            SIDE_BUY => Ok(Side::Buy),
            SIDE_SELL => Ok(Side::Sell),
            other => Err(ValidationError::InvalidSide(other)),
        }
    }
}

/// A single validated market-data update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Instrument symbol, 1-4 uppercase ASCII letters.
    pub symbol: String,
    /// Buy or sell.
    pub side: Side,
    /// Quantity, strictly positive.
    pub quantity: i32,
    /// Price, strictly positive.
    pub price: i32,
    /// Feed sequence number, strictly positive. The ordering key.
    pub sequence: i32,
}

/// Raw byte layout of a frame before any field checks.
#[derive(Debug, Encode, Decode)]
struct WireRecord {
    symbol: [u8; SYMBOL_LEN],
    side: u8,
    quantity: i32,
    price: i32,
    sequence: i32,
}

fn wire_config() -> impl Config {
    config::standard()
        .with_big_endian()
        .with_fixed_int_encoding()
}

impl Record {
    /// Decodes and validates one frame.
    ///
    /// Checks run in a fixed order and the first failure is reported: frame
    /// length, symbol, side, quantity, price, sequence.
    pub fn decode(bytes: &[u8]) -> Result<Record> {
        if bytes.len() != FRAME_LEN {
            return Err(FeedError::InvalidFrameLength {
                expected: FRAME_LEN,
                actual: bytes.len(),
            });
        }
        let (wire, _): (WireRecord, usize) = bincode::decode_from_slice(bytes, wire_config())?;
        wire.validate()
    }

    /// Encodes the record into a frame, padding short symbols with spaces.
    ///
    /// Field contracts are not enforced here so that deliberately invalid
    /// frames can be produced; only a symbol that does not fit the field fails.
    pub fn encode(&self) -> Result<Frame> {
        let raw = self.symbol.as_bytes();
        if raw.len() > SYMBOL_LEN {
            return Err(FeedError::InvalidRecord {
                symbol: self.symbol.clone(),
                sequence: self.sequence,
                source: ValidationError::InvalidSymbol(self.symbol.clone()),
            });
        }
        let mut symbol = [SYMBOL_FILL; SYMBOL_LEN];
        symbol[..raw.len()].copy_from_slice(raw);

        let wire = WireRecord {
            symbol,
            side: self.side.as_byte(),
            quantity: self.quantity,
            price: self.price,
            sequence: self.sequence,
        };
        let mut frame = [0u8; FRAME_LEN];
        bincode::encode_into_slice(wire, &mut frame, wire_config())?;
        Ok(frame)
    }
}

impl WireRecord {
    fn validate(self) -> Result<Record> {
        let reject = |source: ValidationError| FeedError::InvalidRecord {
            symbol: String::from_utf8_lossy(&self.symbol).into_owned(),
            sequence: self.sequence,
            source,
        };

        let symbol = parse_symbol(&self.symbol).map_err(reject)?;
        let side = Side::from_byte(self.side).map_err(reject)?;
        if self.quantity <= 0 {
            return Err(reject(ValidationError::InvalidQuantity(self.quantity)));
        }
        if self.price <= 0 {
            return Err(reject(ValidationError::InvalidPrice(self.price)));
        }
        if self.sequence <= 0 {
            return Err(reject(ValidationError::InvalidSequence(self.sequence)));
        }

        Ok(Record {
            symbol,
            side,
            quantity: self.quantity,
            price: self.price,
            sequence: self.sequence,
        })
    }
}

/// Trims trailing NUL/space fill and checks for `[A-Z]{1,4}`.
fn parse_symbol(raw: &[u8; SYMBOL_LEN]) -> std::result::Result<String, ValidationError> {
    let end = raw
        .iter()
        .rposition(|b| *b != 0 && *b != SYMBOL_FILL)
        .map_or(0, |i| i + 1);
    let trimmed = &raw[..end];

    if trimmed.is_empty() || !trimmed.iter().all(u8::is_ascii_uppercase) {
        return Err(ValidationError::InvalidSymbol(
            String::from_utf8_lossy(raw).into_owned(),
        ));
    }
    // All bytes are ASCII uppercase letters at this point.
    Ok(trimmed.iter().map(|b| char::from(*b)).collect())
}

/// Validated records collected during one run, in arrival order.
#[derive(Debug, Default, Clone)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a validated record.
    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no record has been collected.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates records in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Sequence numbers present in the set.
    pub fn sequences(&self) -> BTreeSet<i32> {
        self.records.iter().map(|r| r.sequence).collect()
    }

    /// Consumes the set and returns the records sorted ascending by sequence.
    pub fn into_sorted(mut self) -> Vec<Record> {
        self.records.sort_by_key(|r| r.sequence);
        self.records
    }
}

impl FromIterator<Record> for RecordSet {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
