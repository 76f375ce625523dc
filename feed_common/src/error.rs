//! Error types shared between the feed client and the reference server.
//!
//! `FeedError` unifies framing, validation, transport and encoding failures so
//! every crate in the workspace can propagate a single error type. Field-level
//! validation failures are described by the nested `ValidationError`.
use std::io;

use thiserror::Error;

/// A single field of a wire record that is outside its contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Symbol is not 1-4 uppercase ASCII letters after trimming trailing fill.
    #[error("invalid symbol {0:?}")]
    InvalidSymbol(String),

    /// Side byte is neither `B` nor `S`.
    #[error("invalid side byte 0x{0:02x}")]
    InvalidSide(u8),

    /// Quantity is zero or negative.
    #[error("quantity must be positive, got {0}")]
    InvalidQuantity(i32),

    /// Price is zero or negative.
    #[error("price must be positive, got {0}")]
    InvalidPrice(i32),

    /// Sequence number is zero or negative.
    #[error("sequence must be positive, got {0}")]
    InvalidSequence(i32),
}

/// Unified error type shared by client and server.
#[derive(Error, Debug)]
pub enum FeedError {
    /// A frame handed to the codec is not exactly one record long.
    #[error("Framing error: expected {expected} bytes, got {actual}")]
    InvalidFrameLength {
        /// Required frame length.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// The peer closed the connection in the middle of a frame.
    #[error("Framing error: connection closed with {0} bytes of an incomplete frame")]
    IncompleteFrame(usize),

    /// A decoded record failed field validation.
    #[error("Record {symbol:?} (wire sequence {sequence}) rejected: {source}")]
    InvalidRecord {
        /// Symbol bytes as received, lossily converted for diagnostics.
        symbol: String,
        /// Sequence field as received, even when it is itself invalid.
        sequence: i32,
        /// The first failing field check.
        #[source]
        source: ValidationError,
    },

    /// A resend response carried a different sequence than the one requested.
    #[error("Resend for sequence {requested} answered with sequence {received}")]
    SequenceMismatch {
        /// Sequence sent in the resend request.
        requested: i32,
        /// Sequence found in the returned record.
        received: i32,
    },

    /// Connect, read or write failure, including timeouts.
    #[error("Transport error: {0}")]
    Transport(#[from] io::Error),

    /// The server closed a resend connection without sending any data.
    #[error("Server closed the connection without a record for sequence {0}")]
    EmptyResponse(i32),

    /// A resend target does not fit the one-byte sequence field of the request.
    #[error("Sequence {0} cannot be encoded in a resend request (supported range 0..=255)")]
    ResendOutOfRange(i32),

    /// A request carried an unknown leading tag byte.
    #[error("Unknown request tag 0x{0:02x}")]
    UnknownRequest(u8),

    /// The process-wide Ctrl+C handler could not be installed.
    #[error("Signal handler error: {0}")]
    SignalHandler(String),

    /// Gap detection was attempted without any received records.
    #[error("No records received: the sequence set is empty")]
    EmptySequenceSet,

    /// Failure while decoding the wire layout with `bincode`.
    #[error("Bincode deserialization error: {0}")]
    BincodeDecode(#[from] bincode::error::DecodeError),

    /// Failure while encoding the wire layout with `bincode`.
    #[error("Bincode serialization error: {0}")]
    BincodeEncode(#[from] bincode::error::EncodeError),

    /// Failure while writing records as JSON.
    #[error("JSON serialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl FeedError {
    /// Returns the failing field check when this is a validation error.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            FeedError::InvalidRecord { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Returns `true` for errors raised by the connection itself.
    pub fn is_transport(&self) -> bool {
        matches!(self, FeedError::Transport(_) | FeedError::EmptyResponse(_))
    }
}
