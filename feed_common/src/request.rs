//! Client requests understood by the feed server.
//!
//! Requests are raw bytes without a length prefix; the leading tag byte tells
//! the server which shape follows:
//!
//! - stream-all: `[0x01]`
//! - resend: `[0x02, sequence]`, the sequence as one unsigned byte
//!
//! The resend field caps requestable sequences at 255 even though records
//! carry a 32-bit sequence. Larger values are refused instead of truncated.
use std::io::Read;

use crate::error::FeedError;
use crate::result::Result;

/// Tag byte of a stream-all request.
pub const STREAM_ALL_TAG: u8 = 1;
/// Tag byte of a resend request.
pub const RESEND_TAG: u8 = 2;
/// Largest sequence a resend request can carry.
pub const MAX_RESEND_SEQUENCE: i32 = u8::MAX as i32;

/// A request sent from client to server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Ask for every available record; the server closes when done.
    StreamAll,
    /// Ask for the single record with this sequence number.
    Resend(u8),
}

impl Request {
    /// Builds a resend request, failing if `sequence` does not fit the wire field.
    pub fn resend(sequence: i32) -> Result<Self> {
        u8::try_from(sequence)
            .map(Request::Resend)
            .map_err(|_| FeedError::ResendOutOfRange(sequence))
    }

    /// Wire form of the request.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Request::StreamAll => vec![STREAM_ALL_TAG],
            Request::Resend(sequence) => vec![RESEND_TAG, *sequence],
        }
    }

    /// Reads exactly one request from `reader`.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut tag = [0u8; 1];
        reader.read_exact(&mut tag)?;
        match tag[0] {
            STREAM_ALL_TAG => Ok(Request::StreamAll),
            RESEND_TAG => {
                let mut sequence = [0u8; 1];
                reader.read_exact(&mut sequence)?;
                Ok(Request::Resend(sequence[0]))
            }
            other => Err(FeedError::UnknownRequest(other)),
        }
    }
}
