//!
//! Common types and utilities shared by the feed client and the reference server.
//!
//! This crate aggregates:
//! - `error` — unified error type `FeedError` used across the workspace.
//! - `result` — handy `Result<T, FeedError>` alias.
//! - `record` — the 17-byte wire record and its codec.
//! - `framer` — reassembly of records from an arbitrary byte stream.
//! - `request` — the stream-all and resend request messages.
//! - `gaps` — detection of missing sequence numbers.
//! - `logger` — the injectable logging collaborator.
//! - `net` — networking constants and small helpers.
#![warn(missing_docs)]
pub mod error;
pub mod framer;
pub mod gaps;
pub mod logger;
pub mod net;
pub mod record;
pub mod request;
pub mod result;

pub use error::{FeedError, ValidationError};
pub use framer::StreamFramer;
pub use logger::{FeedLogger, LogSink, MemoryLogger};
pub use record::{FRAME_LEN, Frame, Record, RecordSet, Side};
pub use request::Request;
pub use result::Result;
