//! Reference feed server.
//!
//! Serves a generated record tape over the feed wire protocol so the client can
//! be run and tested locally:
//!
//! - `dataset` — the record tape and the faults injected when serving it.
//! - `handler` — answers one stream-all or resend request on a connection.
//! - `server` — TCP listener, acceptor thread and per-client handler threads.
#![warn(missing_docs)]
pub mod dataset;
pub mod handler;
pub mod server;

pub use dataset::Dataset;
pub use server::{FeedServer, ServerHandle, shutdown_on_ctrlc};
