//! Request/response exchanges with the feed server.
//!
//! Two exchanges exist, each an explicit state machine over one connection:
//!
//! - stream-all: `Connecting -> Streaming -> Closed`. The server sends every
//!   record and closes the connection; that close is the only completion
//!   signal. Invalid frames are logged and dropped, any transport error aborts
//!   the exchange.
//! - resend: `Connecting -> AwaitingOne -> Closed`. The server answers with a
//!   single record for the requested sequence.
//!
//! Connections are held in a `ConnectionGuard`, so they are closed on every
//! exit path, including early returns through `?`.
use std::io::{ErrorKind, Read, Write};

use feed_common::request::Request;
use feed_common::{FeedError, FeedLogger, Record, RecordSet, Result, StreamFramer};

use crate::transport::{Connection, ConnectionGuard, Transport};

/// Size of the buffer each read fills.
const READ_CHUNK: usize = 4096;

enum StreamState<C: Connection> {
    Connecting,
    Streaming(ConnectionGuard<C>),
    Closed,
}

impl<C: Connection> StreamState<C> {
    fn name(&self) -> &'static str {
        match self {
            StreamState::Connecting => "Connecting",
            StreamState::Streaming(_) => "Streaming",
            StreamState::Closed => "Closed",
        }
    }
}

enum ResendState<C: Connection> {
    Connecting,
    AwaitingOne(ConnectionGuard<C>),
    Closed(Result<Record>),
}

impl<C: Connection> ResendState<C> {
    fn name(&self) -> &'static str {
        match self {
            ResendState::Connecting => "Connecting",
            ResendState::AwaitingOne(_) => "AwaitingOne",
            ResendState::Closed(_) => "Closed",
        }
    }
}

/// Drives exchanges against one feed server.
pub struct SessionClient<T: Transport, L: FeedLogger> {
    transport: T,
    logger: L,
}

impl<T: Transport, L: FeedLogger> SessionClient<T, L> {
    /// Creates a client that opens connections through `transport`.
    pub fn new(transport: T, logger: L) -> Self {
        Self { transport, logger }
    }

    /// Logger every exchange reports to.
    pub fn logger(&self) -> &L {
        &self.logger
    }

    /// Transport used for new connections.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Requests every record and collects the valid ones until the server closes.
    pub fn stream_all(&self) -> Result<RecordSet> {
        let mut framer = StreamFramer::new();
        let mut records = RecordSet::new();
        let mut dropped = 0usize;
        let mut chunk = [0u8; READ_CHUNK];
        let mut state = StreamState::Connecting;

        loop {
            self.logger.debug(&format!("stream-all: {}", state.name()));
            state = match state {
                StreamState::Connecting => {
                    let mut conn = ConnectionGuard::new(self.transport.connect()?);
                    send(&mut conn, Request::StreamAll)?;
                    StreamState::Streaming(conn)
                }
                StreamState::Streaming(mut conn) => {
                    let n = read_chunk(&mut conn, &mut chunk)?;
                    if n == 0 {
                        StreamState::Closed
                    } else {
                        framer.feed(&chunk[..n]);
                        for frame in framer.drain() {
                            match Record::decode(&frame) {
                                Ok(record) => {
                                    self.logger.info(&describe("received", &record));
                                    records.push(record);
                                }
                                Err(e) => {
                                    dropped += 1;
                                    self.logger.error(&format!("Dropping streamed frame: {}", e));
                                }
                            }
                        }
                        StreamState::Streaming(conn)
                    }
                }
                StreamState::Closed => break,
            };
        }

        if framer.buffered() > 0 {
            self.logger.error(&format!(
                "Server closed the stream mid-frame; discarding {} trailing bytes",
                framer.buffered()
            ));
        }
        self.logger.info(&format!(
            "Stream-all finished: {} records accepted, {} frames dropped",
            records.len(),
            dropped
        ));
        Ok(records)
    }

    /// Requests the single record with `sequence` over a fresh connection.
    ///
    /// Sequences that do not fit the one-byte request field fail before any
    /// connection is opened.
    pub fn resend(&self, sequence: i32) -> Result<Record> {
        let request = Request::resend(sequence)?;
        let mut framer = StreamFramer::new();
        let mut chunk = [0u8; READ_CHUNK];
        let mut state = ResendState::Connecting;

        loop {
            self.logger
                .debug(&format!("resend {}: {}", sequence, state.name()));
            state = match state {
                ResendState::Connecting => {
                    let mut conn = ConnectionGuard::new(self.transport.connect()?);
                    send(&mut conn, request)?;
                    ResendState::AwaitingOne(conn)
                }
                ResendState::AwaitingOne(mut conn) => {
                    let n = read_chunk(&mut conn, &mut chunk)?;
                    if n == 0 {
                        return Err(match framer.buffered() {
                            0 => FeedError::EmptyResponse(sequence),
                            partial => FeedError::IncompleteFrame(partial),
                        });
                    }
                    framer.feed(&chunk[..n]);
                    let first = framer.drain().next();
                    match first {
                        Some(frame) => {
                            if framer.buffered() > 0 {
                                self.logger.debug(&format!(
                                    "resend {}: ignoring {} bytes after the record",
                                    sequence,
                                    framer.buffered()
                                ));
                            }
                            ResendState::Closed(Record::decode(&frame))
                        }
                        None => ResendState::AwaitingOne(conn),
                    }
                }
                ResendState::Closed(outcome) => {
                    let record = outcome?;
                    if record.sequence != sequence {
                        return Err(FeedError::SequenceMismatch {
                            requested: sequence,
                            received: record.sequence,
                        });
                    }
                    return Ok(record);
                }
            };
        }
    }
}

/// One-line description of a record for the log.
pub(crate) fn describe(action: &str, record: &Record) -> String {
    format!(
        "{} seq {} {} {} {} @ {}",
        action, record.sequence, record.symbol, record.side, record.quantity, record.price
    )
}

fn send<W: Write>(conn: &mut W, request: Request) -> Result<()> {
    conn.write_all(&request.encode())?;
    conn.flush()?;
    Ok(())
}

fn read_chunk<R: Read>(conn: &mut R, buf: &mut [u8]) -> Result<usize> {
    loop {
        match conn.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(FeedError::Transport(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedTransport, Step, frame, invalid_frame};
    use feed_common::logger::Level;
    use feed_common::{MemoryLogger, Side, ValidationError};
    use std::io::ErrorKind;

    #[test]
    fn stream_all_reassembles_split_frames() {
        let bytes = [frame("MSFT", 1), frame("AAPL", 2), frame("AMZN", 3)].concat();
        let transport = ScriptedTransport::new().connection(vec![
            Step::Data(bytes[..5].to_vec()),
            Step::Data(bytes[5..30].to_vec()),
            Step::Data(bytes[30..].to_vec()),
        ]);
        let logger = MemoryLogger::new();
        let session = SessionClient::new(&transport, &logger);

        let records = session.stream_all().unwrap();
        let sequences: Vec<i32> = records.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
        assert_eq!(records.iter().next().unwrap().side, Side::Buy);

        assert_eq!(transport.requests(), vec![vec![0x01]]);
        assert_eq!(transport.closes(), 1);
        assert!(logger.errors().is_empty());

        let received: Vec<String> = logger
            .messages(Level::Info)
            .into_iter()
            .filter(|m| m.starts_with("received"))
            .collect();
        assert_eq!(
            received,
            vec![
                "received seq 1 MSFT Buy 10 @ 101".to_string(),
                "received seq 2 AAPL Sell 20 @ 102".to_string(),
                "received seq 3 AMZN Buy 30 @ 103".to_string(),
            ]
        );
    }

    #[test]
    fn stream_all_drops_invalid_frames_and_continues() {
        let bytes = [frame("MSFT", 1), invalid_frame(2), frame("AMZN", 3)].concat();
        let transport = ScriptedTransport::new().connection(vec![Step::Data(bytes)]);
        let logger = MemoryLogger::new();
        let session = SessionClient::new(&transport, &logger);

        let records = session.stream_all().unwrap();
        assert_eq!(records.sequences().into_iter().collect::<Vec<_>>(), vec![1, 3]);

        let errors = logger.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("wire sequence 2"), "{}", errors[0]);
    }

    #[test]
    fn stream_all_logs_trailing_partial_frame() {
        let mut bytes = frame("MSFT", 1);
        bytes.extend_from_slice(&frame("AAPL", 2)[..9]);
        let transport = ScriptedTransport::new().connection(vec![Step::Data(bytes)]);
        let logger = MemoryLogger::new();
        let session = SessionClient::new(&transport, &logger);

        assert_eq!(session.stream_all().unwrap().len(), 1);
        assert!(logger.errors()[0].contains("9 trailing bytes"));
    }

    #[test]
    fn stream_all_aborts_on_transport_error() {
        let transport = ScriptedTransport::new().connection(vec![
            Step::Data(frame("MSFT", 1)),
            Step::Fail(ErrorKind::ConnectionReset),
            Step::Data(frame("AAPL", 2)),
        ]);
        let session = SessionClient::new(&transport, MemoryLogger::new());

        let err = session.stream_all().unwrap_err();
        assert!(matches!(&err, FeedError::Transport(e) if e.kind() == ErrorKind::ConnectionReset));
        assert_eq!(transport.closes(), 1);
    }

    #[test]
    fn stream_all_treats_timeout_as_transport_error() {
        let transport =
            ScriptedTransport::new().connection(vec![Step::Fail(ErrorKind::WouldBlock)]);
        let session = SessionClient::new(&transport, MemoryLogger::new());
        assert!(session.stream_all().unwrap_err().is_transport());
    }

    #[test]
    fn stream_all_reports_connect_failure() {
        let transport = ScriptedTransport::new();
        let session = SessionClient::new(&transport, MemoryLogger::new());
        assert!(matches!(session.stream_all(), Err(FeedError::Transport(_))));
    }

    #[test]
    fn stream_all_retries_interrupted_reads() {
        let transport = ScriptedTransport::new().connection(vec![
            Step::Fail(ErrorKind::Interrupted),
            Step::Data(frame("MSFT", 1)),
        ]);
        let session = SessionClient::new(&transport, MemoryLogger::new());
        assert_eq!(session.stream_all().unwrap().len(), 1);
    }

    #[test]
    fn resend_returns_one_record_and_closes() {
        let transport =
            ScriptedTransport::new().connection(vec![Step::Data(frame("META", 3))]);
        let session = SessionClient::new(&transport, MemoryLogger::new());

        let record = session.resend(3).unwrap();
        assert_eq!(record.symbol, "META");
        assert_eq!(record.sequence, 3);
        assert_eq!(transport.requests(), vec![vec![0x02, 0x03]]);
        assert_eq!(transport.closes(), 1);
    }

    #[test]
    fn resend_waits_for_a_split_record() {
        let bytes = frame("META", 7);
        let transport = ScriptedTransport::new().connection(vec![
            Step::Data(bytes[..4].to_vec()),
            Step::Data(bytes[4..].to_vec()),
        ]);
        let session = SessionClient::new(&transport, MemoryLogger::new());
        assert_eq!(session.resend(7).unwrap().sequence, 7);
    }

    #[test]
    fn resend_fails_when_server_sends_nothing() {
        let transport = ScriptedTransport::new().connection(vec![]);
        let session = SessionClient::new(&transport, MemoryLogger::new());
        assert!(matches!(session.resend(4), Err(FeedError::EmptyResponse(4))));
        assert_eq!(transport.closes(), 1);
    }

    #[test]
    fn resend_fails_on_truncated_record() {
        let transport =
            ScriptedTransport::new().connection(vec![Step::Data(frame("META", 4)[..10].to_vec())]);
        let session = SessionClient::new(&transport, MemoryLogger::new());
        assert!(matches!(session.resend(4), Err(FeedError::IncompleteFrame(10))));
    }

    #[test]
    fn resend_rejects_invalid_record() {
        let transport = ScriptedTransport::new().connection(vec![Step::Data(invalid_frame(2))]);
        let session = SessionClient::new(&transport, MemoryLogger::new());

        let err = session.resend(2).unwrap_err();
        assert_eq!(err.validation(), Some(&ValidationError::InvalidQuantity(0)));
        assert_eq!(transport.closes(), 1);
    }

    #[test]
    fn resend_rejects_record_for_another_sequence() {
        let transport = ScriptedTransport::new().connection(vec![Step::Data(frame("META", 9))]);
        let session = SessionClient::new(&transport, MemoryLogger::new());
        assert!(matches!(
            session.resend(5),
            Err(FeedError::SequenceMismatch { requested: 5, received: 9 })
        ));
    }

    #[test]
    fn resend_out_of_range_never_connects() {
        let transport = ScriptedTransport::new().connection(vec![Step::Data(frame("META", 1))]);
        let session = SessionClient::new(&transport, MemoryLogger::new());

        assert!(matches!(session.resend(256), Err(FeedError::ResendOutOfRange(256))));
        assert_eq!(transport.connects(), 0);
    }

    #[test]
    fn resend_surfaces_read_errors() {
        let transport =
            ScriptedTransport::new().connection(vec![Step::Fail(ErrorKind::TimedOut)]);
        let session = SessionClient::new(&transport, MemoryLogger::new());
        assert!(session.resend(1).unwrap_err().is_transport());
        assert_eq!(transport.closes(), 1);
    }
}
