//! Per-connection request handling.
use std::io::{Read, Write};

use feed_common::request::Request;
use feed_common::Result;
use log::{info, warn};

use crate::dataset::Dataset;

/// Reads one request from `stream` and writes the matching response.
///
/// The stream-all response is written in pieces of `chunk_size` bytes, each
/// flushed on its own, so clients see records split across reads. The caller
/// closes the connection afterwards, which ends the stream-all response.
pub fn serve<S: Read + Write>(stream: &mut S, dataset: &Dataset, chunk_size: usize) -> Result<Request> {
    let request = Request::read_from(stream)?;
    match request {
        Request::StreamAll => {
            let bytes = dataset.stream_bytes()?;
            for piece in bytes.chunks(chunk_size.max(1)) {
                stream.write_all(piece)?;
                stream.flush()?;
            }
            info!("Streamed {} bytes of records", bytes.len());
        }
        Request::Resend(sequence) => match dataset.resend_frame(i32::from(sequence))? {
            Some(frame) => {
                stream.write_all(&frame)?;
                stream.flush()?;
                info!("Resent sequence {}", sequence);
            }
            None => warn!("Resend requested for unknown sequence {}", sequence),
        },
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_common::{FeedError, FRAME_LEN, Record};
    use std::io::{self, Cursor};

    /// Reads from a fixed input and records every write as a separate piece.
    struct MockStream {
        input: Cursor<Vec<u8>>,
        writes: Vec<Vec<u8>>,
    }

    impl MockStream {
        fn new(input: Vec<u8>) -> Self {
            Self {
                input: Cursor::new(input),
                writes: Vec::new(),
            }
        }

        fn output(&self) -> Vec<u8> {
            self.writes.concat()
        }
    }

    impl Read for MockStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for MockStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes.push(buf.to_vec());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn stream_all_writes_every_record_in_chunks() {
        let dataset = Dataset::generate(4, 3);
        let mut stream = MockStream::new(Request::StreamAll.encode());

        let request = serve(&mut stream, &dataset, 10).unwrap();
        assert_eq!(request, Request::StreamAll);
        assert_eq!(stream.output().len(), 4 * FRAME_LEN);
        assert!(stream.writes.iter().all(|w| w.len() <= 10));
        assert_eq!(stream.writes.len(), (4 * FRAME_LEN).div_ceil(10));
    }

    #[test]
    fn resend_writes_one_frame() {
        let dataset = Dataset::generate(4, 3);
        let mut stream = MockStream::new(Request::Resend(3).encode());

        serve(&mut stream, &dataset, 64).unwrap();
        let record = Record::decode(&stream.output()).unwrap();
        assert_eq!(record, dataset.records()[2]);
    }

    #[test]
    fn resend_of_unknown_sequence_writes_nothing() {
        let dataset = Dataset::generate(4, 3);
        let mut stream = MockStream::new(Request::Resend(200).encode());

        serve(&mut stream, &dataset, 64).unwrap();
        assert!(stream.output().is_empty());
    }

    #[test]
    fn unknown_request_is_an_error() {
        let dataset = Dataset::generate(1, 3);
        let mut stream = MockStream::new(vec![0x09]);
        assert!(matches!(
            serve(&mut stream, &dataset, 64),
            Err(FeedError::UnknownRequest(0x09))
        ));
    }
}
