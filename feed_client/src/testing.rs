//! Scripted in-memory transport for exercising the exchanges.
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::rc::Rc;

use feed_common::{Record, Side};

use crate::transport::{Connection, Transport};

/// One read outcome of a scripted connection.
pub(crate) enum Step {
    /// Bytes returned by the next read(s).
    Data(Vec<u8>),
    /// The next read fails with this kind.
    Fail(ErrorKind),
}

#[derive(Default)]
struct Wire {
    requests: RefCell<Vec<Vec<u8>>>,
    connects: Cell<usize>,
    closes: Cell<usize>,
}

/// Hands out pre-scripted connections in order, refusing once they run out.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    scripts: RefCell<VecDeque<Vec<Step>>>,
    wire: Rc<Wire>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queues a connection whose reads follow `steps`, then report close.
    pub(crate) fn connection(self, steps: Vec<Step>) -> Self {
        self.scripts.borrow_mut().push_back(steps);
        self
    }

    /// Bytes written on each opened connection, in connection order.
    pub(crate) fn requests(&self) -> Vec<Vec<u8>> {
        self.wire.requests.borrow().clone()
    }

    pub(crate) fn connects(&self) -> usize {
        self.wire.connects.get()
    }

    pub(crate) fn closes(&self) -> usize {
        self.wire.closes.get()
    }
}

impl Transport for ScriptedTransport {
    type Conn = ScriptedConnection;

    fn connect(&self) -> io::Result<ScriptedConnection> {
        let steps = self
            .scripts
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| io::Error::from(ErrorKind::ConnectionRefused))?;
        let index = self.wire.connects.get();
        self.wire.connects.set(index + 1);
        self.wire.requests.borrow_mut().push(Vec::new());
        Ok(ScriptedConnection {
            steps: steps.into(),
            index,
            wire: Rc::clone(&self.wire),
        })
    }
}

pub(crate) struct ScriptedConnection {
    steps: VecDeque<Step>,
    index: usize,
    wire: Rc<Wire>,
}

impl Read for ScriptedConnection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.steps.pop_front() {
            None => Ok(0),
            Some(Step::Fail(kind)) => Err(io::Error::from(kind)),
            Some(Step::Data(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    self.steps.push_front(Step::Data(bytes.split_off(n)));
                }
                Ok(n)
            }
        }
    }
}

impl Write for ScriptedConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.wire.requests.borrow_mut()[self.index].extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Connection for ScriptedConnection {
    fn close(&mut self) -> io::Result<()> {
        self.wire.closes.set(self.wire.closes.get() + 1);
        Ok(())
    }
}

/// Valid wire frame for `symbol` at `sequence`.
pub(crate) fn frame(symbol: &str, sequence: i32) -> Vec<u8> {
    let record = Record {
        symbol: symbol.to_string(),
        side: if sequence % 2 == 1 { Side::Buy } else { Side::Sell },
        quantity: 10 * sequence,
        price: 100 + sequence,
        sequence,
    };
    record.encode().unwrap().to_vec()
}

/// Wire frame for `sequence` whose quantity is zero.
pub(crate) fn invalid_frame(sequence: i32) -> Vec<u8> {
    let record = Record {
        symbol: "AAPL".to_string(),
        side: Side::Buy,
        quantity: 0,
        price: 100,
        sequence,
    };
    record.encode().unwrap().to_vec()
}
