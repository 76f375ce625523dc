//! Byte-stream transport used by the session client.
//!
//! The session only needs to open a connection, write a request, read chunks
//! until the peer closes, and close its own side. `Transport` and
//! `Connection` capture exactly that, so the exchanges can run over TCP in
//! production and over scripted in-memory connections in tests.
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::debug;

use crate::config::ClientConfig;

/// A bidirectional byte stream that can be closed explicitly.
pub trait Connection: Read + Write {
    /// Closes both directions of the stream.
    fn close(&mut self) -> io::Result<()>;
}

/// Factory for fresh connections to the feed server.
pub trait Transport {
    /// Connection type produced by this transport.
    type Conn: Connection;

    /// Opens a new connection.
    fn connect(&self) -> io::Result<Self::Conn>;
}

impl<T: Transport + ?Sized> Transport for &T {
    type Conn = T::Conn;

    fn connect(&self) -> io::Result<Self::Conn> {
        (**self).connect()
    }
}

impl Connection for TcpStream {
    fn close(&mut self) -> io::Result<()> {
        match self.shutdown(Shutdown::Both) {
            Err(e) if e.kind() == ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

/// TCP transport with optional per-connection timeouts.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    address: String,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl TcpTransport {
    /// Builds a transport for the server described by `config`.
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            address: config.address(),
            connect_timeout: config.connect_timeout,
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
        }
    }

    /// Address this transport connects to.
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Transport for TcpTransport {
    type Conn = TcpStream;

    fn connect(&self) -> io::Result<TcpStream> {
        let stream = match self.connect_timeout {
            Some(timeout) => {
                let addr = self.address.to_socket_addrs()?.next().ok_or_else(|| {
                    io::Error::new(
                        ErrorKind::InvalidInput,
                        format!("{} did not resolve to any address", self.address),
                    )
                })?;
                TcpStream::connect_timeout(&addr, timeout)?
            }
            None => TcpStream::connect(&self.address)?,
        };
        stream.set_read_timeout(self.read_timeout)?;
        stream.set_write_timeout(self.write_timeout)?;
        stream.set_nodelay(true)?;
        debug!("Connected to {} from {}", self.address, stream.local_addr()?);
        Ok(stream)
    }
}

/// Owns a connection for the length of one exchange and closes it on drop.
pub struct ConnectionGuard<C: Connection> {
    conn: C,
}

impl<C: Connection> ConnectionGuard<C> {
    /// Takes ownership of an open connection.
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

impl<C: Connection> Read for ConnectionGuard<C> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.conn.read(buf)
    }
}

impl<C: Connection> Write for ConnectionGuard<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.conn.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.conn.flush()
    }
}

impl<C: Connection> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        if let Err(e) = self.conn.close() {
            debug!("Closing connection failed: {}", e);
        }
    }
}
