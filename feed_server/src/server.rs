//! TCP front end of the reference feed server.
//!
//! An acceptor thread pushes every accepted connection into a channel; the
//! main loop `select!`s over that channel and a shutdown channel, and hands
//! each connection to its own handler thread. A failing client is logged and
//! dropped without affecting the others.
//!
//! On shutdown the acceptor is woken with a loopback connection and joined,
//! so the listening socket is closed once `run` returns.
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded, select, unbounded};
use feed_common::{FeedError, Result};
use log::{debug, error, info, warn};

use crate::dataset::Dataset;
use crate::handler::serve;

/// Default size of the pieces a stream-all response is written in.
pub const DEFAULT_CHUNK_SIZE: usize = 64;

/// Listening feed server bound to a local address.
pub struct FeedServer {
    listener: TcpListener,
    dataset: Arc<Dataset>,
    chunk_size: usize,
}

impl FeedServer {
    /// Binds `bind_addr` (e.g. `0.0.0.0:3000`) for serving `dataset`.
    pub fn bind(bind_addr: &str, dataset: Dataset) -> Result<Self> {
        let listener = TcpListener::bind(bind_addr)?;
        Ok(Self {
            listener,
            dataset: Arc::new(dataset),
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    /// Writes stream-all responses in pieces of `chunk_size` bytes.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Address the server is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves connections until a message arrives on `shutdown`.
    pub fn run(self, shutdown: Receiver<()>) -> Result<()> {
        let local = self.local_addr()?;
        info!("Feed server is started on {}", local);
        let (conn_tx, conn_rx) = unbounded::<TcpStream>();
        let listener = self.listener;
        let acceptor = thread::spawn(move || accept_loop(listener, conn_tx));

        loop {
            select! {
                recv(shutdown) -> _ => {
                    info!("Feed server stopping...");
                    break;
                },
                recv(conn_rx) -> msg => match msg {
                    Ok(stream) => {
                        let dataset = Arc::clone(&self.dataset);
                        let chunk_size = self.chunk_size;
                        thread::spawn(move || handle_client(stream, &dataset, chunk_size));
                    }
                    Err(e) => {
                        error!("Acceptor stopped: {}", e);
                        break;
                    }
                },
            }
        }

        // The acceptor exits on its next accept once the receiver is gone.
        drop(conn_rx);
        match TcpStream::connect(wake_addr(local)) {
            Ok(_) => {
                if acceptor.join().is_err() {
                    error!("Acceptor thread panicked");
                }
            }
            Err(e) => warn!("Could not wake the acceptor on {}: {}", local, e),
        }
        info!("Feed server stopped");
        Ok(())
    }

    /// Runs the server on a background thread.
    pub fn spawn(self) -> Result<ServerHandle> {
        let addr = self.local_addr()?;
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let thread = thread::spawn(move || {
            if let Err(e) = self.run(shutdown_rx) {
                error!("Feed server failed: {}", e);
            }
        });
        Ok(ServerHandle {
            addr,
            shutdown: shutdown_tx,
            thread: Some(thread),
        })
    }
}

/// Installs a Ctrl+C handler that sends on the returned shutdown channel.
///
/// Only one handler can exist per process; a second call fails with
/// `SignalHandler`.
pub fn shutdown_on_ctrlc() -> Result<Receiver<()>> {
    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        info!("Ctrl+C received. Shutting down server...");
        let _ = shutdown_tx.try_send(());
    })
    .map_err(|e| FeedError::SignalHandler(e.to_string()))?;
    Ok(shutdown_rx)
}

/// Handle to a server started with [`FeedServer::spawn`].
///
/// Dropping it stops the server and waits until the listener is closed.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// Address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.try_send(());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Feed server thread panicked");
            }
        }
    }
}

/// Loopback address reaching a listener bound to `addr`.
fn wake_addr(mut addr: SocketAddr) -> SocketAddr {
    if addr.ip().is_unspecified() {
        match addr {
            SocketAddr::V4(_) => addr.set_ip(Ipv4Addr::LOCALHOST.into()),
            SocketAddr::V6(_) => addr.set_ip(Ipv6Addr::LOCALHOST.into()),
        }
    }
    addr
}

fn accept_loop(listener: TcpListener, tx: Sender<TcpStream>) {
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                if tx.send(stream).is_err() {
                    break;
                }
            }
            Err(e) => error!("TCP connection error: {}", e),
        }
    }
}

fn handle_client(mut stream: TcpStream, dataset: &Dataset, chunk_size: usize) {
    let peer = stream
        .peer_addr()
        .map_or_else(|_| "unknown peer".to_string(), |a| a.to_string());
    match serve(&mut stream, dataset, chunk_size) {
        Ok(request) => debug!("Served {:?} for {}", request, peer),
        Err(e) => error!("Client {} failed: {}", peer, e),
    }
    if let Err(e) = stream.shutdown(Shutdown::Both) {
        if e.kind() != io::ErrorKind::NotConnected {
            debug!("Closing connection to {} failed: {}", peer, e);
        }
    }
}
