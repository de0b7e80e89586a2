//! UDP data source.
//!
//! A background task owns the socket and forwards every datagram over an
//! mpsc channel; `poll()` drains that channel without blocking.

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::{DataSource, Datagram};

/// Largest payload a UDP datagram can carry.
const MAX_DATAGRAM: usize = 65_535;

/// Datagrams buffered between the receive task and the event loop.
const QUEUE_DEPTH: usize = 1024;

/// Pause after a receive error so a persistent failure cannot spin the task.
const ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// A data source listening on a UDP socket.
///
/// # Example
///
/// ```
/// use nodewatch::{DataSource, UdpSource};
///
/// # tokio_test::block_on(async {
/// let mut source = UdpSource::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
/// assert!(source.description().starts_with("udp: 127.0.0.1:"));
/// assert!(source.poll().is_none());
/// # });
/// ```
#[derive(Debug)]
pub struct UdpSource {
    receiver: mpsc::Receiver<Datagram>,
    local_addr: SocketAddr,
    description: String,
    shared_error: Arc<Mutex<Option<String>>>,
    error: Option<String>,
}

impl UdpSource {
    /// Bind `addr` and start receiving. Must be called inside a tokio runtime.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Self::spawn(socket)
    }

    /// Start the receive task on an already bound socket.
    pub fn spawn(socket: UdpSocket) -> io::Result<Self> {
        let local_addr = socket.local_addr()?;
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let shared_error = Arc::new(Mutex::new(None));
        let error_handle = shared_error.clone();

        info!(%local_addr, "listening for telemetry");

        tokio::spawn(async move {
            let mut buf = vec![0u8; MAX_DATAGRAM];
            loop {
                match socket.recv_from(&mut buf).await {
                    Ok((len, from)) => {
                        set_error(&error_handle, None);
                        let datagram = Datagram::new(buf[..len].to_vec(), Some(from));
                        if tx.send(datagram).await.is_err() {
                            debug!("datagram receiver dropped, stopping receive task");
                            break;
                        }
                    }
                    Err(e) => receive_failed(&error_handle, &e).await,
                }
            }
        });

        Ok(Self {
            receiver: rx,
            local_addr,
            description: format!("udp: {}", local_addr),
            shared_error,
            error: None,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

fn set_error(slot: &Mutex<Option<String>>, value: Option<String>) {
    *slot.lock().unwrap_or_else(|e| e.into_inner()) = value;
}

/// Record a receive error and wait before the next attempt.
async fn receive_failed(slot: &Mutex<Option<String>>, e: &io::Error) {
    error!(error = %e, "udp receive failed");
    set_error(slot, Some(format!("receive error: {}", e)));
    tokio::time::sleep(ERROR_BACKOFF).await;
}

impl DataSource for UdpSource {
    fn poll(&mut self) -> Option<Datagram> {
        self.error = self
            .shared_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        match self.receiver.try_recv() {
            Ok(datagram) => Some(datagram),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.error = Some("receive task stopped".to_string());
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
