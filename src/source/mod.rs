//! Datagram sources feeding the monitor.
//!
//! A source only moves raw bytes; decoding happens on the event loop that
//! owns the [`Monitor`](crate::data::Monitor).

mod channel;
mod udp;

pub use channel::ChannelSource;
pub use udp::UdpSource;

use std::fmt::Debug;
use std::net::SocketAddr;

/// One received datagram and the address it came from, if known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub bytes: Vec<u8>,
    pub from: Option<SocketAddr>,
}

impl Datagram {
    pub fn new(bytes: Vec<u8>, from: Option<SocketAddr>) -> Self {
        Self { bytes, from }
    }
}

/// Trait for receiving telemetry datagrams from various sources.
///
/// # Example
///
/// ```
/// use nodewatch::{ChannelSource, DataSource};
///
/// let (_tx, mut source) = ChannelSource::create("test");
/// assert!(source.poll().is_none());
/// ```
pub trait DataSource: Send + Debug {
    /// Take the next pending datagram.
    ///
    /// Returns `None` when nothing is queued. Never blocks.
    fn poll(&mut self) -> Option<Datagram>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// The most recent receive error, if the source is currently failing.
    fn error(&self) -> Option<&str>;
}
