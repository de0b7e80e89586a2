//! Channel-based data source.
//!
//! Receives datagrams pushed through a tokio mpsc channel. Useful when the
//! dashboard is embedded in a process that already has the bytes, and in
//! tests.

use tokio::sync::mpsc;

use super::{DataSource, Datagram};

/// Queue depth of the channel created by [`ChannelSource::create`].
const CHANNEL_DEPTH: usize = 1024;

/// A data source fed by an in-process channel.
///
/// # Example
///
/// ```
/// use nodewatch::ChannelSource;
///
/// let (tx, source) = ChannelSource::create("replay");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<Datagram>,
    description: String,
    error: Option<String>,
}

impl ChannelSource {
    pub fn new(receiver: mpsc::Receiver<Datagram>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            error: None,
        }
    }

    /// Create a channel pair; datagrams sent on the returned sender come out
    /// of [`DataSource::poll`].
    pub fn create(source_description: &str) -> (mpsc::Sender<Datagram>, Self) {
        let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
        (tx, Self::new(rx, source_description))
    }
}

impl DataSource for ChannelSource {
    fn poll(&mut self) -> Option<Datagram> {
        match self.receiver.try_recv() {
            Ok(datagram) => Some(datagram),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.error.get_or_insert_with(|| "channel closed".to_string());
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_source_poll() {
        let (tx, mut source) = ChannelSource::create("test");
        assert!(source.poll().is_none());

        tx.try_send(Datagram::new(vec![1, 2, 3], None)).unwrap();
        tx.try_send(Datagram::new(vec![4], None)).unwrap();

        assert_eq!(source.poll().unwrap().bytes, vec![1, 2, 3]);
        assert_eq!(source.poll().unwrap().bytes, vec![4]);
        assert!(source.poll().is_none());
        assert!(source.error().is_none());
    }

    #[test]
    fn test_channel_source_reports_closed_sender() {
        let (tx, mut source) = ChannelSource::create("test");
        tx.try_send(Datagram::new(vec![9], None)).unwrap();
        drop(tx);

        // Queued datagrams drain before the close is reported.
        assert!(source.poll().is_some());
        assert!(source.poll().is_none());
        assert_eq!(source.error(), Some("channel closed"));
    }

    #[test]
    fn test_channel_source_description() {
        let (_tx, source) = ChannelSource::create("replay");
        assert_eq!(source.description(), "channel: replay");
    }
}
