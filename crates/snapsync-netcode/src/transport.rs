//! Transport seam for inbound server messages
//!
//! Connection setup, authentication and reconnects belong to the host.
//! The client only needs a way to pull whole messages, one per frame of the
//! underlying transport, in arrival order.

use crate::envelope::Inbound;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;

/// Connection-oriented message source (e.g. a WebSocket)
///
/// Implementations deliver whole messages in order, or nothing.
pub trait Connection {
    /// Error type for this connection
    type Error: std::error::Error + Send + Sync + 'static;

    /// Receive the next message (non-blocking)
    ///
    /// Returns `Ok(None)` if no message is ready.
    fn recv(&self) -> Result<Option<Inbound>, Self::Error>;

    /// Check if the connection is still alive
    fn is_connected(&self) -> bool;
}

/// In-memory connection fed by the host
///
/// Useful for replaying captured traffic and for tests.
#[derive(Debug, Default)]
pub struct QueuedConnection {
    queue: RefCell<VecDeque<Inbound>>,
    closed: bool,
}

impl QueuedConnection {
    /// Create an empty, open connection
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message for delivery
    pub fn push(&self, inbound: impl Into<Inbound>) {
        self.queue.borrow_mut().push_back(inbound.into());
    }

    /// Number of undelivered messages
    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Check if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }

    /// Mark the connection closed; queued messages are still delivered
    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl Connection for QueuedConnection {
    type Error = Infallible;

    fn recv(&self) -> Result<Option<Inbound>, Infallible> {
        Ok(self.queue.borrow_mut().pop_front())
    }

    fn is_connected(&self) -> bool {
        !self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queued_connection_order() {
        let conn = QueuedConnection::new();
        conn.push(vec![1u8, 2, 3]);
        conn.push("{}");
        assert_eq!(conn.len(), 2);

        assert_eq!(conn.recv().unwrap(), Some(Inbound::Binary(vec![1, 2, 3])));
        assert_eq!(conn.recv().unwrap(), Some(Inbound::Text("{}".to_string())));
        assert_eq!(conn.recv().unwrap(), None);
    }

    #[test]
    fn test_close() {
        let mut conn = QueuedConnection::new();
        conn.push("{}");
        assert!(conn.is_connected());
        conn.close();
        assert!(!conn.is_connected());
        assert!(conn.recv().unwrap().is_some());
    }
}
