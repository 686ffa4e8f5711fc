//! Client struct definition
//!
//! Represents a connected client: its connection handle, display name,
//! peer address and outbound message channel.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::{mpsc, Notify};

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::ClientId;

/// Connected client information
///
/// Cloning is cheap and yields another handle to the same outbound channel;
/// the roster owns one clone, the session holds another while it runs.
#[derive(Debug, Clone)]
pub struct Client {
    /// Connection handle
    pub id: ClientId,
    /// Display name drawn from the nickname pool
    pub name: String,
    /// Remote address and port
    pub addr: SocketAddr,
    /// Server → Client message channel, drained by the connection's writer task
    pub sender: mpsc::Sender<ServerMessage>,
    /// Raised when a broadcast found the queue full; shared by all clones
    lagged: Arc<Notify>,
}

impl Client {
    /// Create a new client with a fresh connection handle
    pub fn new(name: String, addr: SocketAddr, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            id: ClientId::new(),
            name,
            addr,
            sender,
            lagged: Arc::new(Notify::new()),
        }
    }

    /// Queue a message for this client
    ///
    /// Returns an error if the channel is closed (writer task gone).
    pub async fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Queue a message without waiting for room in the channel
    pub fn try_send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::ChannelFull,
            mpsc::error::TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }

    /// Ask this client's session to disconnect it for falling behind
    pub fn mark_lagged(&self) {
        self.lagged.notify_one();
    }

    /// Resolves once `mark_lagged` has been called on any clone
    pub async fn lagged(&self) {
        self.lagged.notified().await;
    }

    /// `name@ip:port`, used in broadcast prefixes and announcements
    pub fn label(&self) -> String {
        format!("{}@{}:{}", self.name, self.addr.ip(), self.addr.port())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "10.0.0.7:51000".parse().unwrap()
    }

    #[tokio::test]
    async fn test_client_creation() {
        let (tx, _rx) = mpsc::channel(32);
        let client = Client::new("Ada".to_string(), addr(), tx);

        assert_eq!(client.name, "Ada");
        assert_eq!(client.label(), "Ada@10.0.0.7:51000");
    }

    #[tokio::test]
    async fn test_clone_keeps_identity() {
        let (tx, _rx) = mpsc::channel(32);
        let client = Client::new("Ada".to_string(), addr(), tx);
        assert_eq!(client.clone().id, client.id);
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped() {
        let (tx, rx) = mpsc::channel(32);
        let client = Client::new("Ada".to_string(), addr(), tx);

        assert!(client.send(ServerMessage::Help).await.is_ok());
        drop(rx);
        assert!(client.send(ServerMessage::Help).await.is_err());
    }

    #[tokio::test]
    async fn test_lagged_seen_through_clone() {
        let (tx, _rx) = mpsc::channel(1);
        let client = Client::new("Ada".to_string(), addr(), tx);
        let roster_copy = client.clone();

        roster_copy.mark_lagged();
        tokio::time::timeout(std::time::Duration::from_secs(1), client.lagged())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_try_send_full_and_closed() {
        let (tx, rx) = mpsc::channel(1);
        let client = Client::new("Ada".to_string(), addr(), tx);

        assert!(client.try_send(ServerMessage::Help).is_ok());
        assert!(matches!(
            client.try_send(ServerMessage::Help),
            Err(SendError::ChannelFull)
        ));
        drop(rx);
        assert!(matches!(
            client.try_send(ServerMessage::Help),
            Err(SendError::ChannelClosed)
        ));
    }
}
