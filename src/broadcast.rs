//! Fan-out of one line to every roster member

use tracing::{debug, warn};

use crate::client::Client;
use crate::error::{AppError, SendError};
use crate::message::ServerMessage;
use crate::roster::Roster;

/// Outcome of a single broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Members in the snapshot the broadcast was sent to
    pub recipients: usize,
    /// Members whose channel accepted the line
    pub delivered: usize,
}

/// Sends lines to everyone in a roster snapshot
#[derive(Debug, Clone)]
pub struct Broadcaster {
    roster: Roster,
}

impl Broadcaster {
    pub fn new(roster: Roster) -> Self {
        Self { roster }
    }

    /// Deliver `content` to every current member
    ///
    /// With an originator the line reads `name@ip:port > content`, otherwise
    /// `[SERVER] > content`. Lines are queued with `try_send`, so a slow
    /// reader never stalls the caller. A closed recipient is skipped; a full
    /// one is marked lagged so its own session tears it down. Only a dead
    /// roster is reported as an error.
    pub async fn broadcast(
        &self,
        content: &str,
        originator: Option<&Client>,
    ) -> Result<Delivery, AppError> {
        let msg = ServerMessage::Chat {
            from: originator.map(Client::label),
            content: content.to_string(),
        };

        let members = self.roster.list().await?;
        let mut delivered = 0;
        for member in &members {
            match member.try_send(msg.clone()) {
                Ok(()) => delivered += 1,
                Err(SendError::ChannelFull) => {
                    warn!("Queue full for {}, disconnecting", member.label());
                    member.mark_lagged();
                }
                Err(e) => debug!("Broadcast to {} skipped: {}", member.label(), e),
            }
        }

        Ok(Delivery {
            recipients: members.len(),
            delivered,
        })
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;

    fn client(name: &str, port: u16) -> (Client, mpsc::Receiver<ServerMessage>) {
        let (tx, rx) = mpsc::channel(8);
        let addr = format!("192.168.1.5:{}", port).parse().unwrap();
        (Client::new(name.to_string(), addr, tx), rx)
    }

    #[tokio::test]
    async fn test_fan_out_with_originator() {
        let roster = Roster::spawn(16);
        let mut receivers = Vec::new();
        let mut clients = Vec::new();
        for (i, name) in ["Ada", "Bob", "Cy"].iter().enumerate() {
            let (c, rx) = client(name, 4000 + i as u16);
            roster.add(c.clone()).await.unwrap();
            clients.push(c);
            receivers.push(rx);
        }

        let broadcaster = Broadcaster::new(roster);
        let delivery = broadcaster
            .broadcast("hello", Some(&clients[1]))
            .await
            .unwrap();
        assert_eq!(
            delivery,
            Delivery {
                recipients: 3,
                delivered: 3
            }
        );

        for rx in receivers.iter_mut() {
            let msg = rx.recv().await.unwrap();
            assert_eq!(msg.to_string(), "Bob@192.168.1.5:4001 > hello");
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn test_server_origin() {
        let roster = Roster::spawn(16);
        let (c, mut rx) = client("Ada", 4000);
        roster.add(c).await.unwrap();

        Broadcaster::new(roster)
            .broadcast("Ada@192.168.1.5:4000 has joined the building", None)
            .await
            .unwrap();

        assert_eq!(
            rx.recv().await.unwrap().encode(),
            ">> [SERVER] > Ada@192.168.1.5:4000 has joined the building\n"
        );
    }

    #[tokio::test]
    async fn test_failed_recipient_does_not_block_others() {
        let roster = Roster::spawn(16);
        let (a, mut ra) = client("Ada", 4000);
        let (b, rb) = client("Bob", 4001);
        let (c, mut rc) = client("Cy", 4002);
        for member in [&a, &b, &c] {
            roster.add(member.clone()).await.unwrap();
        }
        drop(rb);

        let delivery = Broadcaster::new(roster)
            .broadcast("still here", Some(&a))
            .await
            .unwrap();

        assert_eq!(delivery.recipients, 3);
        assert_eq!(delivery.delivered, 2);
        assert!(ra.recv().await.is_some());
        assert!(rc.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_full_recipient_is_marked_lagged() {
        let roster = Roster::spawn(16);
        let (tx, mut slow_rx) = mpsc::channel(1);
        let slow = Client::new("Slow".to_string(), "10.1.1.1:9".parse().unwrap(), tx);
        let (fast, mut fast_rx) = client("Fast", 4000);
        roster.add(slow.clone()).await.unwrap();
        roster.add(fast.clone()).await.unwrap();

        let broadcaster = Broadcaster::new(roster);
        broadcaster.broadcast("one", None).await.unwrap();
        let delivery = broadcaster.broadcast("two", None).await.unwrap();

        assert_eq!(delivery.delivered, 1);
        tokio::time::timeout(std::time::Duration::from_secs(1), slow.lagged())
            .await
            .unwrap();
        assert_eq!(slow_rx.recv().await.unwrap().to_string(), "[SERVER] > one");
        assert_eq!(fast_rx.recv().await.unwrap().to_string(), "[SERVER] > one");
        assert_eq!(fast_rx.recv().await.unwrap().to_string(), "[SERVER] > two");
    }

    #[tokio::test]
    async fn test_empty_roster() {
        let delivery = Broadcaster::new(Roster::spawn(4))
            .broadcast("anyone?", None)
            .await
            .unwrap();
        assert_eq!(delivery.recipients, 0);
        assert_eq!(delivery.delivered, 0);
    }
}
