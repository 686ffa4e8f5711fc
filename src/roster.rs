//! Roster actor implementation
//!
//! The single owner of the membership list. Sessions talk to it through a
//! cloneable `Roster` handle; commands are processed one at a time, which
//! serializes add/remove/list/count without locks.

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::client::Client;
use crate::error::AppError;
use crate::types::ClientId;

/// Commands sent from sessions to the roster actor
#[derive(Debug)]
pub enum RosterCommand {
    /// Register a newly connected client
    Add {
        client: Client,
        reply: oneshot::Sender<()>,
    },
    /// Drop a client by connection handle
    Remove {
        client_id: ClientId,
        reply: oneshot::Sender<bool>,
    },
    /// Snapshot of current members in join order
    List { reply: oneshot::Sender<Vec<Client>> },
    /// Current member count
    Count { reply: oneshot::Sender<usize> },
}

/// The roster actor
///
/// Keeps members in a `Vec` to preserve insertion order for `LIST`.
pub struct RosterActor {
    clients: Vec<Client>,
    receiver: mpsc::Receiver<RosterCommand>,
}

impl RosterActor {
    /// Create a new actor with the given command receiver
    pub fn new(receiver: mpsc::Receiver<RosterCommand>) -> Self {
        Self {
            clients: Vec::new(),
            receiver,
        }
    }

    /// Run the actor loop until every `Roster` handle is dropped
    pub async fn run(mut self) {
        info!("Roster started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("Roster shutting down");
    }

    fn handle_command(&mut self, cmd: RosterCommand) {
        match cmd {
            RosterCommand::Add { client, reply } => {
                debug!("Adding {} ({})", client.label(), client.id);
                self.clients.push(client);
                debug!("Total clients: {}", self.clients.len());
                let _ = reply.send(());
            }
            RosterCommand::Remove { client_id, reply } => {
                let removed = match self.clients.iter().position(|c| c.id == client_id) {
                    Some(index) => {
                        let client = self.clients.remove(index);
                        debug!("Removed {} ({})", client.label(), client_id);
                        true
                    }
                    None => {
                        debug!("Client {} already removed", client_id);
                        false
                    }
                };
                let _ = reply.send(removed);
            }
            RosterCommand::List { reply } => {
                let _ = reply.send(self.clients.clone());
            }
            RosterCommand::Count { reply } => {
                let _ = reply.send(self.clients.len());
            }
        }
    }
}

/// Handle to the roster actor
///
/// Every operation has completed inside the actor by the time it returns,
/// so its effect is visible to any later call from any session.
#[derive(Debug, Clone)]
pub struct Roster {
    sender: mpsc::Sender<RosterCommand>,
}

impl Roster {
    /// Wrap an existing command channel
    pub fn new(sender: mpsc::Sender<RosterCommand>) -> Self {
        Self { sender }
    }

    /// Spawn a roster actor on the current runtime and return its handle
    pub fn spawn(buffer: usize) -> Self {
        let (tx, rx) = mpsc::channel(buffer);
        tokio::spawn(RosterActor::new(rx).run());
        Self::new(tx)
    }

    /// Insert a client; duplicates are not checked
    pub async fn add(&self, client: Client) -> Result<(), AppError> {
        self.request(|reply| RosterCommand::Add { client, reply }).await
    }

    /// Remove the first entry with this handle
    ///
    /// Returns `false` if the client was not present, so racing teardown
    /// paths can call it safely.
    pub async fn remove(&self, client_id: ClientId) -> Result<bool, AppError> {
        self.request(|reply| RosterCommand::Remove { client_id, reply })
            .await
    }

    /// Snapshot of current members in join order
    pub async fn list(&self) -> Result<Vec<Client>, AppError> {
        self.request(|reply| RosterCommand::List { reply }).await
    }

    /// Current member count
    pub async fn count(&self) -> Result<usize, AppError> {
        self.request(|reply| RosterCommand::Count { reply }).await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RosterCommand,
    ) -> Result<T, AppError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| AppError::ChannelSend)?;
        reply_rx.await.map_err(|_| AppError::ChannelSend)
    }
}
