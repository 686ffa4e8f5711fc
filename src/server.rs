//! TCP listener
//!
//! Binds the chat port, owns the shared session context and spawns one
//! session task per accepted connection.

use std::io;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::handler::{spawn_session, SessionContext};
use crate::nicknames::NicknamePool;
use crate::roster::Roster;

/// The chat server: a bound listener plus the state every session shares
pub struct ChatServer {
    listener: TcpListener,
    ctx: SessionContext,
}

impl ChatServer {
    /// Bind the listener and start the roster actor
    ///
    /// Loads the nickname file if one is configured. Bind and load failures
    /// are returned as-is; there is no retry.
    pub async fn bind(config: &ServerConfig) -> Result<Self, AppError> {
        let nicknames = match &config.nicknames {
            Some(path) => NicknamePool::from_file(path)?,
            None => NicknamePool::default(),
        };
        Self::bind_with(config, nicknames).await
    }

    /// Like `bind`, with an explicit nickname pool
    pub async fn bind_with(config: &ServerConfig, nicknames: NicknamePool) -> Result<Self, AppError> {
        let listener = TcpListener::bind(&config.addr).await?;
        let port = listener.local_addr()?.port();
        info!("Server listening on port {}", port);

        let roster = Roster::spawn(config.roster_buffer);
        Ok(Self {
            listener,
            ctx: SessionContext::new(roster, nicknames, config),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, AppError> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle to the shared roster
    pub fn roster(&self) -> Roster {
        self.ctx.roster.clone()
    }

    /// Accept connections until a listener-level error occurs
    ///
    /// Failures tied to a single incoming connection are logged and
    /// skipped; anything else is returned and should end the process.
    pub async fn run(self) -> Result<(), AppError> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!("New connection from {}", addr);
                    spawn_session(stream, self.ctx.clone());
                }
                Err(e) if is_per_connection(&e) => {
                    warn!("Failed to accept connection: {}", e);
                }
                Err(e) => {
                    error!("Listener failed: {}", e);
                    return Err(e.into());
                }
            }
        }
    }
}

fn is_per_connection(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}
