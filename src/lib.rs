//! Line-oriented TCP Chat Server Library
//!
//! Clients connect over plain TCP, get a random display name and talk to
//! everyone else with a tiny newline-delimited command language.
//!
//! # Commands
//! - `HELP` - list commands (also the reply to anything unrecognized)
//! - `LIST` - count and names of connected clients
//! - `SAY <text>` - broadcast `<text>` to everyone
//! - `EXIT` - say goodbye and disconnect
//!
//! Every server line is framed as `">> {text}\n"`.
//!
//! # Architecture
//! - `Roster` is an actor owning the membership list; sessions talk to it
//!   through a cloneable handle over `mpsc` + `oneshot` channels
//! - Each connection runs a session task plus a writer task that owns the
//!   socket's write half, so lines are never interleaved
//! - `Broadcaster` queues a line on every member's channel without waiting
//!
//! # Example
//! ```ignore
//! use line_chat::{ChatServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), line_chat::AppError> {
//!     let server = ChatServer::bind(&ServerConfig::default()).await?;
//!     server.run().await
//! }
//! ```

pub mod broadcast;
pub mod client;
pub mod config;
pub mod error;
pub mod framer;
pub mod handler;
pub mod message;
pub mod nicknames;
pub mod roster;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use broadcast::{Broadcaster, Delivery};
pub use client::Client;
pub use config::ServerConfig;
pub use error::{AppError, FrameError, SendError};
pub use framer::Framer;
pub use handler::{handle_connection, SessionContext};
pub use message::{Command, ServerMessage};
pub use nicknames::NicknamePool;
pub use roster::{Roster, RosterActor, RosterCommand};
pub use server::ChatServer;
pub use types::ClientId;
