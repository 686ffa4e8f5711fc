//! TCP connection handler
//!
//! Drives one client's session: registration, the read loop, command
//! dispatch and teardown. Output goes through a dedicated writer task so
//! every line reaches the socket whole.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use socket2::SockRef;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::broadcast::Broadcaster;
use crate::client::Client;
use crate::config::ServerConfig;
use crate::error::AppError;
use crate::framer::Framer;
use crate::message::{Command, ServerMessage};
use crate::nicknames::NicknamePool;
use crate::roster::Roster;

/// Size of a single socket read
const READ_BUFFER_SIZE: usize = 4096;

/// State shared by every session
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub roster: Roster,
    pub broadcaster: Broadcaster,
    pub nicknames: Arc<NicknamePool>,
    pub max_line_length: usize,
    pub farewell_timeout: Duration,
    pub client_buffer: usize,
}

impl SessionContext {
    pub fn new(roster: Roster, nicknames: NicknamePool, config: &ServerConfig) -> Self {
        Self {
            broadcaster: Broadcaster::new(roster.clone()),
            roster,
            nicknames: Arc::new(nicknames),
            max_line_length: config.max_line_length,
            farewell_timeout: config.farewell_timeout,
            client_buffer: config.client_buffer,
        }
    }
}

/// Why a session ended
#[derive(Debug)]
enum Disconnect {
    /// Client sent EXIT
    Exit,
    /// Peer closed its side
    EndOfStream,
    /// Reset, aborted or broken pipe
    Reset(io::Error),
    /// Outbound queue overflowed during a broadcast
    Lagged,
    /// Anything else
    Error(AppError),
}

impl Disconnect {
    fn from_io(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Disconnect::Reset(e),
            _ => Disconnect::Error(e.into()),
        }
    }
}

/// Whether the read loop keeps going after a command
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Handle a new TCP connection
///
/// Returns once the client is gone and its leave announcement is sent.
/// Errors are only returned when the roster itself is unavailable.
pub async fn handle_connection(stream: TcpStream, ctx: SessionContext) -> Result<(), AppError> {
    let addr = stream.peer_addr()?;
    tune_socket(&stream, addr);

    let (mut reader, writer) = stream.into_split();
    let (msg_tx, msg_rx) = mpsc::channel(ctx.client_buffer);
    let mut write_task = tokio::spawn(write_loop(writer, msg_rx, addr));

    let client = Client::new(ctx.nicknames.pick_random(), addr, msg_tx);
    let label = client.label();
    info!("Client {} connected as {}", addr, client.name);

    ctx.roster.add(client.clone()).await?;
    ctx.broadcaster
        .broadcast(&format!("{} has joined the building", label), None)
        .await?;
    let _ = client.send(ServerMessage::Welcome).await;
    let _ = client.send(ServerMessage::Help).await;

    let mut framer = Framer::new(ctx.max_line_length);
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    let mut writer_done = false;

    let reason = 'session: loop {
        tokio::select! {
            read = reader.read(&mut buf) => match read {
                Ok(0) => break Disconnect::EndOfStream,
                Ok(n) => {
                    for text in framer.feed(&buf[..n]) {
                        info!("<< {}:{} : {}", addr.ip(), addr.port(), text);
                        match dispatch(&ctx, &client, Command::parse(&text)).await {
                            Ok(Flow::Continue) => {}
                            Ok(Flow::Exit) => break 'session Disconnect::Exit,
                            Err(e) => break 'session Disconnect::Error(e),
                        }
                    }
                    if let Err(e) = framer.check_pending() {
                        break Disconnect::Error(e.into());
                    }
                }
                Err(e) => break Disconnect::from_io(e),
            },
            written = &mut write_task => {
                writer_done = true;
                break match written {
                    Ok(Ok(())) => Disconnect::EndOfStream,
                    Ok(Err(e)) => Disconnect::from_io(e),
                    Err(e) => Disconnect::Error(io::Error::other(e).into()),
                };
            }
            _ = client.lagged() => break Disconnect::Lagged,
        }
    };

    // Unreachable for broadcasts from here on.
    let removed = ctx.roster.remove(client.id).await;

    match &reason {
        Disconnect::Exit => info!("Client {} exited", addr),
        Disconnect::EndOfStream if framer.pending() > 0 => info!(
            "Client {} disconnected with {} unterminated byte(s)",
            addr,
            framer.pending()
        ),
        Disconnect::EndOfStream => info!("Client {} disconnected", addr),
        Disconnect::Reset(e) => info!("Connection reset by client {}: {}", addr, e),
        Disconnect::Lagged => warn!("Client {} dropped: not reading fast enough", addr),
        Disconnect::Error(e) => error!("Client {} error: {:?}", addr, e),
    }

    // Let queued output (the farewell in particular) drain unless the socket is broken.
    drop(client);
    if !writer_done {
        match reason {
            Disconnect::Exit | Disconnect::EndOfStream => {
                if timeout(ctx.farewell_timeout, &mut write_task).await.is_err() {
                    warn!("Writer for {} did not finish in time", addr);
                    write_task.abort();
                }
            }
            Disconnect::Reset(_) | Disconnect::Lagged | Disconnect::Error(_) => {
                write_task.abort()
            }
        }
    }

    if removed? {
        let delivery = ctx
            .broadcaster
            .broadcast(&format!("{} has left the building", label), None)
            .await?;
        debug!(
            "Leave of {} announced to {}/{} clients",
            label, delivery.delivered, delivery.recipients
        );
    }

    Ok(())
}

/// Execute one parsed command for `client`
async fn dispatch(ctx: &SessionContext, client: &Client, cmd: Command) -> Result<Flow, AppError> {
    debug!("{} -> {}", client.label(), cmd.keyword());

    match cmd {
        Command::Help => {
            let _ = client.send(ServerMessage::Help).await;
        }
        Command::List => {
            let names = ctx
                .roster
                .list()
                .await?
                .into_iter()
                .map(|c| c.name)
                .collect();
            let _ = client.send(ServerMessage::Roster { names }).await;
        }
        Command::Say(content) => {
            let delivery = ctx.broadcaster.broadcast(&content, Some(client)).await?;
            debug!(
                "{} reached {}/{} clients",
                client.label(),
                delivery.delivered,
                delivery.recipients
            );
        }
        Command::Exit => {
            let _ = client.send(ServerMessage::Farewell).await;
            return Ok(Flow::Exit);
        }
    }

    Ok(Flow::Continue)
}

/// Drain the client's queue onto the socket, one line per message
///
/// Ends when every sender is dropped, or right after a farewell has been
/// written and the write half shut down.
async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut receiver: mpsc::Receiver<ServerMessage>,
    addr: SocketAddr,
) -> io::Result<()> {
    while let Some(msg) = receiver.recv().await {
        writer.write_all(msg.encode().as_bytes()).await?;
        if msg.closes_connection() {
            writer.shutdown().await?;
            break;
        }
    }
    debug!("Write task ended for {}", addr);
    Ok(())
}

/// Low-latency sends and keep-alive probes; failures are not fatal
fn tune_socket(stream: &TcpStream, addr: SocketAddr) {
    if let Err(e) = stream.set_nodelay(true) {
        warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
    }
    if let Err(e) = SockRef::from(stream).set_keepalive(true) {
        warn!("Failed to set SO_KEEPALIVE for {}: {}", addr, e);
    }
}

/// Spawn a session task, logging its outcome
pub fn spawn_session(stream: TcpStream, ctx: SessionContext) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = handle_connection(stream, ctx).await {
            error!("Connection handler error: {}", e);
        }
    })
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn test_writer_stops_after_farewell() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mut peer = TcpStream::connect(addr).await.unwrap();
        let (server_side, _) = listener.accept().await.unwrap();
        let (_reader, writer) = server_side.into_split();

        let (tx, rx) = mpsc::channel(4);
        tx.send(ServerMessage::Help).await.unwrap();
        tx.send(ServerMessage::Farewell).await.unwrap();
        tx.send(ServerMessage::Welcome).await.unwrap();
        write_loop(writer, rx, addr).await.unwrap();

        let mut out = String::new();
        peer.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, ">> Available commands: HELP, LIST, EXIT, SAY.\n>> bye!\n");
    }

    #[test]
    fn test_reset_class_errors() {
        for kind in [
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::ConnectionAborted,
            io::ErrorKind::BrokenPipe,
        ] {
            assert!(matches!(
                Disconnect::from_io(io::Error::from(kind)),
                Disconnect::Reset(_)
            ));
        }
    }

    #[test]
    fn test_other_errors_are_unclassified() {
        assert!(matches!(
            Disconnect::from_io(io::Error::from(io::ErrorKind::TimedOut)),
            Disconnect::Error(AppError::Io(_))
        ));
    }
}
