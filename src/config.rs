//! Runtime configuration
//!
//! Defaults match the classic setup: port 9999 on localhost with the
//! built-in nickname list.

use std::path::PathBuf;
use std::time::Duration;

/// Default server address
pub const DEFAULT_ADDR: &str = "127.0.0.1:9999";

/// Server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address
    pub addr: String,
    /// JSON nickname file; `None` uses the built-in list
    pub nicknames: Option<PathBuf>,
    /// Longest partial line accepted before the client is dropped
    pub max_line_length: usize,
    /// How long EXIT waits for the farewell to be written
    pub farewell_timeout: Duration,
    /// Roster command channel capacity
    pub roster_buffer: usize,
    /// Per-client outbound channel capacity
    pub client_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            nicknames: None,
            max_line_length: 64 * 1024,
            farewell_timeout: Duration::from_secs(5),
            roster_buffer: 256,
            client_buffer: 32,
        }
    }
}

impl ServerConfig {
    /// Build from positional arguments (program name already skipped):
    /// `[addr] [nickname-file]`
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let mut config = Self::default();
        if let Some(addr) = args.next() {
            config.addr = addr;
        }
        config.nicknames = args.next().map(PathBuf::from);
        config
    }
}
