//! Error types for glowsync.

use std::net::SocketAddr;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline error taxonomy. Discovery- and command-level failures are
/// non-fatal by design: a malformed reply is dropped, and a failed send is
/// superseded by the next tick's command.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Discovery reply that could not be decoded. Dropped by the listener.
    #[error("malformed discovery reply: {0}")]
    DiscoveryParse(String),

    /// Device unreachable or handshake rejected at connect time.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Transient send failure for a brightness/color command. No retry; the
    /// next tick issues a corrected command.
    #[error("command send failed: {0}")]
    CommandSend(#[source] std::io::Error),

    /// A command was issued before any session was established.
    #[error("no device session established")]
    NotConnected,

    /// Socket setup error outside the per-command path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
