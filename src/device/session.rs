//! One live connection to a chosen device.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::device::command::{self, Command, LightChannel};
use crate::discovery::DiscoveredDevice;
use crate::error::{Error, Result};

/// Bound on the connect handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Bound on each command write. Sends are best-effort; a tick must never
/// stall behind a wedged socket.
const SEND_TIMEOUT: Duration = Duration::from_millis(250);

/// The single active device session: target identity, the open stream, and a
/// monotonically increasing message id. Owned by the orchestrator; at most
/// one session is live at a time.
#[derive(Default)]
pub struct DeviceSession {
    stream: Option<TcpStream>,
    target: Option<(String, SocketAddr)>,
    next_id: u64,
    last_command: Option<Command>,
}

impl DeviceSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Establish a session with a discovered device. Replaces any prior
    /// session; fails with [`Error::Connect`] if the device is unreachable
    /// within the handshake bound.
    pub async fn connect(&mut self, device: &DiscoveredDevice) -> Result<()> {
        // Reconnect replaces whatever came before, even on failure.
        self.stream = None;
        self.target = None;

        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(device.addr))
            .await
            .map_err(|_| Error::Connect {
                addr: device.addr,
                source: std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out"),
            })?
            .map_err(|source| Error::Connect {
                addr: device.addr,
                source,
            })?;
        stream.set_nodelay(true).ok();

        info!("connected to device {} at {}", device.id, device.addr);
        self.stream = Some(stream);
        self.target = Some((device.id.clone(), device.addr));
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Identity of the connected device, if any.
    pub fn target(&self) -> Option<&(String, SocketAddr)> {
        self.target.as_ref()
    }

    /// The most recent command handed to the wire.
    pub fn last_command(&self) -> Option<&Command> {
        self.last_command.as_ref()
    }

    /// Set brightness on a logical channel. `level` is clamped to the
    /// protocol's 1-100 range before encoding.
    pub async fn set_brightness(&mut self, channel: u8, level: u16) -> Result<()> {
        let cmd = command::set_brightness(
            self.take_id(),
            LightChannel::from_index(channel),
            level,
            command::MIN_TRANSITION_MS,
        );
        self.send(cmd).await
    }

    /// Transition the device to `(r, g, b)` over `duration_ms`. Out-of-range
    /// channel values are clamped before encoding.
    pub async fn set_color(&mut self, r: u16, g: u16, b: u16, duration_ms: u64) -> Result<()> {
        let cmd = command::set_color(self.take_id(), r, g, b, duration_ms);
        self.send(cmd).await
    }

    /// Power the light on. Issued once right after connecting.
    pub async fn power_on(&mut self, transition_ms: u64) -> Result<()> {
        let cmd = command::set_power_on(self.take_id(), transition_ms);
        self.send(cmd).await
    }

    /// Drop the connection. No in-flight command is awaited.
    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            debug!("device session closed");
        }
        self.target = None;
    }

    fn take_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// One-way best-effort send. The device acknowledges every command, but
    /// we only drain those bytes so the receive buffer cannot fill up.
    async fn send(&mut self, cmd: Command) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        let mut drain = [0u8; 512];
        while let Ok(n) = stream.try_read(&mut drain) {
            if n == 0 {
                break;
            }
        }

        let bytes = cmd.encode();
        timeout(SEND_TIMEOUT, stream.write_all(&bytes))
            .await
            .map_err(|_| {
                Error::CommandSend(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "send timed out",
                ))
            })?
            .map_err(Error::CommandSend)?;

        debug!("sent {} (id {})", cmd.method, cmd.id);
        self.last_command = Some(cmd);
        Ok(())
    }
}
