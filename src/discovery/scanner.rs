//! Background discovery listener and broadcast sender.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::discovery::protocol::{self, MULTICAST_ADDR, SEARCH_REQUEST};
use crate::discovery::registry::DeviceRegistry;
use crate::error::Result;

/// How long the listener blocks in `recv_from` before rechecking its running
/// flag. Bounds shutdown latency, nothing else.
const RECV_POLL: Duration = Duration::from_millis(500);

/// Locates bulbs on the local network without prior address knowledge.
///
/// One UDP socket serves both directions: `send_discovery_message` multicasts
/// the search request from it, and the listener task receives the unicast
/// replies it attracts. Replies fold into the shared [`DeviceRegistry`];
/// malformed datagrams are dropped with a debug log.
pub struct DeviceScanner {
    socket: Arc<UdpSocket>,
    registry: DeviceRegistry,
    running: Arc<AtomicBool>,
    search_target: std::net::SocketAddr,
}

impl DeviceScanner {
    /// Bind the discovery socket on an ephemeral port.
    pub async fn bind() -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
        socket.set_broadcast(true)?;
        Ok(Self {
            socket: Arc::new(socket),
            registry: DeviceRegistry::new(),
            running: Arc::new(AtomicBool::new(false)),
            search_target: MULTICAST_ADDR.into(),
        })
    }

    /// Redirect search requests somewhere other than the multicast group.
    /// Test seam only.
    #[cfg(test)]
    pub(crate) fn set_search_target(&mut self, target: std::net::SocketAddr) {
        self.search_target = target;
    }

    /// Local address of the discovery socket.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Live view of everything discovered so far.
    pub fn discovered_devices(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Start the background reply listener. Idempotent; a second call while
    /// running is a no-op. The task exits (and the socket reference is
    /// released) shortly after [`stop`](Self::stop).
    pub fn start_listening(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("discovery listener already running");
            return;
        }

        let socket = self.socket.clone();
        let registry = self.registry.clone();
        let running = self.running.clone();

        tokio::spawn(async move {
            info!("discovery listener started");
            let mut buf = [0u8; 2048];
            while running.load(Ordering::SeqCst) {
                let received = match timeout(RECV_POLL, socket.recv_from(&mut buf)).await {
                    Err(_) => continue, // poll timeout, recheck the flag
                    Ok(Err(e)) => {
                        warn!("discovery receive error, listener stopping: {e}");
                        running.store(false, Ordering::SeqCst);
                        break;
                    }
                    Ok(Ok(received)) => received,
                };

                let (len, from) = received;
                match protocol::parse_reply(&buf[..len]) {
                    Ok(device) => {
                        if registry.upsert(device.clone()).await {
                            info!(
                                "discovered device {} ({}) at {}",
                                device.id,
                                device.model.as_deref().unwrap_or("unknown model"),
                                device.addr
                            );
                        } else {
                            debug!("refreshed device {}", device.id);
                        }
                    }
                    Err(e) => debug!("dropping datagram from {from}: {e}"),
                }
            }
            info!("discovery listener stopped");
        });
    }

    /// Multicast one search request. Fire-and-forget; replies arrive on the
    /// listener asynchronously.
    pub async fn send_discovery_message(&self) -> Result<()> {
        self.socket
            .send_to(SEARCH_REQUEST.as_bytes(), self.search_target)
            .await?;
        Ok(())
    }

    /// Signal the listener task to exit.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
