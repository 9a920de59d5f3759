//! Registry of devices seen on the network, deduplicated by identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One device parsed from a discovery reply. Superseded, never duplicated,
/// when the same identity replies again. Not persisted beyond the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    /// Device identifier from the reply's `id` header.
    pub id: String,
    /// Control endpoint from the reply's `Location` header.
    pub addr: SocketAddr,
    /// Model hint, e.g. "color" or "ceiling".
    pub model: Option<String>,
    /// Firmware revision hint.
    pub fw_ver: Option<String>,
    /// Operation names the device advertises in its `support` header.
    pub support: Vec<String>,
    /// Whether the device reported itself powered on.
    pub power_on: bool,
    /// When the device last replied.
    pub last_seen: DateTime<Utc>,
}

impl DiscoveredDevice {
    pub fn supports(&self, operation: &str) -> bool {
        self.support.iter().any(|op| op == operation)
    }

    pub fn supports_color(&self) -> bool {
        self.supports("set_rgb")
    }

    pub fn supports_brightness(&self) -> bool {
        self.supports("set_bright")
    }
}

/// Concurrency-safe device map. Written by the discovery listener task,
/// read by the Searching-phase poll loop; the lock is the only
/// synchronization either side needs.
#[derive(Clone, Default)]
pub struct DeviceRegistry {
    entries: Arc<RwLock<HashMap<String, DiscoveredDevice>>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh a device keyed by its identifier. Returns true when
    /// the identity was new.
    pub async fn upsert(&self, device: DiscoveredDevice) -> bool {
        self.entries
            .write()
            .await
            .insert(device.id.clone(), device)
            .is_none()
    }

    /// Stable view of the current entries, ordered by device id.
    pub async fn snapshot(&self) -> Vec<DiscoveredDevice> {
        let mut devices: Vec<DiscoveredDevice> =
            self.entries.read().await.values().cloned().collect();
        devices.sort_by(|a, b| a.id.cmp(&b.id));
        devices
    }

    /// First device in snapshot order, if any has been discovered.
    pub async fn first(&self) -> Option<DiscoveredDevice> {
        self.snapshot().await.into_iter().next()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
