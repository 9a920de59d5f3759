//! Yeelight LAN discovery wire format.
//!
//! Discovery is SSDP-like: an `M-SEARCH` request goes out over UDP to
//! `239.255.255.250:1982`, and bulbs answer with an HTTP-style header block
//! (`HTTP/1.1 200 OK` for search responses, `NOTIFY * HTTP/1.1` for
//! unsolicited advertisements). The byte layout is a fixed external contract;
//! do not adjust it without checking against the device documentation.

use chrono::Utc;
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use crate::discovery::registry::DiscoveredDevice;
use crate::error::{Error, Result};

/// Multicast group the device family listens on.
pub const MULTICAST_ADDR: SocketAddrV4 =
    SocketAddrV4::new(Ipv4Addr::new(239, 255, 255, 250), 1982);

/// The discovery request payload. `ST: wifi_bulb` selects the bulb family.
pub const SEARCH_REQUEST: &str = "M-SEARCH * HTTP/1.1\r\n\
    HOST: 239.255.255.250:1982\r\n\
    MAN: \"ssdp:discover\"\r\n\
    ST: wifi_bulb\r\n";

/// Parse one advertisement/reply datagram into a registry entry.
///
/// Returns `Error::DiscoveryParse` for anything that is not a well-formed
/// reply; the listener drops those and keeps going.
pub fn parse_reply(payload: &[u8]) -> Result<DiscoveredDevice> {
    let text = std::str::from_utf8(payload)
        .map_err(|_| Error::DiscoveryParse("reply is not valid UTF-8".into()))?;

    let mut lines = text.split("\r\n");
    let status = lines.next().unwrap_or_default().trim();
    if status != "HTTP/1.1 200 OK" && status != "NOTIFY * HTTP/1.1" {
        return Err(Error::DiscoveryParse(format!(
            "unexpected status line: {status:?}"
        )));
    }

    let mut headers: HashMap<String, &str> = HashMap::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(Error::DiscoveryParse(format!("malformed header: {line:?}")));
        };
        headers.insert(name.trim().to_ascii_lowercase(), value.trim());
    }

    let id = headers
        .get("id")
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::DiscoveryParse("missing id header".into()))?
        .to_string();
    let location = headers
        .get("location")
        .ok_or_else(|| Error::DiscoveryParse("missing Location header".into()))?;
    let addr = parse_location(location)?;

    Ok(DiscoveredDevice {
        id,
        addr,
        model: headers.get("model").map(|v| v.to_string()),
        fw_ver: headers.get("fw_ver").map(|v| v.to_string()),
        support: headers
            .get("support")
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default(),
        power_on: headers.get("power").is_some_and(|v| *v == "on"),
        last_seen: Utc::now(),
    })
}

/// Decode a `yeelight://<ip>:<port>` location into the control endpoint.
fn parse_location(location: &str) -> Result<SocketAddr> {
    let endpoint = location
        .strip_prefix("yeelight://")
        .ok_or_else(|| Error::DiscoveryParse(format!("unexpected location scheme: {location:?}")))?;
    endpoint
        .parse()
        .map_err(|_| Error::DiscoveryParse(format!("bad control endpoint: {endpoint:?}")))
}
