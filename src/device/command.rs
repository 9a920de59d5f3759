//! Yeelight control command encoding.
//!
//! Commands are JSON objects terminated by CRLF, one per line, with a
//! client-chosen message id. The device answers each one, but this client
//! never waits for acknowledgments.

use serde::Serialize;
use serde_json::{json, Value};

/// Documented brightness range for `set_bright`/`bg_set_bright`.
pub const BRIGHTNESS_MIN: u16 = 1;
pub const BRIGHTNESS_MAX: u16 = 100;

/// Shortest transition the protocol accepts, in milliseconds.
pub const MIN_TRANSITION_MS: u64 = 30;

/// Logical light target on the device. Dual-light models expose the ambient
/// backlight as a second channel with `bg_`-prefixed operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightChannel {
    Main,
    Background,
}

impl LightChannel {
    /// Map a numeric channel index onto a light target. Index 2 selects the
    /// background light; every other value drives the main light.
    pub fn from_index(index: u8) -> Self {
        if index == 2 {
            LightChannel::Background
        } else {
            LightChannel::Main
        }
    }
}

/// One encoded control command.
#[derive(Debug, Clone, Serialize)]
pub struct Command {
    pub id: u64,
    pub method: String,
    pub params: Vec<Value>,
}

impl Command {
    fn new(id: u64, method: &str, params: Vec<Value>) -> Self {
        Self {
            id,
            method: method.to_string(),
            params,
        }
    }

    /// Wire bytes: compact JSON plus the CRLF terminator.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = serde_json::to_vec(self).unwrap_or_default();
        bytes.extend_from_slice(b"\r\n");
        bytes
    }
}

/// Power the light on with a smooth transition.
pub fn set_power_on(id: u64, transition_ms: u64) -> Command {
    Command::new(
        id,
        "set_power",
        vec![json!("on"), json!("smooth"), json!(clamp_transition(transition_ms))],
    )
}

/// Set brightness on the given channel. Levels outside the documented 1-100
/// range are clamped, never sent raw.
pub fn set_brightness(id: u64, channel: LightChannel, level: u16, transition_ms: u64) -> Command {
    let method = match channel {
        LightChannel::Main => "set_bright",
        LightChannel::Background => "bg_set_bright",
    };
    let level = level.clamp(BRIGHTNESS_MIN, BRIGHTNESS_MAX);
    Command::new(
        id,
        method,
        vec![json!(level), json!("smooth"), json!(clamp_transition(transition_ms))],
    )
}

/// Transition to an RGB color over `transition_ms`. Channel values are
/// clamped to 0-255 before packing so out-of-range inputs can never wrap
/// into a different color.
pub fn set_color(id: u64, r: u16, g: u16, b: u16, transition_ms: u64) -> Command {
    let rgb = pack_rgb(clamp_channel(r), clamp_channel(g), clamp_channel(b));
    Command::new(
        id,
        "set_rgb",
        vec![json!(rgb), json!("smooth"), json!(clamp_transition(transition_ms))],
    )
}

fn clamp_channel(value: u16) -> u8 {
    value.min(255) as u8
}

fn clamp_transition(transition_ms: u64) -> u64 {
    transition_ms.max(MIN_TRANSITION_MS)
}

/// The protocol's packed color integer: `(R << 16) | (G << 8) | B`.
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}
