use serde::{Deserialize, Serialize};

/// An RGBA screen color. Channels are independent 8-bit values; alpha is
/// conventionally 255 for anything sampled from the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// The three axes a color box can be split along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from RGB channels.
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn channel(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Red => self.r,
            Channel::Green => self.g,
            Channel::Blue => self.b,
        }
    }

    /// Perceptual brightness score, truncated to an integer.
    ///
    /// `sqrt(0.299·R² + 0.587·G² + 0.114·B²)` — the weighted-luma distance the
    /// ambient selection uses to prefer the darker, more saturated palette
    /// entry over a washed-out near-white one.
    pub fn brightness(&self) -> u32 {
        let r = self.r as f64;
        let g = self.g as f64;
        let b = self.b as f64;
        (r * r * 0.299 + g * g * 0.587 + b * b * 0.114).sqrt() as u32
    }
}
