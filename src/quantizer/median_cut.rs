//! Median-cut palette reduction.
//!
//! The quantizer accumulates every pixel of one frame and reduces the set to a
//! small palette on demand: start with one box spanning all accumulated colors,
//! repeatedly split the box with the widest channel spread at its median, then
//! take the mean of each final box as its representative.

use super::color::{Channel, Color};

/// An axis-aligned region of color space plus the accumulated colors currently
/// assigned to it. Boxes partition the accumulation: every color added since
/// the last clear sits in exactly one box while a reduction runs. Boxes never
/// escape `get_palette`.
struct ColorBox {
    colors: Vec<Color>,
}

impl ColorBox {
    fn new(colors: Vec<Color>) -> Self {
        Self { colors }
    }

    /// Spread (max − min) of one channel across the box.
    fn range(&self, channel: Channel) -> u8 {
        let mut min = u8::MAX;
        let mut max = u8::MIN;
        for color in &self.colors {
            let v = color.channel(channel);
            min = min.min(v);
            max = max.max(v);
        }
        max.saturating_sub(min)
    }

    /// The channel with the largest spread, paired with that spread.
    fn widest_channel(&self) -> (Channel, u8) {
        let mut widest = (Channel::Red, self.range(Channel::Red));
        for channel in [Channel::Green, Channel::Blue] {
            let spread = self.range(channel);
            if spread > widest.1 {
                widest = (channel, spread);
            }
        }
        widest
    }

    /// A box is terminal once it holds fewer than two distinct colors.
    fn splittable(&self) -> bool {
        self.colors.len() >= 2 && self.widest_channel().1 > 0
    }

    /// Stable-sort along `channel` and split at the median index. Consumes the
    /// box; each half inherits the colors on its side.
    fn split(mut self, channel: Channel) -> (ColorBox, ColorBox) {
        self.colors.sort_by_key(|c| c.channel(channel));
        let right = self.colors.split_off(self.colors.len() / 2);
        (ColorBox::new(self.colors), ColorBox::new(right))
    }

    /// Component-wise mean of the member colors, rounded.
    fn representative(&self) -> Color {
        let count = self.colors.len() as u64;
        debug_assert!(count > 0);
        let mut r = 0u64;
        let mut g = 0u64;
        let mut b = 0u64;
        let mut a = 0u64;
        for color in &self.colors {
            r += color.r as u64;
            g += color.g as u64;
            b += color.b as u64;
            a += color.a as u64;
        }
        let mean = |sum: u64| ((sum + count / 2) / count) as u8;
        Color::new(mean(r), mean(g), mean(b), mean(a))
    }
}

/// Accumulates colors and reduces them to a representative palette.
#[derive(Default)]
pub struct MedianCutQuantizer {
    colors: Vec<Color>,
}

impl MedianCutQuantizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one color to the accumulation. No normalization, no dedup.
    pub fn add_color(&mut self, color: Color) {
        self.colors.push(color);
    }

    /// Number of colors accumulated since the last clear.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Reduce the accumulation to at most `palette_size` representative colors.
    ///
    /// Deterministic for a fixed input sequence, and non-mutating: repeated
    /// calls without an intervening `add_color`/`clear` return the same
    /// palette. An empty accumulation yields an empty palette; if
    /// `palette_size` exceeds the number of distinct colors the palette is
    /// simply shorter.
    pub fn get_palette(&self, palette_size: usize) -> Vec<Color> {
        if self.colors.is_empty() || palette_size == 0 {
            return Vec::new();
        }

        let mut boxes = vec![ColorBox::new(self.colors.clone())];
        while boxes.len() < palette_size {
            // Split the box with the greatest spread on its widest channel.
            let candidate = boxes
                .iter()
                .enumerate()
                .filter(|(_, b)| b.splittable())
                .max_by_key(|(_, b)| b.widest_channel().1)
                .map(|(i, b)| (i, b.widest_channel().0));
            let Some((index, channel)) = candidate else {
                break; // every remaining box is degenerate
            };

            let (left, right) = boxes.remove(index).split(channel);
            boxes.push(left);
            boxes.push(right);
        }

        boxes.iter().map(ColorBox::representative).collect()
    }

    /// Discard the accumulation. Capacity is retained so the steady-state tick
    /// path does not reallocate.
    pub fn clear(&mut self) {
        self.colors.clear();
    }
}
