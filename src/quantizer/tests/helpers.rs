use crate::quantizer::{Color, MedianCutQuantizer};

/// Build a quantizer pre-filled with the given opaque RGB triples.
pub fn filled(colors: &[(u8, u8, u8)]) -> MedianCutQuantizer {
    let mut quantizer = MedianCutQuantizer::new();
    for &(r, g, b) in colors {
        quantizer.add_color(Color::rgb(r, g, b));
    }
    quantizer
}

/// Count distinct colors in a slice of RGB triples.
pub fn distinct(colors: &[(u8, u8, u8)]) -> usize {
    let mut seen: Vec<(u8, u8, u8)> = Vec::new();
    for c in colors {
        if !seen.contains(c) {
            seen.push(*c);
        }
    }
    seen.len()
}

/// Chebyshev distance between two colors across the RGB channels.
pub fn channel_distance(a: Color, b: Color) -> u8 {
    let dr = (a.r as i16 - b.r as i16).unsigned_abs() as u8;
    let dg = (a.g as i16 - b.g as i16).unsigned_abs() as u8;
    let db = (a.b as i16 - b.b as i16).unsigned_abs() as u8;
    dr.max(dg).max(db)
}
