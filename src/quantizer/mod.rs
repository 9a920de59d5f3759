//! Color accumulation and median-cut palette reduction.

mod color;
mod median_cut;

pub use color::{Channel, Color};
pub use median_cut::MedianCutQuantizer;

#[cfg(test)]
mod tests;
