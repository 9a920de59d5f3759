//! glowsync - ambient screen lighting for LAN smart bulbs.
//!
//! The pipeline samples the rendered screen, reduces each frame to a small
//! palette with median-cut quantization, selects the darker palette entry as
//! the ambient color, and drives a discovered bulb to match it.

pub mod capture;
pub mod config;
pub mod device;
pub mod discovery;
pub mod error;
pub mod pipeline;
pub mod quantizer;

// Re-export commonly used types
pub use config::Config;
pub use device::DeviceSession;
pub use discovery::{DeviceRegistry, DeviceScanner, DiscoveredDevice};
pub use error::{Error, Result};
pub use pipeline::{ambient_color, Frame, FrameSource, Pipeline, PipelineState};
pub use quantizer::{Color, MedianCutQuantizer};
