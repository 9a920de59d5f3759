//! Device discovery: wire format, registry, and the background scanner.

pub mod protocol;
pub mod registry;
pub mod scanner;

pub use registry::{DeviceRegistry, DiscoveredDevice};
pub use scanner::DeviceScanner;
