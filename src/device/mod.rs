//! Device control: command encoding and the TCP session.

pub mod command;
pub mod session;

pub use command::{Command, LightChannel};
pub use session::DeviceSession;
