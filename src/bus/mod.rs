//! Bus seam: the sink trait the state machines transmit through, the command
//! builders layered on top of it, and (on linux) the socketcan transport.

mod commands;
mod error;
#[cfg(target_os = "linux")]
pub mod socket;

pub use commands::{DashTelemetry, InverterCommands};
pub use error::BusError;

use crate::frame::Frame;

/// Outbound frame sink. The transport collaborator owns arbitration and
/// delivery; the core only hands over complete frames.
pub trait CanTx {
    fn send(&mut self, frame: &Frame) -> Result<(), BusError>;
}

/// Buffering sink. Tests assert on the collected frames; the daemon never
/// uses it.
impl CanTx for Vec<Frame> {
    fn send(&mut self, frame: &Frame) -> Result<(), BusError> {
        self.push(*frame);
        Ok(())
    }
}
