//! Control core for the vehicle's distributed CAN node network.
//!
//! The crate decodes and encodes the fixed message set exchanged with the
//! traction inverter, the battery monitor, the safety receiver and the
//! chassis/dashboard nodes, and drives the vehicle through its safety-gated
//! operating states. Transport, pedal logic and display rendering live behind
//! the narrow traits in [`bus`], [`logic`] and [`io`].

pub mod bringup;
pub mod bus;
pub mod can_ids;
pub mod codec;
pub mod config;
pub mod dispatcher;
pub mod drive;
pub mod frame;
pub mod io;
pub mod logic;
pub mod telemetry;
pub mod vehicle_state;

#[cfg(target_os = "linux")]
pub mod run;

pub mod prelude {
    pub use crate::bringup::{BringupStatus, InverterBringup};
    pub use crate::bus::{BusError, CanTx, DashTelemetry, InverterCommands};
    pub use crate::config::{ControlConfig, SwitchMode};
    pub use crate::drive::{DriveState, DriveStateMachine};
    pub use crate::frame::Frame;
    pub use crate::io::{IoHandler, Widget};
    pub use crate::logic::{DriveLogic, TorqueCommand};
    pub use crate::telemetry::TelemetryScheduler;
    pub use crate::vehicle_state::VehicleState;
}
