//! Interface to the pedal/mission logic collaborator. The core never decides
//! how much torque to apply; it only gates whether torque commands may be
//! issued at all.

use crate::vehicle_state::VehicleState;

/// One tick's torque decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TorqueCommand {
    Torque(i16),
    /// The redundant pedal channels disagree beyond tolerance. Mandates an
    /// immediate stop; never retried automatically.
    PlausibilityFault,
}

/// Boolean predicates and the torque computation consumed by the drive state
/// machine. Every call gets the shared store; edge predicates may keep their
/// own previous-value state, hence `&mut self`. Implementations must not
/// block.
pub trait DriveLogic {
    fn should_start_manual_driving(&mut self, store: &VehicleState) -> bool;
    fn should_start_as_driving(&mut self, store: &VehicleState) -> bool;
    fn should_go_idle(&mut self, store: &VehicleState) -> bool;
    fn just_entered_emergency(&mut self, store: &VehicleState) -> bool;
    fn compute_torque(&mut self, store: &VehicleState) -> TorqueCommand;
}

/// Logic that never requests drive and never asks for torque. Used by the
/// stand-alone daemon until a real pedal logic node is wired in.
#[derive(Debug, Default)]
pub struct InertLogic;

impl DriveLogic for InertLogic {
    fn should_start_manual_driving(&mut self, _store: &VehicleState) -> bool {
        false
    }

    fn should_start_as_driving(&mut self, _store: &VehicleState) -> bool {
        false
    }

    fn should_go_idle(&mut self, _store: &VehicleState) -> bool {
        false
    }

    fn just_entered_emergency(&mut self, _store: &VehicleState) -> bool {
        false
    }

    fn compute_torque(&mut self, _store: &VehicleState) -> TorqueCommand {
        TorqueCommand::Torque(0)
    }
}
