//! Top-level drive state machine.
//!
//! Owns the inverter bring-up machine and the commanded-torque path. The
//! decision inputs (start requests, stop requests, emergency edges, torque)
//! come from the [`DriveLogic`] collaborator; sounds and display pushes go
//! through the [`IoHandler`] collaborator. The machine itself only sequences.

use tracing::{info, warn};

use crate::bringup::{BringupStatus, InverterBringup};
use crate::bus::{BusError, CanTx, InverterCommands};
use crate::config::ControlConfig;
use crate::io::IoHandler;
use crate::logic::{DriveLogic, TorqueCommand};
use crate::vehicle_state::VehicleState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriveState {
    Idle,
    InitializingManual,
    InitializingAutonomous,
    Driving,
    AutonomousDriving,
}

impl DriveState {
    pub fn to_byte(&self) -> u8 {
        match self {
            DriveState::Idle => 0x00,
            DriveState::InitializingManual => 0x01,
            DriveState::InitializingAutonomous => 0x02,
            DriveState::Driving => 0x03,
            DriveState::AutonomousDriving => 0x04,
        }
    }

    pub fn from_byte(byte: u8) -> DriveState {
        match byte {
            0x01 => DriveState::InitializingManual,
            0x02 => DriveState::InitializingAutonomous,
            0x03 => DriveState::Driving,
            0x04 => DriveState::AutonomousDriving,
            _ => DriveState::Idle,
        }
    }
}

#[derive(Debug)]
pub struct DriveStateMachine {
    state: DriveState,
    bringup: InverterBringup,
}

impl DriveStateMachine {
    pub fn new() -> DriveStateMachine {
        DriveStateMachine {
            state: DriveState::Idle,
            bringup: InverterBringup::new(),
        }
    }

    pub fn state(&self) -> DriveState {
        self.state
    }

    fn enter(&mut self, state: DriveState, store: &VehicleState) {
        info!(from = ?self.state, to = ?state, "drive transition");
        self.state = state;
        store.set_drive_state_byte(state.to_byte());
    }

    /// One scheduling tick.
    pub fn update(
        &mut self,
        now_ms: u64,
        store: &VehicleState,
        tx: &mut impl CanTx,
        logic: &mut impl DriveLogic,
        io: &mut impl IoHandler,
        config: &ControlConfig,
    ) -> Result<(), BusError> {
        match self.state {
            DriveState::Idle => {
                if logic.should_start_manual_driving(store) {
                    self.bringup.reset(now_ms);
                    io.play_ready_sound();
                    self.enter(DriveState::InitializingManual, store);
                } else if logic.should_start_as_driving(store) {
                    self.bringup.reset(now_ms);
                    self.enter(DriveState::InitializingAutonomous, store);
                }
            }
            DriveState::InitializingManual => {
                match self.bringup.step(now_ms, store, tx, config)? {
                    BringupStatus::Initialized => self.enter(DriveState::Driving, store),
                    BringupStatus::Failed => self.fail_init(store, tx, io, config)?,
                    BringupStatus::InProgress => {}
                }
            }
            DriveState::InitializingAutonomous => {
                match self.bringup.step(now_ms, store, tx, config)? {
                    BringupStatus::Initialized => {
                        self.enter(DriveState::AutonomousDriving, store)
                    }
                    BringupStatus::Failed => self.fail_init(store, tx, io, config)?,
                    BringupStatus::InProgress => {}
                }
            }
            DriveState::Driving => {
                // Torque first: the logic layer sees this tick's pedal state
                // even when a stop lands on the same tick.
                let torque = logic.compute_torque(store);
                if logic.should_go_idle(store) {
                    tx.send_stop()?;
                    store.set_commanded_torque(0);
                    self.enter(DriveState::Idle, store);
                    return Ok(());
                }
                match torque {
                    TorqueCommand::Torque(torque) => {
                        tx.send_torque(torque)?;
                        store.set_commanded_torque(torque);
                    }
                    TorqueCommand::PlausibilityFault => {
                        warn!("pedal plausibility fault");
                        tx.send_stop()?;
                        store.set_commanded_torque(0);
                        self.enter(DriveState::Idle, store);
                    }
                }
            }
            DriveState::AutonomousDriving => {
                // Both checks run every tick; either alone ends the run.
                if logic.should_go_idle(store) {
                    tx.send_stop()?;
                    store.set_commanded_torque(0);
                    self.enter(DriveState::Idle, store);
                }
                if logic.just_entered_emergency(store) {
                    warn!("emergency while driving autonomously");
                    tx.send_stop()?;
                    store.set_commanded_torque(0);
                    io.play_buzzer(config.emergency_buzzer_ms);
                    if self.state != DriveState::Idle {
                        self.enter(DriveState::Idle, store);
                    }
                }
            }
        }
        Ok(())
    }

    fn fail_init(
        &mut self,
        store: &VehicleState,
        tx: &mut impl CanTx,
        io: &mut impl IoHandler,
        config: &ControlConfig,
    ) -> Result<(), BusError> {
        warn!("inverter bring-up failed, returning to idle");
        tx.send_stop()?;
        io.play_buzzer(config.init_fault_buzzer_ms);
        self.enter(DriveState::Idle, store);
        Ok(())
    }
}

impl Default for DriveStateMachine {
    fn default() -> DriveStateMachine {
        DriveStateMachine::new()
    }
}
