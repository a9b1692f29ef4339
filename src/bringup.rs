//! Motor-controller bring-up sequence.
//!
//! Drives the inverter from power-on to torque-ready: confirm the bridge is
//! closed, force the drive off, switch cyclic transmission on, remove the
//! disable, push the ramp registers, clear latched faults. The two states
//! that wait on an acknowledgement re-send their query at a fixed cadence and
//! give up after a timeout measured from entry into that state. Everything
//! else is a single command and an immediate transition.
//!
//! The machine never sleeps; the scheduling loop calls [`InverterBringup::step`]
//! once per tick with the current monotonic time.

use tracing::{debug, info, warn};

use crate::bus::{BusError, CanTx, InverterCommands};
use crate::can_ids::{reg, READ_ONCE};
use crate::config::ControlConfig;
use crate::vehicle_state::VehicleState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BringupState {
    CheckStatus,
    Disable,
    EnableTransmission,
    Enable,
    RampAccel,
    RampDecel,
    ClearFaults,
    Initialized,
    Error,
}

/// Outcome of one scheduling tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BringupStatus {
    InProgress,
    Initialized,
    Failed,
}

#[derive(Debug)]
pub struct InverterBringup {
    state: BringupState,
    /// When the current state was entered. Each state records its own entry
    /// time; a waiting state must never inherit a predecessor's.
    state_entry_ms: u64,
    /// Last query transmission in the current waiting state. `None` right
    /// after entry so the first tick sends immediately.
    last_action_ms: Option<u64>,
    /// The enable command goes out exactly once per pass.
    enable_sent: bool,
}

impl InverterBringup {
    pub fn new() -> InverterBringup {
        InverterBringup {
            state: BringupState::CheckStatus,
            state_entry_ms: 0,
            last_action_ms: None,
            enable_sent: false,
        }
    }

    /// Rewinds to the start of the sequence. Called on every entry into an
    /// initializing drive state so a previous pass leaves nothing behind.
    pub fn reset(&mut self, now_ms: u64) {
        self.state = BringupState::CheckStatus;
        self.state_entry_ms = now_ms;
        self.last_action_ms = None;
        self.enable_sent = false;
    }

    fn enter(&mut self, state: BringupState, now_ms: u64) {
        debug!(from = ?self.state, to = ?state, "bring-up transition");
        self.state = state;
        self.state_entry_ms = now_ms;
        self.last_action_ms = None;
    }

    /// True when the waiting state's query is due, recording the send.
    fn action_due(&mut self, now_ms: u64, config: &ControlConfig) -> bool {
        let due = match self.last_action_ms {
            None => true,
            Some(last) => now_ms - last >= config.bringup_action_interval_ms,
        };
        if due {
            self.last_action_ms = Some(now_ms);
        }
        due
    }

    fn timed_out(&self, now_ms: u64, config: &ControlConfig) -> bool {
        now_ms - self.state_entry_ms >= config.bringup_timeout_ms
    }

    /// Advances the sequence by at most one transition.
    pub fn step(
        &mut self,
        now_ms: u64,
        state: &VehicleState,
        tx: &mut impl CanTx,
        config: &ControlConfig,
    ) -> Result<BringupStatus, BusError> {
        match self.state {
            BringupState::CheckStatus => {
                if state.btb_ready() {
                    self.enter(BringupState::Disable, now_ms);
                } else if self.timed_out(now_ms, config) {
                    warn!("bridge status never confirmed");
                    self.enter(BringupState::Error, now_ms);
                } else if self.action_due(now_ms, config) {
                    tx.request_register(reg::BTB_STATUS, READ_ONCE)?;
                }
            }
            BringupState::Disable => {
                tx.send_stop()?;
                self.enter(BringupState::EnableTransmission, now_ms);
            }
            BringupState::EnableTransmission => {
                if state.transmission_enabled() {
                    self.enter(BringupState::Enable, now_ms);
                    self.enable_sent = false;
                } else if self.timed_out(now_ms, config) {
                    warn!("cyclic transmission never confirmed");
                    self.enter(BringupState::Error, now_ms);
                } else if self.action_due(now_ms, config) {
                    tx.request_register(reg::TX_ENABLE, READ_ONCE)?;
                }
            }
            BringupState::Enable => {
                if !self.enable_sent {
                    tx.send_enable()?;
                    self.enable_sent = true;
                }
                self.enter(BringupState::RampAccel, now_ms);
            }
            BringupState::RampAccel => {
                tx.send_register_u16(reg::RAMP_ACC, config.bringup_ramp_acc_ms)?;
                self.enter(BringupState::RampDecel, now_ms);
            }
            BringupState::RampDecel => {
                tx.send_register_u16(reg::RAMP_DEC, config.bringup_ramp_dec_ms)?;
                self.enter(BringupState::ClearFaults, now_ms);
            }
            BringupState::ClearFaults => {
                tx.send_clear_faults()?;
                info!("inverter bring-up complete");
                self.enter(BringupState::Initialized, now_ms);
            }
            BringupState::Initialized | BringupState::Error => {}
        }

        Ok(match self.state {
            BringupState::Initialized => BringupStatus::Initialized,
            BringupState::Error => BringupStatus::Failed,
            _ => BringupStatus::InProgress,
        })
    }
}

impl Default for InverterBringup {
    fn default() -> InverterBringup {
        InverterBringup::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::frame::Frame;

    fn fixture() -> (InverterBringup, VehicleState, Vec<Frame>, ControlConfig) {
        (
            InverterBringup::new(),
            VehicleState::new(),
            Vec::new(),
            ControlConfig::default(),
        )
    }

    #[test]
    fn happy_path_command_order() {
        let (mut machine, state, mut tx, config) = fixture();

        // First tick queries the bridge status.
        assert_eq!(
            machine.step(0, &state, &mut tx, &config).unwrap(),
            BringupStatus::InProgress
        );
        assert_eq!(tx[0].data(), &[0x3D, 0xE2, 0x00]);

        state.set_btb_ready(true);
        machine.step(10, &state, &mut tx, &config).unwrap(); // -> Disable
        machine.step(20, &state, &mut tx, &config).unwrap(); // stop sent
        assert_eq!(tx[1].data(), &[0x51, 0x04, 0x00]);
        machine.step(30, &state, &mut tx, &config).unwrap(); // tx enable query
        assert_eq!(tx[2].data(), &[0x3D, 0xE8, 0x00]);

        state.set_transmission_enabled(true);
        machine.step(40, &state, &mut tx, &config).unwrap(); // -> Enable
        machine.step(50, &state, &mut tx, &config).unwrap(); // enable sent
        assert_eq!(tx[3].data(), &[0x51, 0x00, 0x00]);
        machine.step(60, &state, &mut tx, &config).unwrap();
        assert_eq!(tx[4].data(), &[0x35, 0xF4, 0x01]); // ramp acc 500
        machine.step(70, &state, &mut tx, &config).unwrap();
        assert_eq!(tx[5].data(), &[0xED, 0xE8, 0x03]); // ramp dec 1000
        assert_eq!(
            machine.step(80, &state, &mut tx, &config).unwrap(),
            BringupStatus::Initialized
        );
        assert_eq!(tx[6].data(), &[0x8E, 0x00, 0x00]);
        assert_eq!(tx.len(), 7);
    }

    #[test]
    fn initialized_is_re_entrant_and_quiet() {
        let (mut machine, state, mut tx, config) = fixture();
        state.set_btb_ready(true);
        state.set_transmission_enabled(true);
        for t in 0..8 {
            machine.step(t * 10, &state, &mut tx, &config).unwrap();
        }
        let sent = tx.len();
        assert_eq!(
            machine.step(1000, &state, &mut tx, &config).unwrap(),
            BringupStatus::Initialized
        );
        assert_eq!(tx.len(), sent);
    }

    #[test]
    fn waiting_state_resends_at_the_action_interval_only() {
        let (mut machine, state, mut tx, config) = fixture();

        machine.step(0, &state, &mut tx, &config).unwrap();
        assert_eq!(tx.len(), 1);
        // Before the interval: no resend.
        machine
            .step(config.bringup_action_interval_ms - 1, &state, &mut tx, &config)
            .unwrap();
        assert_eq!(tx.len(), 1);
        // At the interval: one resend.
        machine
            .step(config.bringup_action_interval_ms, &state, &mut tx, &config)
            .unwrap();
        assert_eq!(tx.len(), 2);
    }

    #[test]
    fn status_check_fails_exactly_at_the_timeout() {
        let (mut machine, state, mut tx, config) = fixture();

        machine.step(0, &state, &mut tx, &config).unwrap();
        assert_eq!(
            machine
                .step(config.bringup_timeout_ms - 1, &state, &mut tx, &config)
                .unwrap(),
            BringupStatus::InProgress
        );
        assert_eq!(
            machine
                .step(config.bringup_timeout_ms, &state, &mut tx, &config)
                .unwrap(),
            BringupStatus::Failed
        );
        // Failed is terminal until reset.
        assert_eq!(
            machine
                .step(config.bringup_timeout_ms + 500, &state, &mut tx, &config)
                .unwrap(),
            BringupStatus::Failed
        );
    }

    #[test]
    fn transmission_wait_times_from_its_own_entry() {
        let (mut machine, state, mut tx, config) = fixture();

        // Spend almost the whole timeout waiting on the bridge status.
        machine.step(0, &state, &mut tx, &config).unwrap();
        let late = config.bringup_timeout_ms - 10;
        state.set_btb_ready(true);
        machine.step(late, &state, &mut tx, &config).unwrap(); // -> Disable
        machine.step(late + 10, &state, &mut tx, &config).unwrap(); // -> EnableTransmission

        // The transmission wait must get its own full timeout.
        assert_eq!(
            machine
                .step(late + 20, &state, &mut tx, &config)
                .unwrap(),
            BringupStatus::InProgress
        );
        assert_eq!(
            machine
                .step(late + 10 + config.bringup_timeout_ms - 1, &state, &mut tx, &config)
                .unwrap(),
            BringupStatus::InProgress
        );
        assert_eq!(
            machine
                .step(late + 10 + config.bringup_timeout_ms, &state, &mut tx, &config)
                .unwrap(),
            BringupStatus::Failed
        );
    }

    #[test]
    fn reset_restarts_a_failed_pass() {
        let (mut machine, state, mut tx, config) = fixture();

        machine.step(0, &state, &mut tx, &config).unwrap();
        machine
            .step(config.bringup_timeout_ms, &state, &mut tx, &config)
            .unwrap();
        tx.clear();

        machine.reset(5000);
        assert_eq!(
            machine.step(5000, &state, &mut tx, &config).unwrap(),
            BringupStatus::InProgress
        );
        // Query goes out immediately on the first tick after reset.
        assert_eq!(tx[0].data(), &[0x3D, 0xE2, 0x00]);
    }
}
