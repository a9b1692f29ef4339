//! Named control constants. Every timeout, threshold and period the state
//! machines compare against lives here so tests can shrink them and tuning
//! never touches the machines themselves.

/// Raw controller unit ceiling for current setpoints.
pub const MAX_CURRENT_RAW: i32 = 16383;
/// Raw controller unit ceiling for speed setpoints.
pub const MAX_SPEED_RAW: i32 = 32767;

#[derive(Clone, Copy, Debug)]
pub struct ControlConfig {
    /// Scheduling loop period.
    pub tick_ms: u64,
    /// Bring-up: give up on a waiting state this long after entering it.
    pub bringup_timeout_ms: u64,
    /// Bring-up: re-send a waiting state's query at this cadence.
    pub bringup_action_interval_ms: u64,
    /// Ramp values pushed during bring-up.
    pub bringup_ramp_acc_ms: u16,
    pub bringup_ramp_dec_ms: u16,
    /// Ready-to-drive: the go signal must hold this long before it counts.
    pub ready_dwell_ms: u64,
    /// Ready-to-drive: minimum acceptable radio link quality (0-100).
    pub radio_quality_min: u8,
    /// Telemetry periods, independent per message kind.
    pub rpm_period_ms: u64,
    pub hydraulic_period_ms: u64,
    pub apps_period_ms: u64,
    pub widget_period_ms: u64,
    /// Pedal channel raw range used only for the throttle display mapping.
    pub apps_raw_lo: i32,
    pub apps_raw_hi: i32,
    /// Buzzer durations.
    pub emergency_buzzer_ms: u64,
    pub init_fault_buzzer_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> ControlConfig {
        ControlConfig {
            tick_ms: 10,
            bringup_timeout_ms: 2000,
            bringup_action_interval_ms: 100,
            bringup_ramp_acc_ms: 500,
            bringup_ramp_dec_ms: 1000,
            ready_dwell_ms: 1000,
            radio_quality_min: 50,
            rpm_period_ms: 10,
            hydraulic_period_ms: 100,
            apps_period_ms: 20,
            widget_period_ms: 100,
            apps_raw_lo: 0,
            apps_raw_hi: 4095,
            emergency_buzzer_ms: 8000,
            init_fault_buzzer_ms: 2000,
        }
    }
}

/// Operator-selected inverter operating mode. Selecting a mode re-sends the
/// full parameter set to the inverter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchMode {
    Setup,
    Stands,
    Limiter,
    BrakeTest,
    Skidpad,
    Endurance,
    MaxAttack,
}

impl SwitchMode {
    pub fn to_byte(&self) -> u8 {
        match self {
            SwitchMode::Setup => 0x00,
            SwitchMode::Stands => 0x01,
            SwitchMode::Limiter => 0x02,
            SwitchMode::BrakeTest => 0x03,
            SwitchMode::Skidpad => 0x04,
            SwitchMode::Endurance => 0x05,
            SwitchMode::MaxAttack => 0x06,
        }
    }

    pub fn from_byte(byte: u8) -> SwitchMode {
        match byte {
            0x01 => SwitchMode::Stands,
            0x02 => SwitchMode::Limiter,
            0x03 => SwitchMode::BrakeTest,
            0x04 => SwitchMode::Skidpad,
            0x05 => SwitchMode::Endurance,
            0x06 => SwitchMode::MaxAttack,
            _ => SwitchMode::Setup,
        }
    }
}

/// Inverter parameter set for one operating mode. Percent values are mapped
/// to raw controller units at encode time; ramp values are milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModeParams {
    pub i_max_peak_percent: i32,
    pub i_continuous_percent: i32,
    pub speed_limit_percent: i32,
    pub speed_ramp_acc_ms: u16,
    pub moment_ramp_acc_ms: u16,
    pub speed_ramp_brake_ms: u16,
    pub moment_ramp_dec_ms: u16,
}

/// Compiled-in per-mode parameter table. Persisted per-mode curves are out of
/// scope; these are the defaults the car leaves the pit with.
pub fn mode_params(mode: SwitchMode) -> ModeParams {
    match mode {
        SwitchMode::Setup => ModeParams {
            i_max_peak_percent: 10,
            i_continuous_percent: 10,
            speed_limit_percent: 10,
            speed_ramp_acc_ms: 1000,
            moment_ramp_acc_ms: 1000,
            speed_ramp_brake_ms: 500,
            moment_ramp_dec_ms: 500,
        },
        SwitchMode::Stands => ModeParams {
            i_max_peak_percent: 20,
            i_continuous_percent: 15,
            speed_limit_percent: 30,
            speed_ramp_acc_ms: 800,
            moment_ramp_acc_ms: 800,
            speed_ramp_brake_ms: 400,
            moment_ramp_dec_ms: 400,
        },
        SwitchMode::Limiter => ModeParams {
            i_max_peak_percent: 40,
            i_continuous_percent: 30,
            speed_limit_percent: 40,
            speed_ramp_acc_ms: 600,
            moment_ramp_acc_ms: 600,
            speed_ramp_brake_ms: 300,
            moment_ramp_dec_ms: 300,
        },
        SwitchMode::BrakeTest => ModeParams {
            i_max_peak_percent: 60,
            i_continuous_percent: 40,
            speed_limit_percent: 50,
            speed_ramp_acc_ms: 300,
            moment_ramp_acc_ms: 300,
            speed_ramp_brake_ms: 150,
            moment_ramp_dec_ms: 150,
        },
        SwitchMode::Skidpad => ModeParams {
            i_max_peak_percent: 70,
            i_continuous_percent: 50,
            speed_limit_percent: 60,
            speed_ramp_acc_ms: 400,
            moment_ramp_acc_ms: 400,
            speed_ramp_brake_ms: 200,
            moment_ramp_dec_ms: 200,
        },
        SwitchMode::Endurance => ModeParams {
            i_max_peak_percent: 80,
            i_continuous_percent: 60,
            speed_limit_percent: 90,
            speed_ramp_acc_ms: 350,
            moment_ramp_acc_ms: 350,
            speed_ramp_brake_ms: 200,
            moment_ramp_dec_ms: 200,
        },
        SwitchMode::MaxAttack => ModeParams {
            i_max_peak_percent: 100,
            i_continuous_percent: 80,
            speed_limit_percent: 100,
            speed_ramp_acc_ms: 250,
            moment_ramp_acc_ms: 250,
            speed_ramp_brake_ms: 150,
            moment_ramp_dec_ms: 150,
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn switch_mode_byte_round_trip() {
        for byte in 0u8..7 {
            assert_eq!(SwitchMode::from_byte(byte).to_byte(), byte);
        }
    }

    #[test]
    fn unknown_mode_byte_falls_back_to_setup() {
        assert_eq!(SwitchMode::from_byte(0xFF), SwitchMode::Setup);
    }

    #[test]
    fn mode_table_percentages_stay_in_range() {
        for mode in [
            SwitchMode::Setup,
            SwitchMode::Stands,
            SwitchMode::Limiter,
            SwitchMode::BrakeTest,
            SwitchMode::Skidpad,
            SwitchMode::Endurance,
            SwitchMode::MaxAttack,
        ] {
            let params = mode_params(mode);
            assert!((0..=100).contains(&params.i_max_peak_percent));
            assert!((0..=100).contains(&params.i_continuous_percent));
            assert!((0..=100).contains(&params.speed_limit_percent));
        }
    }
}
