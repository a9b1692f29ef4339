//! Inbound message dispatch: identifier first, then the sub-tag in the first
//! payload byte. Decoding is a pure function from frame to [`BusEvent`];
//! applying an event writes the state store. The reception context calls
//! [`handle_frame`] and nothing else.
//!
//! Unknown identifiers and unknown sub-tags are silently ignored; frames
//! shorter than the selected field requires are dropped without mutating
//! state. Unrecognized traffic must never fault the node.

use tracing::{debug, trace, warn};

use crate::can_ids::{
    self, reg, res, tag, BMS_THERMISTOR_ID, CHASSIS_REPORT_ID, INVERTER_RESPONSE_ID,
    MASTER_STATUS_ID, RES_STATUS_ID,
};
use crate::codec::{
    decode_i16_le, decode_i32_le, decode_u16_le, decode_u32_le, map_range, match_sequence,
};
use crate::config::{ControlConfig, MAX_CURRENT_RAW, MAX_SPEED_RAW};
use crate::frame::Frame;
use crate::vehicle_state::VehicleState;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Wheel {
    Left,
    Right,
}

/// One recognized inbound message, decoupled from the byte layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BusEvent {
    CellTemps { min: u8, max: u8 },
    BusVoltage(i32),
    BtbReady(bool),
    TransmissionEnabled(bool),
    ActualSpeed(i32),
    HydraulicPressure(u16),
    WheelRpm { wheel: Wheel, rpm: f32 },
    AsmsSwitch(bool),
    StateOfCharge(u8),
    AutonomousState(u8),
    SafetyStatus { emergency: bool, go_signal: bool, radio_quality: u8 },
    Ignored,
}

/// First dispatch level: identifier.
pub fn decode(frame: &Frame) -> BusEvent {
    match frame.id() {
        BMS_THERMISTOR_ID => decode_thermistor(frame.data()),
        INVERTER_RESPONSE_ID => decode_inverter_response(frame.data()),
        MASTER_STATUS_ID => decode_node_status(frame.data()),
        CHASSIS_REPORT_ID => decode_chassis_report(frame.data()),
        RES_STATUS_ID => decode_safety_status(frame.data()),
        id => {
            trace!(id, "ignoring unknown identifier");
            BusEvent::Ignored
        }
    }
}

fn decode_thermistor(data: &[u8]) -> BusEvent {
    if data.len() < 8 {
        debug!("thermistor report too short");
        return BusEvent::Ignored;
    }
    BusEvent::CellTemps {
        min: data[1],
        max: data[2],
    }
}

/// The inverter multiplexes every register over one identifier. Payload
/// length 4 carries a 16-bit signed value in bytes 1-2, length 6 a 32-bit
/// signed value in bytes 1-4; any other length is only sequence-matched.
fn decode_inverter_response(data: &[u8]) -> BusEvent {
    let register = match data.first() {
        Some(&register) => register,
        None => return BusEvent::Ignored,
    };
    let value = match data.len() {
        4 => Some(decode_i16_le(data[1], data[2]) as i32),
        6 => Some(decode_i32_le(data[1], data[2], data[3], data[4])),
        _ => None,
    };

    match register {
        reg::DC_VOLTAGE => match value {
            Some(raw) => BusEvent::BusVoltage(raw),
            None => BusEvent::Ignored,
        },
        reg::BTB_STATUS => {
            BusEvent::BtbReady(match_sequence(data, &can_ids::BTB_READY_SEQUENCE))
        }
        reg::TX_ENABLE => {
            BusEvent::TransmissionEnabled(match_sequence(data, &can_ids::TX_ENABLED_SEQUENCE))
        }
        reg::SPEED_ACTUAL => match value {
            Some(raw) => BusEvent::ActualSpeed(raw),
            None => BusEvent::Ignored,
        },
        reg::SPEED_LIMIT => {
            if let Some(raw) = value {
                debug!(
                    percent = map_range(raw, 0, MAX_SPEED_RAW, 0, 100),
                    "speed limit readback"
                );
            }
            BusEvent::Ignored
        }
        reg::I_MAX_PEAK | reg::I_CONTINUOUS => {
            if let Some(raw) = value {
                debug!(
                    register,
                    percent = map_range(raw, 0, MAX_CURRENT_RAW, 0, 100),
                    "current limit readback"
                );
            }
            BusEvent::Ignored
        }
        register => {
            trace!(register, "ignoring unknown inverter register");
            BusEvent::Ignored
        }
    }
}

fn decode_node_status(data: &[u8]) -> BusEvent {
    match data.first() {
        Some(&tag::HYDRAULIC_LINE) if data.len() >= 3 => {
            BusEvent::HydraulicPressure(decode_u16_le(data[1], data[2]))
        }
        Some(&tag::ASMS) if data.len() >= 2 => BusEvent::AsmsSwitch(data[1] != 0),
        Some(&tag::SOC) if data.len() >= 2 => BusEvent::StateOfCharge(data[1]),
        Some(&tag::AS_STATE) if data.len() >= 2 => BusEvent::AutonomousState(data[1]),
        Some(&sub_tag) => {
            trace!(sub_tag, "ignoring unknown node status tag");
            BusEvent::Ignored
        }
        None => BusEvent::Ignored,
    }
}

fn decode_chassis_report(data: &[u8]) -> BusEvent {
    match data.first() {
        Some(&tag::HYDRAULIC_LINE) if data.len() >= 3 => {
            BusEvent::HydraulicPressure(decode_u16_le(data[1], data[2]))
        }
        Some(&tag::LEFT_WHEEL) if data.len() >= 5 => wheel_event(Wheel::Left, data),
        Some(&tag::RIGHT_WHEEL) if data.len() >= 5 => wheel_event(Wheel::Right, data),
        Some(&sub_tag) => {
            trace!(sub_tag, "ignoring unknown chassis report tag");
            BusEvent::Ignored
        }
        None => BusEvent::Ignored,
    }
}

fn wheel_event(wheel: Wheel, data: &[u8]) -> BusEvent {
    // 32-bit fixed point, hundredths of an rpm. Same width and scale as the
    // outbound wheel frames.
    let rpm = decode_u32_le(data[1], data[2], data[3], data[4]) as f32 / 100.0;
    BusEvent::WheelRpm { wheel, rpm }
}

fn decode_safety_status(data: &[u8]) -> BusEvent {
    if data.len() < 8 {
        debug!("safety receiver frame too short");
        return BusEvent::Ignored;
    }
    // Emergency bits are active low: either cleared bit means emergency.
    let emergency =
        data[0] & res::EMERGENCY_BIT == 0 || data[3] & res::LINK_OK_BIT == 0;
    BusEvent::SafetyStatus {
        emergency,
        go_signal: data[0] & res::GO_BIT != 0,
        radio_quality: data[res::RADIO_QUALITY_BYTE],
    }
}

/// Second step: write the recognized message into the state store. Runs in
/// the reception context, so every arm is a handful of scalar writes.
pub fn apply(state: &VehicleState, event: BusEvent, now_ms: u64, config: &ControlConfig) {
    match event {
        BusEvent::CellTemps { min, max } => state.set_cell_temps(min, max),
        BusEvent::BusVoltage(raw) => {
            state.set_bus_voltage(raw);
            state.set_ts_energized(raw >= can_ids::DC_VOLTAGE_THRESHOLD);
        }
        BusEvent::BtbReady(ready) => state.set_btb_ready(ready),
        BusEvent::TransmissionEnabled(enabled) => state.set_transmission_enabled(enabled),
        BusEvent::ActualSpeed(speed) => state.set_actual_speed(speed),
        BusEvent::HydraulicPressure(pressure) => state.set_hydraulic_pressure(pressure),
        BusEvent::WheelRpm { wheel, rpm } => match wheel {
            Wheel::Left => state.set_fl_rpm(rpm),
            Wheel::Right => state.set_fr_rpm(rpm),
        },
        BusEvent::AsmsSwitch(on) => state.set_asms_on(on),
        BusEvent::StateOfCharge(soc) => state.set_soc(soc),
        BusEvent::AutonomousState(as_state) => state.set_as_state(as_state),
        BusEvent::SafetyStatus {
            emergency,
            go_signal,
            radio_quality,
        } => {
            let was_emergency = state.set_emergency(emergency);
            if emergency && !was_emergency {
                warn!("emergency signal raised");
            }
            state.set_radio_quality(radio_quality);
            // Link quality and the dwell timer gate independently; both must
            // hold right now.
            let ready = if go_signal {
                let since = state.mark_go_signal(now_ms);
                radio_quality >= config.radio_quality_min
                    && now_ms - since >= config.ready_dwell_ms
            } else {
                state.clear_go_signal();
                false
            };
            state.set_ready_to_drive(ready);
        }
        BusEvent::Ignored => {}
    }
}

pub fn handle_frame(state: &VehicleState, frame: &Frame, now_ms: u64, config: &ControlConfig) {
    apply(state, decode(frame), now_ms, config);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::can_ids::{DASH_TELEMETRY_ID, INVERTER_COMMAND_ID};

    fn state_and_config() -> (VehicleState, ControlConfig) {
        (VehicleState::new(), ControlConfig::default())
    }

    fn inverter_frame(data: &[u8]) -> Frame {
        Frame::new(INVERTER_RESPONSE_ID, data).unwrap()
    }

    #[test]
    fn bus_voltage_sets_energized_flag_per_sample() {
        let (state, config) = state_and_config();

        let high = inverter_frame(&[reg::DC_VOLTAGE, 0x01, 0x11, 0x00]);
        handle_frame(&state, &high, 0, &config);
        assert_eq!(state.bus_voltage(), 0x1101);
        assert!(state.ts_energized());

        let low = inverter_frame(&[reg::DC_VOLTAGE, 0x01, 0x01, 0x00]);
        handle_frame(&state, &low, 0, &config);
        assert_eq!(state.bus_voltage(), 0x0101);
        assert!(!state.ts_energized());
    }

    #[test]
    fn inverter_scalar_lengths() {
        // Length 4: 16-bit signed from bytes 1-2.
        assert_eq!(
            decode(&inverter_frame(&[reg::SPEED_ACTUAL, 0xFE, 0xFF, 0x00])),
            BusEvent::ActualSpeed(-2)
        );
        // Length 6: 32-bit signed from bytes 1-4.
        assert_eq!(
            decode(&inverter_frame(&[reg::SPEED_ACTUAL, 0x74, 0x87, 0x01, 0x00, 0x00])),
            BusEvent::ActualSpeed(100_212)
        );
        // Any other length is not a scalar.
        assert_eq!(
            decode(&inverter_frame(&[reg::SPEED_ACTUAL, 0x01])),
            BusEvent::Ignored
        );
    }

    #[test]
    fn btb_ready_requires_the_full_sequence() {
        let (state, config) = state_and_config();

        handle_frame(
            &state,
            &inverter_frame(&[reg::BTB_STATUS, 0x00, 0x00, 0x00]),
            0,
            &config,
        );
        assert!(!state.btb_ready());

        handle_frame(
            &state,
            &inverter_frame(&[reg::BTB_STATUS, 0x01, 0x00, 0x00]),
            0,
            &config,
        );
        assert!(state.btb_ready());
    }

    #[test]
    fn transmission_enable_sequence() {
        let (state, config) = state_and_config();
        handle_frame(
            &state,
            &inverter_frame(&[reg::TX_ENABLE, 0x01, 0x00, 0x00]),
            0,
            &config,
        );
        assert!(state.transmission_enabled());
    }

    #[test]
    fn node_status_routes_by_sub_tag() {
        let (state, config) = state_and_config();
        let status = |data: &[u8]| Frame::new(MASTER_STATUS_ID, data).unwrap();

        handle_frame(&state, &status(&[tag::HYDRAULIC_LINE, 0x01, 0x01]), 0, &config);
        assert_eq!(state.hydraulic_pressure(), 257);

        handle_frame(&state, &status(&[tag::ASMS, 0x01]), 0, &config);
        assert!(state.asms_on());

        handle_frame(&state, &status(&[tag::SOC, 87]), 0, &config);
        assert_eq!(state.soc(), 87);

        handle_frame(&state, &status(&[tag::AS_STATE, 0x03]), 0, &config);
        assert_eq!(state.as_state(), 0x03);
    }

    #[test]
    fn chassis_wheel_speed_is_fixed_point_hundredths() {
        let (state, config) = state_and_config();
        let frame = Frame::new(
            CHASSIS_REPORT_ID,
            &[tag::RIGHT_WHEEL, 0x00, 0x08, 0x00, 0x00],
        )
        .unwrap();
        handle_frame(&state, &frame, 0, &config);
        assert!((state.fr_rpm() - 20.48).abs() < 1e-3);
        assert_eq!(state.fl_rpm(), 0.0);
    }

    #[test]
    fn wheel_speed_uses_all_four_value_bytes() {
        let (state, config) = state_and_config();
        // 100212 hundredths: needs more than the low half-word.
        let frame = Frame::new(
            CHASSIS_REPORT_ID,
            &[tag::LEFT_WHEEL, 0x74, 0x87, 0x01, 0x00],
        )
        .unwrap();
        handle_frame(&state, &frame, 0, &config);
        assert!((state.fl_rpm() - 1002.12).abs() < 1e-2);
    }

    #[test]
    fn short_wheel_report_is_dropped() {
        let (state, config) = state_and_config();
        let short = Frame::new(CHASSIS_REPORT_ID, &[tag::LEFT_WHEEL, 0x74, 0x87]).unwrap();
        handle_frame(&state, &short, 0, &config);
        assert_eq!(state.fl_rpm(), 0.0);
    }

    #[test]
    fn thermistor_report_short_frame_is_dropped() {
        let (state, config) = state_and_config();
        let short = Frame::new(BMS_THERMISTOR_ID, &[0x00, 10, 35]).unwrap();
        handle_frame(&state, &short, 0, &config);
        assert_eq!(state.cell_temps(), (0, 0));

        let full = Frame::new(BMS_THERMISTOR_ID, &[0x00, 10, 35, 0, 0, 0, 0, 0]).unwrap();
        handle_frame(&state, &full, 0, &config);
        assert_eq!(state.cell_temps(), (10, 35));
    }

    #[test]
    fn unknown_traffic_is_ignored() {
        assert_eq!(
            decode(&Frame::new(0x7FF, &[0x01, 0x02]).unwrap()),
            BusEvent::Ignored
        );
        // Our own outbound identifiers are not inbound messages.
        assert_eq!(
            decode(&Frame::new(DASH_TELEMETRY_ID, &[tag::FL_RPM, 0, 0, 0, 0]).unwrap()),
            BusEvent::Ignored
        );
        assert_eq!(
            decode(&Frame::new(INVERTER_COMMAND_ID, &[reg::TORQUE, 0, 0]).unwrap()),
            BusEvent::Ignored
        );
        // Unknown sub-tag on a known identifier.
        assert_eq!(
            decode(&Frame::new(MASTER_STATUS_ID, &[0x7E, 0x01]).unwrap()),
            BusEvent::Ignored
        );
    }

    fn res_frame(byte0: u8, byte3: u8, quality: u8) -> Frame {
        Frame::new(
            RES_STATUS_ID,
            &[byte0, 0x00, 0x00, byte3, 0x00, 0x00, quality, 0x00],
        )
        .unwrap()
    }

    #[test]
    fn emergency_is_reactive_and_active_low() {
        let (state, config) = state_and_config();

        // Go bit set but emergency bit (active low) cleared.
        handle_frame(&state, &res_frame(0x02, 0x00, 0), 0, &config);
        assert!(state.emergency());
        assert!(!state.ready_to_drive());

        // Both ok bits set: no emergency.
        handle_frame(&state, &res_frame(0x03, 0x80, 100), 10, &config);
        assert!(!state.emergency());
    }

    #[test]
    fn ready_to_drive_waits_for_the_dwell_time() {
        let (state, config) = state_and_config();
        let nominal = res_frame(0x03, 0x80, 100);

        handle_frame(&state, &nominal, 0, &config);
        assert!(!state.ready_to_drive(), "must not be ready before the dwell");

        handle_frame(&state, &nominal, config.ready_dwell_ms - 1, &config);
        assert!(!state.ready_to_drive());

        handle_frame(&state, &nominal, config.ready_dwell_ms, &config);
        assert!(state.ready_to_drive());
    }

    #[test]
    fn ready_to_drive_needs_link_quality_too() {
        let (state, config) = state_and_config();

        handle_frame(&state, &res_frame(0x03, 0x80, 0), 0, &config);
        handle_frame(
            &state,
            &res_frame(0x03, 0x80, 0),
            config.ready_dwell_ms + 500,
            &config,
        );
        assert!(!state.ready_to_drive(), "poor link must gate readiness");

        // Same dwell streak, link recovers.
        handle_frame(
            &state,
            &res_frame(0x03, 0x80, 100),
            config.ready_dwell_ms + 600,
            &config,
        );
        assert!(state.ready_to_drive());
    }

    #[test]
    fn dropping_the_go_bit_restarts_the_dwell() {
        let (state, config) = state_and_config();

        handle_frame(&state, &res_frame(0x03, 0x80, 100), 0, &config);
        handle_frame(&state, &res_frame(0x01, 0x80, 100), 500, &config);
        assert!(!state.ready_to_drive());

        // Go bit returns; old streak must not count.
        handle_frame(&state, &res_frame(0x03, 0x80, 100), 600, &config);
        handle_frame(
            &state,
            &res_frame(0x03, 0x80, 100),
            600 + config.ready_dwell_ms - 1,
            &config,
        );
        assert!(!state.ready_to_drive());
        handle_frame(
            &state,
            &res_frame(0x03, 0x80, 100),
            600 + config.ready_dwell_ms,
            &config,
        );
        assert!(state.ready_to_drive());
    }
}
