//! Frame builders layered over [`CanTx`], in the style of extension traits on
//! the raw socket. Everything here encodes through the codec primitives; the
//! byte layouts are the inverter's register protocol and the dash telemetry
//! channel.

use super::{BusError, CanTx};
use crate::can_ids::{
    reg, tag, DASH_TELEMETRY_ID, ENABLE_OFF, ENABLE_ON, INVERTER_COMMAND_ID, READ_EVERY_100MS,
};
use crate::codec::{encode_fixed_point_speed, encode_i32_le, encode_u16_le};
use crate::frame::Frame;

/// Inverter command channel: disable/enable, register reads, setpoints.
pub trait InverterCommands: CanTx {
    /// Drive disabled, enable internally switched off. The unconditional
    /// stop used by every safety path.
    fn send_stop(&mut self) -> Result<(), BusError> {
        self.send(&Frame::new(
            INVERTER_COMMAND_ID,
            &[reg::ENABLE, ENABLE_OFF, 0x00],
        )?)
    }

    /// Removes the internal disable so the drive accepts torque.
    fn send_enable(&mut self) -> Result<(), BusError> {
        self.send(&Frame::new(
            INVERTER_COMMAND_ID,
            &[reg::ENABLE, ENABLE_ON, 0x00],
        )?)
    }

    fn send_torque(&mut self, torque: i16) -> Result<(), BusError> {
        let [lo, hi] = encode_u16_le(torque as u16);
        self.send(&Frame::new(INVERTER_COMMAND_ID, &[reg::TORQUE, lo, hi])?)
    }

    /// Requests a register, once or at the given cyclic cadence.
    fn request_register(&mut self, register: u8, cadence: u8) -> Result<(), BusError> {
        self.send(&Frame::new(
            INVERTER_COMMAND_ID,
            &[reg::READ_REQUEST, register, cadence],
        )?)
    }

    /// Writes a plain 16-bit register value.
    fn send_register_u16(&mut self, register: u8, value: u16) -> Result<(), BusError> {
        let [lo, hi] = encode_u16_le(value);
        self.send(&Frame::new(INVERTER_COMMAND_ID, &[register, lo, hi])?)
    }

    /// Writes a speed-ramp/moment-ramp millisecond pair.
    fn send_ramp_pair(
        &mut self,
        register: u8,
        speed_ms: u16,
        moment_ms: u16,
    ) -> Result<(), BusError> {
        let [s_lo, s_hi] = encode_u16_le(speed_ms);
        let [m_lo, m_hi] = encode_u16_le(moment_ms);
        self.send(&Frame::new(
            INVERTER_COMMAND_ID,
            &[register, s_lo, s_hi, m_lo, m_hi],
        )?)
    }

    fn send_clear_faults(&mut self) -> Result<(), BusError> {
        self.send(&Frame::new(
            INVERTER_COMMAND_ID,
            &[reg::CLEAR_FAULTS, 0x00, 0x00],
        )?)
    }

    /// Cyclic read requests for every register the node tracks. The inverter
    /// volunteers nothing; without this burst the response channel stays
    /// silent. The controller accepts at most eight standing requests.
    fn request_cyclic_readbacks(&mut self) -> Result<(), BusError> {
        for register in [
            reg::DC_VOLTAGE,
            reg::I_MAX_PEAK,
            reg::SPEED_LIMIT,
            reg::I_CONTINUOUS,
            reg::RAMP_ACC,
            reg::RAMP_DEC,
            reg::SPEED_ACTUAL,
        ] {
            self.request_register(register, READ_EVERY_100MS)?;
        }
        Ok(())
    }
}

impl<T: CanTx + ?Sized> InverterCommands for T {}

/// Outbound dash telemetry channel.
pub trait DashTelemetry: CanTx {
    fn send_wheel_rpm(&mut self, wheel_tag: u8, rpm: f32) -> Result<(), BusError> {
        let [b0, b1, b2, b3] = encode_fixed_point_speed(rpm);
        self.send(&Frame::new(
            DASH_TELEMETRY_ID,
            &[wheel_tag, b0, b1, b2, b3],
        )?)
    }

    fn send_hydraulic_pressure(&mut self, pressure: u16) -> Result<(), BusError> {
        let [lo, hi] = encode_u16_le(pressure);
        self.send(&Frame::new(
            DASH_TELEMETRY_ID,
            &[tag::HYDRAULIC_LINE, lo, hi],
        )?)
    }

    fn send_apps_channel(&mut self, channel_tag: u8, raw: i32) -> Result<(), BusError> {
        let [b0, b1, b2, b3] = encode_i32_le(raw);
        self.send(&Frame::new(
            DASH_TELEMETRY_ID,
            &[channel_tag, b0, b1, b2, b3],
        )?)
    }
}

impl<T: CanTx + ?Sized> DashTelemetry for T {}
