//! Shared record of decoded physical quantities and derived flags.
//!
//! One instance lives for the whole process and is shared between the frame
//! reception context and the scheduling loop. Every field has exactly one
//! writer: the dispatcher owns the telemetry and safety fields, the state
//! machines own the mode and command fields. Fields are individual atomics so
//! the reception context never takes a lock and the loop never reads a torn
//! multi-byte value.

use std::sync::atomic::{
    AtomicBool, AtomicI32, AtomicU16, AtomicU32, AtomicU64, AtomicU8, Ordering,
};

use crate::config::SwitchMode;

/// Sentinel for "the go signal is not currently held".
const GO_NOT_HELD: u64 = u64::MAX;

#[derive(Debug)]
pub struct VehicleState {
    // Inverter telemetry, written by the dispatcher.
    bus_voltage: AtomicI32,
    ts_energized: AtomicBool,
    actual_speed: AtomicI32,
    btb_ready: AtomicBool,
    transmission_enabled: AtomicBool,
    // Chassis telemetry, written by the dispatcher.
    fl_rpm_bits: AtomicU32,
    fr_rpm_bits: AtomicU32,
    hydraulic_pressure: AtomicU16,
    apps_higher: AtomicI32,
    apps_lower: AtomicI32,
    // Safety status, written by the dispatcher.
    emergency: AtomicBool,
    ready_to_drive: AtomicBool,
    radio_quality: AtomicU8,
    go_signal_since_ms: AtomicU64,
    soc: AtomicU8,
    min_cell_temp: AtomicU8,
    max_cell_temp: AtomicU8,
    asms_on: AtomicBool,
    as_state: AtomicU8,
    // Mode and command fields, written by the scheduling loop.
    commanded_torque: AtomicI32,
    switch_mode: AtomicU8,
    drive_state: AtomicU8,
}

impl VehicleState {
    pub fn new() -> VehicleState {
        VehicleState {
            bus_voltage: AtomicI32::new(0),
            ts_energized: AtomicBool::new(false),
            actual_speed: AtomicI32::new(0),
            btb_ready: AtomicBool::new(false),
            transmission_enabled: AtomicBool::new(false),
            fl_rpm_bits: AtomicU32::new(0f32.to_bits()),
            fr_rpm_bits: AtomicU32::new(0f32.to_bits()),
            hydraulic_pressure: AtomicU16::new(0),
            apps_higher: AtomicI32::new(0),
            apps_lower: AtomicI32::new(0),
            emergency: AtomicBool::new(false),
            ready_to_drive: AtomicBool::new(false),
            radio_quality: AtomicU8::new(0),
            go_signal_since_ms: AtomicU64::new(GO_NOT_HELD),
            soc: AtomicU8::new(0),
            min_cell_temp: AtomicU8::new(0),
            max_cell_temp: AtomicU8::new(0),
            asms_on: AtomicBool::new(false),
            as_state: AtomicU8::new(0),
            commanded_torque: AtomicI32::new(0),
            switch_mode: AtomicU8::new(SwitchMode::Setup.to_byte()),
            drive_state: AtomicU8::new(0),
        }
    }

    pub fn bus_voltage(&self) -> i32 {
        self.bus_voltage.load(Ordering::Relaxed)
    }

    pub fn set_bus_voltage(&self, raw: i32) {
        self.bus_voltage.store(raw, Ordering::Relaxed);
    }

    pub fn ts_energized(&self) -> bool {
        self.ts_energized.load(Ordering::Relaxed)
    }

    pub fn set_ts_energized(&self, on: bool) {
        self.ts_energized.store(on, Ordering::Relaxed);
    }

    pub fn actual_speed(&self) -> i32 {
        self.actual_speed.load(Ordering::Relaxed)
    }

    pub fn set_actual_speed(&self, speed: i32) {
        self.actual_speed.store(speed, Ordering::Relaxed);
    }

    pub fn btb_ready(&self) -> bool {
        self.btb_ready.load(Ordering::Relaxed)
    }

    pub fn set_btb_ready(&self, ready: bool) {
        self.btb_ready.store(ready, Ordering::Relaxed);
    }

    pub fn transmission_enabled(&self) -> bool {
        self.transmission_enabled.load(Ordering::Relaxed)
    }

    pub fn set_transmission_enabled(&self, enabled: bool) {
        self.transmission_enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn fl_rpm(&self) -> f32 {
        f32::from_bits(self.fl_rpm_bits.load(Ordering::Relaxed))
    }

    pub fn set_fl_rpm(&self, rpm: f32) {
        self.fl_rpm_bits.store(rpm.to_bits(), Ordering::Relaxed);
    }

    pub fn fr_rpm(&self) -> f32 {
        f32::from_bits(self.fr_rpm_bits.load(Ordering::Relaxed))
    }

    pub fn set_fr_rpm(&self, rpm: f32) {
        self.fr_rpm_bits.store(rpm.to_bits(), Ordering::Relaxed);
    }

    pub fn hydraulic_pressure(&self) -> u16 {
        self.hydraulic_pressure.load(Ordering::Relaxed)
    }

    pub fn set_hydraulic_pressure(&self, pressure: u16) {
        self.hydraulic_pressure.store(pressure, Ordering::Relaxed);
    }

    pub fn apps_higher(&self) -> i32 {
        self.apps_higher.load(Ordering::Relaxed)
    }

    pub fn set_apps_higher(&self, raw: i32) {
        self.apps_higher.store(raw, Ordering::Relaxed);
    }

    pub fn apps_lower(&self) -> i32 {
        self.apps_lower.load(Ordering::Relaxed)
    }

    pub fn set_apps_lower(&self, raw: i32) {
        self.apps_lower.store(raw, Ordering::Relaxed);
    }

    pub fn emergency(&self) -> bool {
        self.emergency.load(Ordering::Relaxed)
    }

    /// Returns the previous value so the caller can detect the edge.
    pub fn set_emergency(&self, active: bool) -> bool {
        self.emergency.swap(active, Ordering::Relaxed)
    }

    pub fn ready_to_drive(&self) -> bool {
        self.ready_to_drive.load(Ordering::Relaxed)
    }

    pub fn set_ready_to_drive(&self, ready: bool) {
        self.ready_to_drive.store(ready, Ordering::Relaxed);
    }

    pub fn radio_quality(&self) -> u8 {
        self.radio_quality.load(Ordering::Relaxed)
    }

    pub fn set_radio_quality(&self, quality: u8) {
        self.radio_quality.store(quality, Ordering::Relaxed);
    }

    /// Records that the go signal is held, keeping the timestamp of the first
    /// reception in the current streak. Returns that first timestamp.
    pub fn mark_go_signal(&self, now_ms: u64) -> u64 {
        match self.go_signal_since_ms.compare_exchange(
            GO_NOT_HELD,
            now_ms,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => now_ms,
            Err(since) => since,
        }
    }

    pub fn clear_go_signal(&self) {
        self.go_signal_since_ms.store(GO_NOT_HELD, Ordering::Relaxed);
    }

    pub fn go_signal_since(&self) -> Option<u64> {
        match self.go_signal_since_ms.load(Ordering::Relaxed) {
            GO_NOT_HELD => None,
            since => Some(since),
        }
    }

    pub fn soc(&self) -> u8 {
        self.soc.load(Ordering::Relaxed)
    }

    pub fn set_soc(&self, soc: u8) {
        self.soc.store(soc, Ordering::Relaxed);
    }

    pub fn cell_temps(&self) -> (u8, u8) {
        (
            self.min_cell_temp.load(Ordering::Relaxed),
            self.max_cell_temp.load(Ordering::Relaxed),
        )
    }

    pub fn set_cell_temps(&self, min: u8, max: u8) {
        self.min_cell_temp.store(min, Ordering::Relaxed);
        self.max_cell_temp.store(max, Ordering::Relaxed);
    }

    pub fn asms_on(&self) -> bool {
        self.asms_on.load(Ordering::Relaxed)
    }

    pub fn set_asms_on(&self, on: bool) {
        self.asms_on.store(on, Ordering::Relaxed);
    }

    pub fn as_state(&self) -> u8 {
        self.as_state.load(Ordering::Relaxed)
    }

    pub fn set_as_state(&self, state: u8) {
        self.as_state.store(state, Ordering::Relaxed);
    }

    pub fn commanded_torque(&self) -> i16 {
        self.commanded_torque.load(Ordering::Relaxed) as i16
    }

    pub fn set_commanded_torque(&self, torque: i16) {
        self.commanded_torque.store(torque as i32, Ordering::Relaxed);
    }

    pub fn switch_mode(&self) -> SwitchMode {
        SwitchMode::from_byte(self.switch_mode.load(Ordering::Relaxed))
    }

    pub fn set_switch_mode(&self, mode: SwitchMode) {
        self.switch_mode.store(mode.to_byte(), Ordering::Relaxed);
    }

    pub fn drive_state_byte(&self) -> u8 {
        self.drive_state.load(Ordering::Relaxed)
    }

    pub fn set_drive_state_byte(&self, byte: u8) {
        self.drive_state.store(byte, Ordering::Relaxed);
    }

    /// Single load-tear-safe copy for observers that want a coherent-enough
    /// view without reading field by field at their own pace.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            bus_voltage: self.bus_voltage(),
            ts_energized: self.ts_energized(),
            actual_speed: self.actual_speed(),
            fl_rpm: self.fl_rpm(),
            fr_rpm: self.fr_rpm(),
            hydraulic_pressure: self.hydraulic_pressure(),
            apps_higher: self.apps_higher(),
            apps_lower: self.apps_lower(),
            emergency: self.emergency(),
            ready_to_drive: self.ready_to_drive(),
            radio_quality: self.radio_quality(),
            soc: self.soc(),
            cell_temps: self.cell_temps(),
            commanded_torque: self.commanded_torque(),
            switch_mode: self.switch_mode(),
            drive_state: self.drive_state_byte(),
        }
    }
}

impl Default for VehicleState {
    fn default() -> VehicleState {
        VehicleState::new()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct StateSnapshot {
    pub bus_voltage: i32,
    pub ts_energized: bool,
    pub actual_speed: i32,
    pub fl_rpm: f32,
    pub fr_rpm: f32,
    pub hydraulic_pressure: u16,
    pub apps_higher: i32,
    pub apps_lower: i32,
    pub emergency: bool,
    pub ready_to_drive: bool,
    pub radio_quality: u8,
    pub soc: u8,
    pub cell_temps: (u8, u8),
    pub commanded_torque: i16,
    pub switch_mode: SwitchMode,
    pub drive_state: u8,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn go_signal_keeps_first_timestamp() {
        let state = VehicleState::new();
        assert_eq!(state.go_signal_since(), None);
        assert_eq!(state.mark_go_signal(100), 100);
        assert_eq!(state.mark_go_signal(400), 100);
        assert_eq!(state.go_signal_since(), Some(100));
        state.clear_go_signal();
        assert_eq!(state.go_signal_since(), None);
        assert_eq!(state.mark_go_signal(900), 900);
    }

    #[test]
    fn emergency_swap_reports_previous_value() {
        let state = VehicleState::new();
        assert!(!state.set_emergency(true));
        assert!(state.set_emergency(true));
        assert!(state.set_emergency(false));
        assert!(!state.emergency());
    }

    #[test]
    fn wheel_speed_survives_bit_store() {
        let state = VehicleState::new();
        state.set_fl_rpm(20.48);
        state.set_fr_rpm(-0.0);
        assert_eq!(state.fl_rpm(), 20.48);
        assert_eq!(state.fr_rpm(), 0.0);
    }

    #[test]
    fn snapshot_copies_current_values() {
        let state = VehicleState::new();
        state.set_bus_voltage(4353);
        state.set_ts_energized(true);
        state.set_hydraulic_pressure(257);
        state.set_commanded_torque(-42);
        let snap = state.snapshot();
        assert_eq!(snap.bus_voltage, 4353);
        assert!(snap.ts_energized);
        assert_eq!(snap.hydraulic_pressure, 257);
        assert_eq!(snap.commanded_torque, -42);
    }
}
