//! Protocol constants for the fixed, versioned message set.
//!
//! Values observed from bus traffic; the energized threshold and the
//! safety-receiver bit layout still need confirmation against the
//! authoritative protocol document.

/// Battery monitor thermistor broadcast.
pub const BMS_THERMISTOR_ID: u16 = 0x306;
/// Traction inverter response channel (register-multiplexed).
pub const INVERTER_RESPONSE_ID: u16 = 0x181;
/// Traction inverter command channel.
pub const INVERTER_COMMAND_ID: u16 = 0x201;
/// Master node status channel (hydraulic/ASMS/SOC/autonomous state).
pub const MASTER_STATUS_ID: u16 = 0x300;
/// Chassis sensor node wheel-speed / pressure reports.
pub const CHASSIS_REPORT_ID: u16 = 0x310;
/// Safety receiver status broadcast.
pub const RES_STATUS_ID: u16 = 0x191;
/// Outbound dash telemetry channel.
pub const DASH_TELEMETRY_ID: u16 = 0x320;

/// Identifiers the core asks the transport to deliver.
pub const INBOUND_IDS: [u16; 5] = [
    BMS_THERMISTOR_ID,
    INVERTER_RESPONSE_ID,
    MASTER_STATUS_ID,
    CHASSIS_REPORT_ID,
    RES_STATUS_ID,
];

/// Inverter register tags. The response channel multiplexes all of these over
/// one identifier, keyed by the first payload byte.
pub mod reg {
    /// Read request: `[READ_REQUEST, register, cadence]`.
    pub const READ_REQUEST: u8 = 0x3D;
    /// Enable/disable control register.
    pub const ENABLE: u8 = 0x51;
    /// Torque setpoint.
    pub const TORQUE: u8 = 0x90;
    pub const SPEED_ACTUAL: u8 = 0x30;
    pub const SPEED_LIMIT: u8 = 0x34;
    pub const RAMP_ACC: u8 = 0x35;
    pub const RAMP_DEC: u8 = 0xED;
    pub const CLEAR_FAULTS: u8 = 0x8E;
    pub const I_MAX_PEAK: u8 = 0xC4;
    pub const I_CONTINUOUS: u8 = 0xC5;
    pub const DC_VOLTAGE: u8 = 0xEB;
    /// Bridge (BTB) status, confirmed by sequence only.
    pub const BTB_STATUS: u8 = 0xE2;
    /// Transmission-enable confirmation, sequence only.
    pub const TX_ENABLE: u8 = 0xE8;
}

/// Value byte for [`reg::ENABLE`] that switches the drive off internally.
pub const ENABLE_OFF: u8 = 0x04;
/// Value byte for [`reg::ENABLE`] that removes the disable.
pub const ENABLE_ON: u8 = 0x00;

/// Cadence byte for a one-shot register read.
pub const READ_ONCE: u8 = 0x00;
/// Cadence byte requesting the register every 100 ms.
pub const READ_EVERY_100MS: u8 = 0x64;

/// Sub-tags shared by the node-status, chassis-report and dash-telemetry
/// channels (first payload byte).
pub mod tag {
    pub const HYDRAULIC_LINE: u8 = 0x01;
    pub const LEFT_WHEEL: u8 = 0x02;
    pub const RIGHT_WHEEL: u8 = 0x03;
    pub const ASMS: u8 = 0x04;
    pub const SOC: u8 = 0x05;
    pub const AS_STATE: u8 = 0x06;
    pub const FL_RPM: u8 = 0x10;
    pub const FR_RPM: u8 = 0x11;
    pub const APPS_HIGHER: u8 = 0x20;
    pub const APPS_LOWER: u8 = 0x21;
}

/// Full payload the inverter sends once the bridge reports ready.
pub const BTB_READY_SEQUENCE: [u8; 4] = [reg::BTB_STATUS, 0x01, 0x00, 0x00];
/// Full payload confirming cyclic transmission is enabled.
pub const TX_ENABLED_SEQUENCE: [u8; 4] = [reg::TX_ENABLE, 0x01, 0x00, 0x00];

/// Safety-receiver status frame layout (8 bytes).
pub mod res {
    /// Byte 0: emergency bit, active low.
    pub const EMERGENCY_BIT: u8 = 0x01;
    /// Byte 0: operator go/ready bit.
    pub const GO_BIT: u8 = 0x02;
    /// Byte 3: link-ok bit, active low.
    pub const LINK_OK_BIT: u8 = 0x80;
    /// Byte index of the radio quality value (0-100).
    pub const RADIO_QUALITY_BYTE: usize = 6;
}

/// Raw DC bus voltage reading at or above which the tractive system counts as
/// energized. Plain threshold, re-evaluated on every sample.
pub const DC_VOLTAGE_THRESHOLD: i32 = 0x0548;
