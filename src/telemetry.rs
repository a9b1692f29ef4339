//! Periodic outbound telemetry.
//!
//! Encodes the dash telemetry frames (wheel speed, hydraulic pressure, pedal
//! channels), pushes the display widgets, and re-sends the full inverter
//! parameter set when the operator changes the switch mode. Every kind has
//! its own period and re-arms independently; the scheduler never sleeps and
//! is driven with the loop's sampled time.

use tracing::info;

use crate::bus::{BusError, CanTx, DashTelemetry, InverterCommands};
use crate::can_ids::{reg, tag};
use crate::codec::map_range;
use crate::config::{mode_params, ControlConfig, SwitchMode, MAX_CURRENT_RAW, MAX_SPEED_RAW};
use crate::io::{IoHandler, Widget};
use crate::vehicle_state::VehicleState;

/// One periodic kind's re-arm state. `None` until the first send.
#[derive(Debug, Default)]
struct Cadence {
    last_sent_ms: Option<u64>,
}

impl Cadence {
    fn due(&mut self, now_ms: u64, period_ms: u64) -> bool {
        let due = match self.last_sent_ms {
            None => true,
            Some(last) => now_ms - last >= period_ms,
        };
        if due {
            self.last_sent_ms = Some(now_ms);
        }
        due
    }
}

#[derive(Debug, Default)]
pub struct TelemetryScheduler {
    rpm: Cadence,
    hydraulic: Cadence,
    apps: Cadence,
    widgets: Cadence,
    /// Mode last pushed to the inverter. `None` forces a push on the first
    /// tick so the inverter never runs on stale parameters.
    previous_mode: Option<SwitchMode>,
}

impl TelemetryScheduler {
    pub fn new() -> TelemetryScheduler {
        TelemetryScheduler::default()
    }

    /// One scheduling tick: sends whatever is due at `now_ms`.
    pub fn tick(
        &mut self,
        now_ms: u64,
        store: &VehicleState,
        tx: &mut impl CanTx,
        io: &mut impl IoHandler,
        config: &ControlConfig,
    ) -> Result<(), BusError> {
        let mode = store.switch_mode();
        if self.previous_mode != Some(mode) {
            self.push_mode_params(mode, tx, io)?;
            self.previous_mode = Some(mode);
        }

        if self.rpm.due(now_ms, config.rpm_period_ms) {
            tx.send_wheel_rpm(tag::FL_RPM, store.fl_rpm())?;
            tx.send_wheel_rpm(tag::FR_RPM, store.fr_rpm())?;
        }
        if self.hydraulic.due(now_ms, config.hydraulic_period_ms) {
            tx.send_hydraulic_pressure(store.hydraulic_pressure())?;
        }
        if self.apps.due(now_ms, config.apps_period_ms) {
            tx.send_apps_channel(tag::APPS_HIGHER, store.apps_higher())?;
            tx.send_apps_channel(tag::APPS_LOWER, store.apps_lower())?;
        }
        if self.widgets.due(now_ms, config.widget_period_ms) {
            self.push_widgets(store, io, config);
        }
        Ok(())
    }

    /// Five-frame inverter parameter set for the selected mode, plus the
    /// display update.
    fn push_mode_params(
        &mut self,
        mode: SwitchMode,
        tx: &mut impl CanTx,
        io: &mut impl IoHandler,
    ) -> Result<(), BusError> {
        let params = mode_params(mode);
        info!(?mode, "switch mode changed, pushing inverter parameters");

        let i_max = map_range(params.i_max_peak_percent, 0, 100, 0, MAX_CURRENT_RAW);
        let i_cont = map_range(params.i_continuous_percent, 0, 100, 0, MAX_CURRENT_RAW);
        let speed = map_range(params.speed_limit_percent, 0, 100, 0, MAX_SPEED_RAW);

        tx.send_register_u16(reg::I_MAX_PEAK, i_max as u16)?;
        tx.send_register_u16(reg::SPEED_LIMIT, speed as u16)?;
        tx.send_register_u16(reg::I_CONTINUOUS, i_cont as u16)?;
        tx.send_ramp_pair(reg::RAMP_ACC, params.speed_ramp_acc_ms, params.moment_ramp_acc_ms)?;
        tx.send_ramp_pair(
            reg::RAMP_DEC,
            params.speed_ramp_brake_ms,
            params.moment_ramp_dec_ms,
        )?;

        io.push_telemetry(Widget::InverterMode, mode.to_byte() as u16);
        Ok(())
    }

    fn push_widgets(&mut self, store: &VehicleState, io: &mut impl IoHandler, config: &ControlConfig) {
        let avg_rpm = (store.fl_rpm() + store.fr_rpm()) / 2.0;
        io.push_telemetry(Widget::Speed, avg_rpm.max(0.0) as u16);
        io.push_telemetry(Widget::BrakePressure, store.hydraulic_pressure());

        let throttle = map_range(
            store.apps_higher(),
            config.apps_raw_lo,
            config.apps_raw_hi,
            0,
            100,
        );
        io.push_telemetry(Widget::Throttle, throttle as u16);
        io.push_telemetry(Widget::StateOfCharge, store.soc() as u16);

        let (min_temp, max_temp) = store.cell_temps();
        io.push_telemetry(Widget::CellTempMin, min_temp as u16);
        io.push_telemetry(Widget::CellTempMax, max_temp as u16);
    }
}
