//! Interface to the cue/display collaborator: fire-and-forget sounds and
//! telemetry pushes keyed by a widget identifier. Called, never polled for
//! completion, assumed non-blocking.

use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Widget {
    Speed,
    BrakePressure,
    Throttle,
    StateOfCharge,
    CellTempMin,
    CellTempMax,
    InverterMode,
}

pub trait IoHandler {
    /// Audible ready-to-drive cue played when manual initialization starts.
    fn play_ready_sound(&mut self);
    /// Timed alarm buzzer.
    fn play_buzzer(&mut self, duration_ms: u64);
    fn push_telemetry(&mut self, widget: Widget, value: u16);
}

/// Trace-only IO used by the stand-alone daemon; a real build routes these to
/// the dash display and the sound board.
#[derive(Debug, Default)]
pub struct LogIo;

impl IoHandler for LogIo {
    fn play_ready_sound(&mut self) {
        info!("ready-to-drive sound");
    }

    fn play_buzzer(&mut self, duration_ms: u64) {
        info!(duration_ms, "buzzer");
    }

    fn push_telemetry(&mut self, widget: Widget, value: u16) {
        info!(?widget, value, "telemetry push");
    }
}
