//! Process wiring: the reception thread and the cooperative control loop.
//!
//! One monotonic clock feeds both contexts; every step function receives the
//! millisecond value sampled at the top of the loop iteration, never a fresh
//! reading of its own.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::bus::socket;
use crate::bus::{BusError, CanTx, InverterCommands};
use crate::config::ControlConfig;
use crate::drive::DriveStateMachine;
use crate::io::{IoHandler, LogIo};
use crate::logic::{DriveLogic, InertLogic};
use crate::telemetry::TelemetryScheduler;
use crate::vehicle_state::VehicleState;

/// Monotonic milliseconds since process start.
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    start: Instant,
}

impl Clock {
    pub fn new() -> Clock {
        Clock {
            start: Instant::now(),
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl Default for Clock {
    fn default() -> Clock {
        Clock::new()
    }
}

/// Opens the bus, spawns the reception thread and runs the control loop.
/// Returns only on a socket setup failure; the loop itself runs until the
/// process is killed.
pub fn run(interface: &str, config: ControlConfig) -> Result<(), BusError> {
    let store = Arc::new(VehicleState::new());
    let clock = Clock::new();

    let rx_socket = socket::open_rx_socket(interface)?;
    let mut tx_socket = socket::open_tx_socket(interface)?;
    info!(interface, "bus sockets open");

    // The inverter only answers standing read requests; register them before
    // anything waits on the response channel.
    tx_socket.request_cyclic_readbacks()?;

    let rx_store = Arc::clone(&store);
    thread::Builder::new()
        .name(String::from("can-rx"))
        .spawn(move || {
            socket::receive_loop(rx_socket, rx_store, config, move || clock.now_ms());
        })
        .map_err(BusError::Io)?;

    let mut machine = DriveStateMachine::new();
    let mut telemetry = TelemetryScheduler::new();
    let mut logic = InertLogic;
    let mut io = LogIo;

    info!(tick_ms = config.tick_ms, "control loop running");
    loop {
        control_step(
            clock.now_ms(),
            &store,
            &mut tx_socket,
            &mut machine,
            &mut telemetry,
            &mut logic,
            &mut io,
            &config,
        );
        thread::sleep(Duration::from_millis(config.tick_ms));
    }
}

/// One control iteration. Transmit failures are transient bus conditions, not
/// process faults; they are logged and the next tick retries naturally.
#[allow(clippy::too_many_arguments)]
fn control_step(
    now_ms: u64,
    store: &VehicleState,
    tx: &mut impl CanTx,
    machine: &mut DriveStateMachine,
    telemetry: &mut TelemetryScheduler,
    logic: &mut impl DriveLogic,
    io: &mut impl IoHandler,
    config: &ControlConfig,
) {
    if let Err(error) = machine.update(now_ms, store, tx, logic, io, config) {
        warn!(%error, "drive step transmit failed");
    }
    if let Err(error) = telemetry.tick(now_ms, store, tx, io, config) {
        warn!(%error, "telemetry transmit failed");
    }
}
