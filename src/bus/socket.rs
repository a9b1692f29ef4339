//! socketcan transport. Two sockets on the same interface: a receive socket
//! filtered down to the inbound identifier set and a transmit-only socket
//! that drops all reception. Conversion to the internal frame model skips
//! remote, error and extended frames; this node speaks base-format data
//! frames only.

use std::io;
use std::sync::Arc;

use socketcan::{CanFilter, CanFrame, CanSocket, EmbeddedFrame, Id, Socket, StandardId};
use tracing::{debug, warn};

use super::{BusError, CanTx};
use crate::can_ids::INBOUND_IDS;
use crate::config::ControlConfig;
use crate::dispatcher;
use crate::frame::Frame;
use crate::vehicle_state::VehicleState;

const STANDARD_ID_MASK: u32 = 0x7FF;

/// Receive socket with one exact-match filter per inbound identifier.
pub fn open_rx_socket(interface: &str) -> io::Result<CanSocket> {
    let socket = CanSocket::open(interface)?;
    let filters: Vec<CanFilter> = INBOUND_IDS
        .iter()
        .map(|&id| CanFilter::new(id as u32, STANDARD_ID_MASK))
        .collect();
    socket.set_filters(&filters)?;
    Ok(socket)
}

/// Transmit socket; reception disabled so outbound traffic never echoes back
/// through this handle.
pub fn open_tx_socket(interface: &str) -> io::Result<CanSocket> {
    let socket = CanSocket::open(interface)?;
    socket.set_filter_drop_all()?;
    Ok(socket)
}

impl CanTx for CanSocket {
    fn send(&mut self, frame: &Frame) -> Result<(), BusError> {
        let id = StandardId::new(frame.id()).ok_or(BusError::Encode)?;
        let can_frame = CanFrame::new(id, frame.data()).ok_or(BusError::Encode)?;
        self.write_frame(&can_frame)?;
        Ok(())
    }
}

fn convert(frame: &CanFrame) -> Option<Frame> {
    let data_frame = match frame {
        CanFrame::Data(data_frame) => data_frame,
        CanFrame::Remote(_) | CanFrame::Error(_) => return None,
    };
    let id = match data_frame.id() {
        Id::Standard(id) => id.as_raw(),
        Id::Extended(_) => return None,
    };
    Frame::new(id, data_frame.data()).ok()
}

/// Blocking reception loop: read, convert, dispatch. Read errors are logged
/// and the loop keeps going; only a caller-side shutdown ends it.
pub fn receive_loop(
    socket: CanSocket,
    store: Arc<VehicleState>,
    config: ControlConfig,
    now_ms: impl Fn() -> u64,
) {
    loop {
        match socket.read_frame() {
            Ok(can_frame) => {
                if let Some(frame) = convert(&can_frame) {
                    dispatcher::handle_frame(&store, &frame, now_ms(), &config);
                } else {
                    debug!("dropping non-data or extended frame");
                }
            }
            Err(error) => {
                warn!(%error, "socket read failed");
            }
        }
    }
}
