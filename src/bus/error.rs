use thiserror::Error;

use crate::frame::FrameError;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("invalid frame: {0}")]
    Frame(#[from] FrameError),
    #[error("socket i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame rejected by transport")]
    Encode,
}
