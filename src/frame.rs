//! Wire-level frame model: 11-bit identifier, declared length, up to 8 bytes
//! of payload. Constructed per message and immediately consumed or
//! transmitted, never retained.

use thiserror::Error;

pub const MAX_DATA_LEN: usize = 8;
pub const MAX_STANDARD_ID: u16 = 0x7FF;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("identifier {0:#05x} does not fit in 11 bits")]
    IdOutOfRange(u16),
    #[error("payload of {0} bytes exceeds the {max} byte frame limit", max = MAX_DATA_LEN)]
    PayloadTooLong(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    id: u16,
    len: u8,
    data: [u8; MAX_DATA_LEN],
}

impl Frame {
    pub fn new(id: u16, data: &[u8]) -> Result<Frame, FrameError> {
        if id > MAX_STANDARD_ID {
            return Err(FrameError::IdOutOfRange(id));
        }
        if data.len() > MAX_DATA_LEN {
            return Err(FrameError::PayloadTooLong(data.len()));
        }
        let mut buf = [0u8; MAX_DATA_LEN];
        buf[..data.len()].copy_from_slice(data);
        Ok(Frame {
            id,
            len: data.len() as u8,
            data: buf,
        })
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    /// Only the declared-length prefix of the payload is meaningful.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn data_is_bounded_by_declared_length() {
        let frame = Frame::new(0x181, &[0xEB, 0x01, 0x11]).unwrap();
        assert_eq!(frame.id(), 0x181);
        assert_eq!(frame.data(), &[0xEB, 0x01, 0x11]);
        assert_eq!(frame.len(), 3);
    }

    #[test]
    fn empty_payload_is_valid() {
        let frame = Frame::new(0x001, &[]).unwrap();
        assert!(frame.is_empty());
        assert_eq!(frame.data(), &[] as &[u8]);
    }

    #[test]
    fn rejects_oversized_payload() {
        let err = Frame::new(0x100, &[0u8; 9]).unwrap_err();
        assert_eq!(err, FrameError::PayloadTooLong(9));
    }

    #[test]
    fn rejects_extended_identifier() {
        let err = Frame::new(0x800, &[0x00]).unwrap_err();
        assert_eq!(err, FrameError::IdOutOfRange(0x800));
    }
}
