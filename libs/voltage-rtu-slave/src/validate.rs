//! Request frame validation
//!
//! Checked in order: length, slave address, CRC. A frame failing any check
//! is dropped without a reply; on a shared bus only the master can notice
//! the missing response.

use thiserror::Error;

use crate::constants::MIN_REQUEST_LEN;
use crate::crc::crc16;

/// Reason a received frame was dropped before dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("frame too short: {len} bytes")]
    TooShort { len: usize },

    #[error("addressed to slave {slave_id}")]
    ForeignAddress { slave_id: u8 },

    #[error("CRC mismatch: calculated 0x{calculated:04X}, received 0x{received:04X}")]
    CrcMismatch { calculated: u16, received: u16 },
}

/// Check that `frame` is a complete request for `slave_id`
pub fn validate_request(frame: &[u8], slave_id: u8) -> Result<(), Rejection> {
    let len = frame.len();
    if len <= MIN_REQUEST_LEN {
        return Err(Rejection::TooShort { len });
    }

    if frame[0] != slave_id {
        return Err(Rejection::ForeignAddress { slave_id: frame[0] });
    }

    // Low byte first on the wire
    let received = u16::from_le_bytes([frame[len - 2], frame[len - 1]]);
    let calculated = crc16(&frame[..len - 2]);
    if calculated != received {
        return Err(Rejection::CrcMismatch {
            calculated,
            received,
        });
    }

    Ok(())
}
