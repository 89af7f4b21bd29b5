//! Function code dispatch
//!
//! Interprets a validated request against the register store and builds the
//! reply in a caller-provided buffer.
//!
//! Supported functions:
//! - FC03 Read Holding Registers
//! - FC06 Write Single Register
//! - FC16 Write Multiple Registers
//!
//! Byte order on the wire is not uniform. Success replies carry the CRC low
//! byte first, exception replies carry it high byte first.

use tracing::debug;

use crate::constants::{
    EXCEPTION_FLAG, EXCEPTION_FRAME_LEN, FC_READ_HOLDING_REGISTERS, FC_WRITE_MULTIPLE_REGISTERS,
    FC_WRITE_SINGLE_REGISTER, MAX_READ_REGISTERS, MAX_WRITE_REGISTERS, WRITE_ECHO_LEN,
    WRITE_MULTIPLE_OVERHEAD,
};
use crate::crc::crc16;
use crate::register::RegisterMap;

/// Modbus exception codes produced by this slave
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExceptionCode {
    IllegalFunction = 0x01,
    IllegalDataAddress = 0x02,
    IllegalDataValue = 0x03,
}

impl ExceptionCode {
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for ExceptionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExceptionCode::IllegalFunction => "Illegal Function",
            ExceptionCode::IllegalDataAddress => "Illegal Data Address",
            ExceptionCode::IllegalDataValue => "Illegal Data Value",
        };
        write!(f, "{} (0x{:02X})", name, self.code())
    }
}

/// Result of dispatching one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A success reply is ready in the response buffer
    Reply,
    /// An exception reply is ready in the response buffer
    Exception(ExceptionCode),
    /// No reply at all (FC16 byte count disagrees with the frame length)
    Discard,
}

impl Dispatch {
    /// Whether something has to be transmitted
    #[inline]
    pub fn has_response(self) -> bool {
        !matches!(self, Dispatch::Discard)
    }
}

/// Interpret `frame` and build the reply into `response`
///
/// `frame` must already have passed [`validate_request`](crate::validate_request):
/// at least 8 bytes, CRC included.
pub fn dispatch<S>(
    frame: &[u8],
    registers: &mut RegisterMap<S>,
    response: &mut Vec<u8>,
) -> Dispatch
where
    S: AsRef<[u16]> + AsMut<[u16]>,
{
    response.clear();

    let slave_id = frame[0];
    let function = frame[1];
    let address = u16::from_be_bytes([frame[2], frame[3]]);
    let quantity = u16::from_be_bytes([frame[4], frame[5]]);

    debug!(
        "Dispatch FC={:02X} address={} quantity/value={} ({} bytes)",
        function,
        address,
        quantity,
        frame.len()
    );

    let outcome = match function {
        FC_READ_HOLDING_REGISTERS => {
            read_holding_registers(frame, registers, address, quantity, response)
        },
        FC_WRITE_SINGLE_REGISTER => {
            write_single_register(frame, registers, address, quantity, response)
        },
        FC_WRITE_MULTIPLE_REGISTERS => {
            write_multiple_registers(frame, registers, address, quantity, response)
        },
        _ => Err(ExceptionCode::IllegalFunction),
    };

    match outcome {
        Ok(true) => Dispatch::Reply,
        Ok(false) => Dispatch::Discard,
        Err(code) => {
            debug!("FC={:02X} rejected with {}", function, code);
            encode_exception(slave_id, function, code, response);
            Dispatch::Exception(code)
        },
    }
}

/// Build `[slave_id, 0x80 | function, code, CRC_hi, CRC_lo]`
pub fn encode_exception(slave_id: u8, function: u8, code: ExceptionCode, out: &mut Vec<u8>) {
    out.clear();
    out.reserve(EXCEPTION_FRAME_LEN);
    out.extend_from_slice(&[slave_id, EXCEPTION_FLAG | function, code.code()]);
    let crc = crc16(out);
    out.extend_from_slice(&crc.to_be_bytes());
}

/// Append the CRC of `out`, low byte first
fn append_crc(out: &mut Vec<u8>) {
    let crc = crc16(out);
    out.extend_from_slice(&crc.to_le_bytes());
}

fn read_holding_registers<S>(
    frame: &[u8],
    registers: &RegisterMap<S>,
    address: u16,
    quantity: u16,
    response: &mut Vec<u8>,
) -> Result<bool, ExceptionCode>
where
    S: AsRef<[u16]> + AsMut<[u16]>,
{
    if address < registers.base() {
        return Err(ExceptionCode::IllegalDataAddress);
    }
    if usize::from(quantity) > registers.size() || quantity > MAX_READ_REGISTERS {
        return Err(ExceptionCode::IllegalDataValue);
    }
    let span = registers
        .span(address, quantity)
        .ok_or(ExceptionCode::IllegalDataAddress)?;

    let values = &registers.as_slice()[span];
    response.reserve(5 + values.len() * 2);
    response.extend_from_slice(&[frame[0], frame[1], (values.len() * 2) as u8]);
    for value in values {
        response.extend_from_slice(&value.to_be_bytes());
    }
    append_crc(response);

    Ok(true)
}

fn write_single_register<S>(
    frame: &[u8],
    registers: &mut RegisterMap<S>,
    address: u16,
    value: u16,
    response: &mut Vec<u8>,
) -> Result<bool, ExceptionCode>
where
    S: AsRef<[u16]> + AsMut<[u16]>,
{
    if address < registers.base() {
        return Err(ExceptionCode::IllegalDataAddress);
    }
    let span = registers
        .span(address, 1)
        .ok_or(ExceptionCode::IllegalDataAddress)?;

    registers.as_mut_slice()[span.start] = value;

    response.reserve(WRITE_ECHO_LEN);
    response.extend_from_slice(&frame[..6]);
    append_crc(response);

    Ok(true)
}

fn write_multiple_registers<S>(
    frame: &[u8],
    registers: &mut RegisterMap<S>,
    address: u16,
    quantity: u16,
    response: &mut Vec<u8>,
) -> Result<bool, ExceptionCode>
where
    S: AsRef<[u16]> + AsMut<[u16]>,
{
    let byte_count = usize::from(frame[6]);
    if byte_count + WRITE_MULTIPLE_OVERHEAD != frame.len() {
        debug!(
            "FC16 byte count {} does not match frame length {}, dropping",
            byte_count,
            frame.len()
        );
        return Ok(false);
    }

    if address < registers.base() {
        return Err(ExceptionCode::IllegalDataAddress);
    }
    if usize::from(quantity) > registers.size() || quantity > MAX_WRITE_REGISTERS {
        return Err(ExceptionCode::IllegalDataValue);
    }
    if byte_count != usize::from(quantity) * 2 {
        return Err(ExceptionCode::IllegalDataValue);
    }
    let span = registers
        .span(address, quantity)
        .ok_or(ExceptionCode::IllegalDataAddress)?;

    let payload = &frame[7..7 + byte_count];
    for (slot, chunk) in registers.as_mut_slice()[span]
        .iter_mut()
        .zip(payload.chunks_exact(2))
    {
        *slot = u16::from_be_bytes([chunk[0], chunk[1]]);
    }

    response.reserve(WRITE_ECHO_LEN);
    response.extend_from_slice(&frame[..6]);
    append_crc(response);

    Ok(true)
}
