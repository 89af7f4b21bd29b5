//! Modbus RTU slave constants
//!
//! Frame limits follow the serial line ADU definition:
//! - Maximum RTU ADU: 256 bytes = slave address (1) + PDU (253) + CRC (2)
//! - Register limits are bounded by the one-byte byte-count field

// ============================================================================
// Frame Size Constants
// ============================================================================

/// Maximum RTU ADU size on a serial line
pub const MAX_ADU_SIZE: usize = 256;

/// Default capacity of the receive frame buffer
pub const DEFAULT_FRAME_CAPACITY: usize = MAX_ADU_SIZE;

/// Smallest frame buffer able to hold a register request
/// Format: Slave ID(1) + FC(1) + Address(2) + Quantity(2) + CRC(2) = 8 bytes
pub const MIN_FRAME_CAPACITY: usize = 8;

/// Requests must be strictly longer than this to be considered
pub const MIN_REQUEST_LEN: usize = 7;

/// Exception frame length: Slave ID(1) + FC|0x80(1) + Code(1) + CRC(2)
pub const EXCEPTION_FRAME_LEN: usize = 5;

/// Write echo length for FC06/FC16: Slave ID(1) + FC(1) + Address(2) + Value/Quantity(2) + CRC(2)
pub const WRITE_ECHO_LEN: usize = 8;

/// FC16 overhead besides register data:
/// Slave ID(1) + FC(1) + Address(2) + Quantity(2) + Byte Count(1) + CRC(2) = 9 bytes
pub const WRITE_MULTIPLE_OVERHEAD: usize = 9;

// ============================================================================
// Register Operation Limits
// ============================================================================

/// Maximum number of registers for FC03 (Read Holding Registers)
///
/// Response PDU: FC(1) + Byte Count(1) + N × 2 ≤ 253 → N ≤ 125
pub const MAX_READ_REGISTERS: u16 = 125;

/// Maximum number of registers for FC16 (Write Multiple Registers)
///
/// Request PDU: FC(1) + Address(2) + Quantity(2) + Byte Count(1) + N × 2 ≤ 253 → N ≤ 123
pub const MAX_WRITE_REGISTERS: u16 = 123;

/// Highest slave address usable on a serial line (248-255 are reserved)
pub const MAX_SLAVE_ID: u8 = 247;

// ============================================================================
// Function Codes
// ============================================================================

pub const FC_READ_HOLDING_REGISTERS: u8 = 0x03;
pub const FC_WRITE_SINGLE_REGISTER: u8 = 0x06;
pub const FC_WRITE_MULTIPLE_REGISTERS: u8 = 0x10;

/// Bit set on the function code of an exception response
pub const EXCEPTION_FLAG: u8 = 0x80;

// ============================================================================
// Timing
// ============================================================================

/// Above this baud rate the character gaps are fixed
pub const FIXED_TIMING_BAUD_THRESHOLD: u32 = 19_200;

/// 1.5 character times in microseconds at high baud rates
pub const FIXED_T1_5_US: u64 = 750;

/// 3.5 character times in microseconds at high baud rates
pub const FIXED_T3_5_US: u64 = 1_750;

/// 1.5 characters × 10 bits × 1e6 µs, divided by the baud rate
pub const T1_5_NUMERATOR: u64 = 15_000_000;

/// 3.5 character times numerator, same family as [`T1_5_NUMERATOR`]
pub const T3_5_NUMERATOR: u64 = 35_000_000;
