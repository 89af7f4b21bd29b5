//! Modbus CRC-16
//!
//! Polynomial 0xA001 (reflected 0x8005), initial value 0xFFFF, LSB first,
//! no final XOR.

/// Compute the Modbus CRC-16 over `data`
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;

    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc >>= 1;
                crc ^= 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}
