//! Register value conversions
//!
//! Masters commonly publish 32-bit floats as two consecutive holding
//! registers, high word first.

/// Combine two registers (high word first) into an IEEE-754 `f32`
#[inline]
pub fn registers_to_f32(high: u16, low: u16) -> f32 {
    f32::from_bits((u32::from(high) << 16) | u32::from(low))
}

/// Split an `f32` into two registers, high word first
#[inline]
pub fn f32_to_registers(value: f32) -> [u16; 2] {
    let bits = value.to_bits();
    [(bits >> 16) as u16, (bits & 0xFFFF) as u16]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registers_to_f32_known_values() {
        assert_eq!(registers_to_f32(0x3F80, 0x0000), 1.0);
        assert_eq!(registers_to_f32(0x4049, 0x0FDB), std::f32::consts::PI);
        assert_eq!(registers_to_f32(0xC2C8, 0x0000), -100.0);
    }

    #[test]
    fn test_f32_to_registers_high_word_first() {
        assert_eq!(f32_to_registers(1.0), [0x3F80, 0x0000]);
        assert_eq!(f32_to_registers(230.5), [0x4366, 0x8000]);
    }

    #[test]
    fn test_nan_survives_split() {
        let [high, low] = f32_to_registers(f32::NAN);
        assert!(registers_to_f32(high, low).is_nan());
    }
}
