//! Byte-level transport abstraction
//!
//! The engine only needs six primitives from the line: an availability
//! check, single-byte reads, writes, flush, a monotonic clock and a blocking
//! delay. Delays are part of RTU framing and must block the caller.

use std::time::Duration;

use crate::error::Result;

/// Half-duplex byte transport driven by the slave engine
pub trait Transport {
    /// Number of received bytes that can be read without blocking
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read one byte
    fn read_byte(&mut self) -> Result<u8>;

    /// Write all bytes in order
    fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Block until written bytes have left the transmitter
    fn flush(&mut self) -> Result<()>;

    /// Monotonic time since the transport was opened
    fn elapsed(&self) -> Duration;

    /// Block the caller for `duration`
    fn delay(&mut self, duration: Duration);
}

#[cfg(feature = "serial")]
pub use serial::{SerialSettings, SerialTransport};

#[cfg(feature = "serial")]
mod serial {
    use serde::{Deserialize, Serialize};
    use std::io::{Read, Write};
    use std::time::{Duration, Instant};
    use tokio_serial::{DataBits, Parity, SerialPort, StopBits};
    use tracing::{debug, info};

    use super::Transport;
    use crate::error::{Result, RtuError};

    /// Delays shorter than this spin instead of sleeping
    const SPIN_THRESHOLD: Duration = Duration::from_millis(2);

    /// Serial line settings
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct SerialSettings {
        /// Serial port path (e.g., "/dev/ttyUSB0", "COM1")
        pub port: String,
        /// Baud rate
        pub baud_rate: u32,
        /// Data bits (5, 6, 7, 8)
        pub data_bits: u8,
        /// Stop bits (1, 2)
        pub stop_bits: u8,
        /// Parity ("None", "Even", "Odd")
        pub parity: String,
        /// Timeout for a single blocking read or write
        pub io_timeout_ms: u64,
    }

    impl Default for SerialSettings {
        fn default() -> Self {
            Self {
                port: "/dev/ttyUSB0".to_string(),
                baud_rate: 9600,
                data_bits: 8,
                stop_bits: 1,
                parity: "None".to_string(),
                io_timeout_ms: 100,
            }
        }
    }

    impl SerialSettings {
        pub fn validate(&self) -> Result<()> {
            if self.port.is_empty() {
                return Err(RtuError::config("Port path cannot be empty"));
            }
            if self.baud_rate == 0 {
                return Err(RtuError::config("Baud rate must be greater than zero"));
            }
            self.data_bits()?;
            self.stop_bits()?;
            self.parity()?;
            Ok(())
        }

        fn data_bits(&self) -> Result<DataBits> {
            match self.data_bits {
                5 => Ok(DataBits::Five),
                6 => Ok(DataBits::Six),
                7 => Ok(DataBits::Seven),
                8 => Ok(DataBits::Eight),
                other => Err(RtuError::config(format!(
                    "Data bits must be 5, 6, 7, or 8, got {}",
                    other
                ))),
            }
        }

        fn stop_bits(&self) -> Result<StopBits> {
            match self.stop_bits {
                1 => Ok(StopBits::One),
                2 => Ok(StopBits::Two),
                other => Err(RtuError::config(format!(
                    "Stop bits must be 1 or 2, got {}",
                    other
                ))),
            }
        }

        fn parity(&self) -> Result<Parity> {
            match self.parity.as_str() {
                "None" => Ok(Parity::None),
                "Even" => Ok(Parity::Even),
                "Odd" => Ok(Parity::Odd),
                other => Err(RtuError::config(format!(
                    "Parity must be None, Even, or Odd, got {}",
                    other
                ))),
            }
        }
    }

    /// Blocking serial port transport
    pub struct SerialTransport {
        port: Box<dyn SerialPort>,
        opened_at: Instant,
    }

    impl std::fmt::Debug for SerialTransport {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("SerialTransport")
                .field("port", &self.port.name())
                .field("opened_at", &self.opened_at)
                .finish()
        }
    }

    impl SerialTransport {
        /// Open the serial port described by `settings`
        pub fn open(settings: &SerialSettings) -> Result<Self> {
            settings.validate()?;

            let port = tokio_serial::new(settings.port.as_str(), settings.baud_rate)
                .data_bits(settings.data_bits()?)
                .stop_bits(settings.stop_bits()?)
                .parity(settings.parity()?)
                .timeout(Duration::from_millis(settings.io_timeout_ms))
                .open()?;

            info!(
                "Serial port {} opened at {} baud ({}{}{})",
                settings.port,
                settings.baud_rate,
                settings.data_bits,
                settings.parity.chars().next().unwrap_or('N'),
                settings.stop_bits
            );

            Ok(Self {
                port,
                opened_at: Instant::now(),
            })
        }
    }

    impl Transport for SerialTransport {
        fn bytes_available(&mut self) -> Result<usize> {
            Ok(self.port.bytes_to_read()? as usize)
        }

        fn read_byte(&mut self) -> Result<u8> {
            let mut byte = [0u8; 1];
            self.port.read_exact(&mut byte)?;
            Ok(byte[0])
        }

        fn write_all(&mut self, data: &[u8]) -> Result<()> {
            debug!("Serial TX {} bytes: {:02X?}", data.len(), data);
            Write::write_all(&mut self.port, data)?;
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Write::flush(&mut self.port)?;
            Ok(())
        }

        fn elapsed(&self) -> Duration {
            self.opened_at.elapsed()
        }

        fn delay(&mut self, duration: Duration) {
            if duration >= SPIN_THRESHOLD {
                std::thread::sleep(duration);
                return;
            }

            let start = Instant::now();
            while start.elapsed() < duration {
                std::hint::spin_loop();
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_default_settings_are_valid() {
            assert!(SerialSettings::default().validate().is_ok());
        }

        #[test]
        fn test_invalid_settings() {
            let settings = SerialSettings {
                port: String::new(),
                ..Default::default()
            };
            assert!(settings.validate().is_err());

            let settings = SerialSettings {
                data_bits: 9,
                ..Default::default()
            };
            assert!(settings.validate().is_err());

            let settings = SerialSettings {
                parity: "Mark".to_string(),
                ..Default::default()
            };
            assert!(settings.validate().is_err());
        }

        #[test]
        fn test_open_missing_port_fails() {
            let settings = SerialSettings {
                port: "/dev/does-not-exist-rtu".to_string(),
                ..Default::default()
            };
            assert!(matches!(
                SerialTransport::open(&settings),
                Err(RtuError::Serial(_))
            ));
        }
    }
}
