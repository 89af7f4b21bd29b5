//! VoltageEMS Modbus RTU Slave
//!
//! Responder side of Modbus RTU on a half-duplex serial line. A device
//! exposes a caller-owned array of holding registers to a single master.
//!
//! # Features
//!
//! - `serial` - blocking serial port transport (default)
//!
//! # Architecture
//!
//! ```text
//! voltage-rtu-slave
//!     ├── RtuSlave (polling entry point)
//!     │     ├── FrameBuffer / fill_from (1.5 char gap framing)
//!     │     ├── validate_request (length, slave address, CRC-16)
//!     │     ├── dispatch (FC03, FC06, FC16, exceptions)
//!     │     ├── Transmitter (direction control, 3.5 char gap)
//!     │     └── Watchdog (communication loss alarm)
//!     ├── Transport / DirectionControl (hardware seams)
//!     └── SimulatedBus (virtual-clock bus for tests)
//! ```
//!
//! # Example
//!
//! ```
//! use voltage_rtu_slave::{Alarm, RtuSlave, SimulatedBus, SlaveConfig};
//!
//! let bus = SimulatedBus::new();
//! let mut registers = [0u16; 8];
//! let mut slave = RtuSlave::new(bus.clone(), &SlaveConfig::default(), &mut registers[..])
//!     .expect("valid configuration");
//!
//! // Read one register at address 0
//! bus.push_frame(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x01, 0x84, 0x0A]);
//! assert_eq!(slave.poll(), Alarm::None);
//! assert_eq!(bus.take_written()[..5], [0x01, 0x03, 0x02, 0x00, 0x00]);
//! ```

mod config;
pub mod constants;
pub mod convert;
pub mod crc;
pub mod direction;
pub mod dispatch;
mod engine;
pub mod error;
pub mod frame;
pub mod register;
pub mod sim;
mod timing;
mod transmit;
pub mod transport;
mod validate;
mod watchdog;

pub use config::SlaveConfig;
pub use convert::{f32_to_registers, registers_to_f32};
pub use crc::crc16;
pub use direction::{DirectionControl, GpioDirection, GpioDriver, SysfsGpioDriver};
pub use dispatch::{Dispatch, ExceptionCode};
pub use engine::{RtuSlave, SlaveStats};
pub use error::{Result, RtuError};
pub use frame::FrameBuffer;
pub use register::RegisterMap;
pub use sim::{BusEvent, SimulatedBus, SimulatedPin};
pub use timing::RtuTiming;
pub use transmit::Transmitter;
pub use transport::Transport;
pub use validate::{validate_request, Rejection};
pub use watchdog::{Alarm, Watchdog};

#[cfg(feature = "serial")]
pub use transport::{SerialSettings, SerialTransport};
