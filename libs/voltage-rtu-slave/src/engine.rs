//! RTU slave engine
//!
//! One [`RtuSlave`] per serial line. The caller drives it by calling
//! [`RtuSlave::poll`] from its control loop; each call either handles one
//! frame or checks the silence watchdog, and always returns the current
//! alarm state.
//!
//! ```text
//! poll()
//!   ├── bytes pending? ── no ──> Watchdog::check ──> alarm
//!   └── yes
//!        ├── FrameBuffer::fill_from   (1.5 char gap framing)
//!        ├── validate_request         (length, address, CRC) ── fail ──> drop
//!        ├── dispatch                 (FC03 / FC06 / FC16)
//!        ├── Transmitter::send        (DE, write, flush, 3.5 char gap)
//!        └── Watchdog::clear          (success replies only)
//! ```

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::SlaveConfig;
use crate::direction::DirectionControl;
use crate::dispatch::{dispatch, Dispatch};
use crate::error::Result;
use crate::frame::FrameBuffer;
use crate::register::RegisterMap;
use crate::timing::RtuTiming;
use crate::transmit::Transmitter;
use crate::transport::Transport;
use crate::validate::{validate_request, Rejection};
use crate::watchdog::{Alarm, Watchdog};

/// Frame counters since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SlaveStats {
    /// Bursts assembled from the line
    pub frames_received: u64,
    /// Dropped: 7 bytes or fewer
    pub dropped_short: u64,
    /// Dropped: addressed to another slave
    pub dropped_foreign: u64,
    /// Dropped: CRC mismatch
    pub dropped_crc: u64,
    /// Dropped: FC16 byte count disagrees with the frame length
    pub dropped_byte_count: u64,
    pub responses_sent: u64,
    pub exceptions_sent: u64,
    /// Transport failures while receiving or transmitting
    pub transport_errors: u64,
    /// Transitions into `CommunicationLost`
    pub alarms_raised: u64,
}

/// Modbus RTU slave bound to one transport and one register store
pub struct RtuSlave<T, S> {
    transport: T,
    registers: RegisterMap<S>,
    slave_id: u8,
    timing: RtuTiming,
    frame: FrameBuffer,
    response: Vec<u8>,
    transmitter: Transmitter,
    watchdog: Watchdog,
    stats: SlaveStats,
}

impl<T, S> RtuSlave<T, S>
where
    T: Transport,
    S: AsRef<[u16]> + AsMut<[u16]>,
{
    /// Create a slave answering as `config.slave_id`
    ///
    /// `registers` answers Modbus addresses starting at `config.base_address`.
    /// The silence clock starts now.
    pub fn new(transport: T, config: &SlaveConfig, registers: S) -> Result<Self> {
        config.validate()?;
        let registers = RegisterMap::new(registers, config.base_address)?;
        let timing = config.timing();
        let watchdog = Watchdog::new(config.silence_timeout(), transport.elapsed());

        debug!(
            "RTU slave {} ready: {} registers at {}, char gap {:?}, frame gap {:?}",
            config.slave_id,
            registers.size(),
            config.base_address,
            timing.char_gap,
            timing.frame_gap
        );

        Ok(Self {
            transport,
            registers,
            slave_id: config.slave_id,
            timing,
            frame: FrameBuffer::with_capacity(config.frame_capacity),
            response: Vec::with_capacity(config.frame_capacity),
            transmitter: Transmitter::new(timing.frame_gap),
            watchdog,
            stats: SlaveStats::default(),
        })
    }

    /// Attach the RS-485 direction control line; allowed once
    pub fn attach_direction_control(
        &mut self,
        line: impl DirectionControl + 'static,
    ) -> Result<()> {
        self.transmitter.attach(Box::new(line))
    }

    /// Handle at most one frame and return the alarm state
    pub fn poll(&mut self) -> Alarm {
        let available = match self.transport.bytes_available() {
            Ok(n) => n,
            Err(e) => {
                warn!("Slave {}: transport availability check failed: {}", self.slave_id, e);
                self.stats.transport_errors += 1;
                0
            },
        };

        if available == 0 {
            if self.watchdog.check(self.transport.elapsed()) {
                self.stats.alarms_raised += 1;
            }
            return self.watchdog.alarm();
        }

        self.watchdog.record_activity(self.transport.elapsed());

        if let Err(e) = self.process_frame() {
            warn!("Slave {}: frame dropped after transport error: {}", self.slave_id, e);
            self.stats.transport_errors += 1;
        }

        self.watchdog.alarm()
    }

    fn process_frame(&mut self) -> Result<()> {
        let len = self
            .frame
            .fill_from(&mut self.transport, self.timing.char_gap)?;
        if len == 0 {
            return Ok(());
        }
        self.stats.frames_received += 1;

        let frame = self.frame.as_slice();
        debug!("RX {} bytes: {:02X?}", len, frame);

        if let Err(rejection) = validate_request(frame, self.slave_id) {
            match rejection {
                Rejection::TooShort { .. } => self.stats.dropped_short += 1,
                Rejection::ForeignAddress { .. } => self.stats.dropped_foreign += 1,
                Rejection::CrcMismatch { .. } => self.stats.dropped_crc += 1,
            }
            debug!("Slave {}: dropped frame, {}", self.slave_id, rejection);
            return Ok(());
        }

        match dispatch(frame, &mut self.registers, &mut self.response) {
            Dispatch::Reply => {
                self.transmitter.send(&mut self.transport, &self.response)?;
                self.stats.responses_sent += 1;
                self.watchdog.clear();
            },
            Dispatch::Exception(_) => {
                self.transmitter.send(&mut self.transport, &self.response)?;
                self.stats.exceptions_sent += 1;
            },
            Dispatch::Discard => {
                self.stats.dropped_byte_count += 1;
            },
        }

        Ok(())
    }

    #[inline]
    pub fn alarm(&self) -> Alarm {
        self.watchdog.alarm()
    }

    #[inline]
    pub fn slave_id(&self) -> u8 {
        self.slave_id
    }

    #[inline]
    pub fn timing(&self) -> RtuTiming {
        self.timing
    }

    #[inline]
    pub fn stats(&self) -> SlaveStats {
        self.stats
    }

    /// Register store, as last written by the master or the caller
    #[inline]
    pub fn registers(&self) -> &[u16] {
        self.registers.as_slice()
    }

    #[inline]
    pub fn registers_mut(&mut self) -> &mut [u16] {
        self.registers.as_mut_slice()
    }

    #[inline]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[inline]
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Tear down the slave and hand back the transport and register store
    pub fn into_parts(self) -> (T, S) {
        (self.transport, self.registers.into_inner())
    }
}

impl<T, S> std::fmt::Debug for RtuSlave<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RtuSlave")
            .field("slave_id", &self.slave_id)
            .field("timing", &self.timing)
            .field("frame_capacity", &self.frame.capacity())
            .field("transmitter", &self.transmitter)
            .field("alarm", &self.watchdog.alarm())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedBus;
    use std::time::Duration;

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = SlaveConfig {
            slave_id: 0,
            ..Default::default()
        };
        let result = RtuSlave::new(SimulatedBus::new(), &config, vec![0u16; 4]);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_rejects_empty_store() {
        let result = RtuSlave::new(SimulatedBus::new(), &SlaveConfig::default(), Vec::<u16>::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_silence_clock_starts_at_construction() {
        let bus = SimulatedBus::new();
        bus.advance(Duration::from_secs(100));
        let config = SlaveConfig {
            silence_timeout_ms: 1000,
            ..Default::default()
        };
        let mut slave = RtuSlave::new(bus.clone(), &config, vec![0u16; 4]).expect("valid slave");

        bus.advance(Duration::from_millis(500));
        assert_eq!(slave.poll(), Alarm::None);
    }

    #[test]
    fn test_into_parts_returns_store() {
        let mut store = [0u16; 3];
        let slave = RtuSlave::new(SimulatedBus::new(), &SlaveConfig::default(), &mut store[..])
            .expect("valid slave");
        let (_bus, registers) = slave.into_parts();
        registers[1] = 9;
        assert_eq!(store, [0, 9, 0]);
    }
}
