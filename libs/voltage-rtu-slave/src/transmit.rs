//! Response transmission
//!
//! Sequence for every reply:
//! 1. assert direction control (transmit mode)
//! 2. write the frame
//! 3. flush, so the last stop bit has left the UART
//! 4. hold the line for 3.5 character times
//! 5. release direction control (receive mode)
//!
//! Releasing before the flush completes truncates the reply on the bus.

use std::time::Duration;
use tracing::{debug, warn};

use crate::direction::DirectionControl;
use crate::error::{Result, RtuError};
use crate::transport::Transport;

/// Frames replies onto a half-duplex line
pub struct Transmitter {
    direction: Option<Box<dyn DirectionControl>>,
    frame_gap: Duration,
}

impl Transmitter {
    pub fn new(frame_gap: Duration) -> Self {
        Self {
            direction: None,
            frame_gap,
        }
    }

    /// Attach the direction control line; allowed once
    pub fn attach(&mut self, line: Box<dyn DirectionControl>) -> Result<()> {
        if self.direction.is_some() {
            return Err(RtuError::config("Direction control already attached"));
        }
        self.direction = Some(line);
        Ok(())
    }

    pub fn has_direction_control(&self) -> bool {
        self.direction.is_some()
    }

    /// Transmit `frame` and hold the end-of-frame silence
    pub fn send<T: Transport + ?Sized>(&mut self, transport: &mut T, frame: &[u8]) -> Result<()> {
        if let Some(line) = self.direction.as_mut() {
            line.set_transmit(true)?;
        }

        let written = transport.write_all(frame).and_then(|()| transport.flush());

        // Gap is held even after a failed write
        transport.delay(self.frame_gap);

        if let Some(line) = self.direction.as_mut() {
            if let Err(e) = line.set_transmit(false) {
                warn!("Failed to release direction control: {}", e);
                written?;
                return Err(e);
            }
        }

        written?;
        debug!("TX {} bytes: {:02X?}", frame.len(), frame);
        Ok(())
    }
}

impl std::fmt::Debug for Transmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transmitter")
            .field("direction", &self.direction.is_some())
            .field("frame_gap", &self.frame_gap)
            .finish()
    }
}
