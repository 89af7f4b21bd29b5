//! Slave engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{DEFAULT_FRAME_CAPACITY, MAX_ADU_SIZE, MAX_SLAVE_ID, MIN_FRAME_CAPACITY};
use crate::error::{Result, RtuError};
use crate::timing::RtuTiming;

/// Construction-time configuration of an [`RtuSlave`](crate::RtuSlave)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaveConfig {
    /// Address matched against byte 0 of every request
    pub slave_id: u8,
    /// Line baud rate, only used to derive the character gaps
    pub baud_rate: u32,
    /// Modbus address of the first register in the store
    pub base_address: u16,
    /// Silence after which the communication alarm is raised (milliseconds)
    pub silence_timeout_ms: u64,
    /// Receive buffer capacity; longer bursts wrap to the buffer start
    pub frame_capacity: usize,
}

impl Default for SlaveConfig {
    fn default() -> Self {
        Self {
            slave_id: 1,
            baud_rate: 9600,
            base_address: 0,
            silence_timeout_ms: 5_000,
            frame_capacity: DEFAULT_FRAME_CAPACITY,
        }
    }
}

impl SlaveConfig {
    /// Silence timeout as a [`Duration`]
    pub fn silence_timeout(&self) -> Duration {
        Duration::from_millis(self.silence_timeout_ms)
    }

    /// Character gaps for the configured baud rate
    pub fn timing(&self) -> RtuTiming {
        RtuTiming::from_baud(self.baud_rate)
    }

    pub fn validate(&self) -> Result<()> {
        if self.slave_id == 0 || self.slave_id > MAX_SLAVE_ID {
            return Err(RtuError::config(format!(
                "Slave ID must be between 1 and {}, got {}",
                MAX_SLAVE_ID, self.slave_id
            )));
        }

        if self.baud_rate == 0 {
            return Err(RtuError::config("Baud rate must be greater than zero"));
        }

        if self.silence_timeout_ms == 0 {
            return Err(RtuError::config("Silence timeout must be greater than zero"));
        }

        if !(MIN_FRAME_CAPACITY..=MAX_ADU_SIZE).contains(&self.frame_capacity) {
            return Err(RtuError::config(format!(
                "Frame capacity must be between {} and {} bytes, got {}",
                MIN_FRAME_CAPACITY, MAX_ADU_SIZE, self.frame_capacity
            )));
        }

        Ok(())
    }
}
