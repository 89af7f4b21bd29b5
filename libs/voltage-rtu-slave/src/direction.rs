//! RS-485 direction control
//!
//! A half-duplex transceiver has a driver-enable line (DE, usually tied to
//! /RE) that must be asserted while the slave transmits and released
//! afterwards so the bus returns to receive mode.
//!
//! - `DirectionControl` is what the engine toggles
//! - `GpioDriver` abstracts the GPIO backend
//! - `SysfsGpioDriver` drives Linux sysfs GPIO lines
//! - `GpioDirection` binds one GPIO line to the engine

use std::path::Path;
use tracing::{debug, warn};

use crate::error::{Result, RtuError};

/// Line switching a half-duplex transceiver between receive and transmit
pub trait DirectionControl: Send {
    /// `true` enables the transmitter, `false` returns to receive mode
    fn set_transmit(&mut self, enabled: bool) -> Result<()>;
}

/// GPIO backend
pub trait GpioDriver: Send + Sync {
    /// Write GPIO value
    fn write(&self, gpio_number: u32, value: bool) -> Result<()>;

    /// Export the line and configure it as an output
    fn setup_output(&self, gpio_number: u32) -> Result<()>;

    /// Check if driver is available
    fn is_available(&self) -> bool;
}

/// Sysfs GPIO driver for Linux
#[derive(Debug, Clone)]
pub struct SysfsGpioDriver {
    base_path: String,
}

impl SysfsGpioDriver {
    pub fn new(base_path: &str) -> Self {
        Self {
            base_path: base_path.to_string(),
        }
    }
}

impl Default for SysfsGpioDriver {
    fn default() -> Self {
        Self::new("/sys/class/gpio")
    }
}

impl GpioDriver for SysfsGpioDriver {
    fn write(&self, gpio_number: u32, value: bool) -> Result<()> {
        let path = format!("{}/gpio{}/value", self.base_path, gpio_number);
        let content = if value { "1" } else { "0" };
        std::fs::write(&path, content).map_err(|e| {
            warn!("Failed to write GPIO {}: {}", gpio_number, e);
            RtuError::direction(format!("GPIO {} write failed: {}", gpio_number, e))
        })
    }

    fn setup_output(&self, gpio_number: u32) -> Result<()> {
        let export_path = format!("{}/export", self.base_path);
        let gpio_path = format!("{}/gpio{}", self.base_path, gpio_number);

        if !Path::new(&gpio_path).exists() {
            if let Err(e) = std::fs::write(&export_path, gpio_number.to_string()) {
                // Already exported by someone else
                if !e.to_string().contains("Device or resource busy") {
                    return Err(RtuError::direction(format!(
                        "GPIO {} export failed: {}",
                        gpio_number, e
                    )));
                }
            }
        }

        let direction_path = format!("{}/direction", gpio_path);
        std::fs::write(&direction_path, "out").map_err(|e| {
            RtuError::direction(format!(
                "GPIO {} direction setup failed: {}",
                gpio_number, e
            ))
        })
    }

    fn is_available(&self) -> bool {
        Path::new(&self.base_path).exists()
    }
}

/// Direction control on a single GPIO line
pub struct GpioDirection {
    driver: Box<dyn GpioDriver>,
    gpio_number: u32,
    active_low: bool,
}

impl GpioDirection {
    /// Configure `gpio_number` as an output and leave it in receive mode
    pub fn new(driver: Box<dyn GpioDriver>, gpio_number: u32, active_low: bool) -> Result<Self> {
        if !driver.is_available() {
            return Err(RtuError::direction("GPIO driver not available"));
        }

        driver.setup_output(gpio_number)?;

        let mut line = Self {
            driver,
            gpio_number,
            active_low,
        };
        line.set_transmit(false)?;
        debug!(
            "GPIO {} configured as direction control (active_low={})",
            gpio_number, active_low
        );

        Ok(line)
    }

    /// Create with the sysfs driver rooted at `base_path`
    pub fn with_sysfs(base_path: &str, gpio_number: u32, active_low: bool) -> Result<Self> {
        Self::new(
            Box::new(SysfsGpioDriver::new(base_path)),
            gpio_number,
            active_low,
        )
    }

    pub fn gpio_number(&self) -> u32 {
        self.gpio_number
    }
}

impl DirectionControl for GpioDirection {
    fn set_transmit(&mut self, enabled: bool) -> Result<()> {
        self.driver.write(self.gpio_number, enabled != self.active_low)
    }
}

impl std::fmt::Debug for GpioDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpioDirection")
            .field("gpio_number", &self.gpio_number)
            .field("active_low", &self.active_low)
            .finish()
    }
}
