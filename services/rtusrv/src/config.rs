//! rtusrv configuration
//!
//! Priority (highest to lowest):
//! 1. Command line overrides
//! 2. Environment variables (`RTUSRV_` prefix, `__` between nested keys)
//! 3. Config file (YAML, TOML or JSON by extension; optional)
//! 4. Default values

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use voltage_rtu_slave::{f32_to_registers, SerialSettings, SlaveConfig};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "RTUSRV_";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RtuSrvConfig {
    pub serial: SerialSettings,
    pub slave: SlaveSection,
    pub registers: RegisterSection,
    pub direction: Option<DirectionSection>,
    pub logging: LoggingSection,
    /// Sleep between polls that found the line idle (microseconds, 0 = busy loop)
    pub poll_idle_us: u64,
}

impl Default for RtuSrvConfig {
    fn default() -> Self {
        Self {
            serial: SerialSettings::default(),
            slave: SlaveSection::default(),
            registers: RegisterSection::default(),
            direction: None,
            logging: LoggingSection::default(),
            poll_idle_us: 200,
        }
    }
}

/// Slave identity and supervision; the baud rate comes from `serial`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaveSection {
    pub slave_id: u8,
    pub base_address: u16,
    pub silence_timeout_ms: u64,
    pub frame_capacity: usize,
}

impl Default for SlaveSection {
    fn default() -> Self {
        let defaults = SlaveConfig::default();
        Self {
            slave_id: defaults.slave_id,
            base_address: defaults.base_address,
            silence_timeout_ms: defaults.silence_timeout_ms,
            frame_capacity: defaults.frame_capacity,
        }
    }
}

/// Holding register store owned by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterSection {
    /// Number of registers starting at `slave.base_address`
    pub count: usize,
    pub initial: Vec<RegisterInit>,
}

impl Default for RegisterSection {
    fn default() -> Self {
        Self {
            count: 64,
            initial: Vec::new(),
        }
    }
}

/// Initial register content; exactly one of `value` / `float`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInit {
    pub address: u16,
    #[serde(default)]
    pub value: Option<u16>,
    /// Stored high word first in `address` and `address + 1`
    #[serde(default)]
    pub float: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectionSection {
    pub gpio: u32,
    #[serde(default = "default_sysfs_path")]
    pub sysfs_path: String,
    #[serde(default)]
    pub active_low: bool,
}

fn default_sysfs_path() -> String {
    "/sys/class/gpio".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Default filter when `RUST_LOG` is not set
    pub level: String,
    /// Daily rolling log files go here; console when unset
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

impl RtuSrvConfig {
    /// Load defaults, then `path` (if it exists), then the environment
    pub fn load(path: &Path) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(RtuSrvConfig::default()));

        let figment = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
            Some("toml") => figment.merge(Toml::file(path)),
            Some("json") => figment.merge(Json::file(path)),
            Some(other) => bail!("Unsupported config file format: {}", other),
            None => bail!("Config file must have an extension: {}", path.display()),
        };

        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load configuration from {}", path.display()))
    }

    /// Engine configuration
    pub fn slave_config(&self) -> SlaveConfig {
        SlaveConfig {
            slave_id: self.slave.slave_id,
            baud_rate: self.serial.baud_rate,
            base_address: self.slave.base_address,
            silence_timeout_ms: self.slave.silence_timeout_ms,
            frame_capacity: self.slave.frame_capacity,
        }
    }

    pub fn poll_idle(&self) -> Duration {
        Duration::from_micros(self.poll_idle_us)
    }

    pub fn validate(&self) -> Result<()> {
        self.serial.validate()?;
        self.slave_config().validate()?;
        self.build_store()?;
        Ok(())
    }

    /// Allocate the register store and apply initial values
    pub fn build_store(&self) -> Result<Vec<u16>> {
        let base = self.slave.base_address;
        let count = self.registers.count;
        if count == 0 {
            bail!("registers.count must be greater than zero");
        }

        let mut store = vec![0u16; count];
        for init in &self.registers.initial {
            let index = init
                .address
                .checked_sub(base)
                .map(usize::from)
                .filter(|&i| i < count)
                .with_context(|| {
                    format!(
                        "Initial register {} outside store [{}, {})",
                        init.address,
                        base,
                        usize::from(base) + count
                    )
                })?;

            match (init.value, init.float) {
                (Some(value), None) => store[index] = value,
                (None, Some(value)) => {
                    if index + 1 >= count {
                        bail!(
                            "Float at register {} needs two registers inside the store",
                            init.address
                        );
                    }
                    store[index..index + 2].copy_from_slice(&f32_to_registers(value));
                },
                _ => bail!(
                    "Initial register {} must set exactly one of value or float",
                    init.address
                ),
            }
        }

        Ok(store)
    }
}
