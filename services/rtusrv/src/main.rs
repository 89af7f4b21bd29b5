//! rtusrv - Modbus RTU slave service
//!
//! Exposes a block of holding registers on an RS-485 line. Opens the serial
//! port, allocates the register store, optionally drives a GPIO DE/RE line
//! and polls the slave engine until Ctrl-C.

mod config;
mod logging;
mod runner;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use voltage_rtu_slave::{GpioDirection, RtuSlave, SerialTransport};

use crate::config::RtuSrvConfig;

#[derive(Parser, Debug)]
#[command(name = "rtusrv")]
#[command(version, about = "VoltageEMS Modbus RTU slave service")]
struct Cli {
    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long, env = "RTUSRV_CONFIG", default_value = "config/rtusrv.yaml")]
    config: PathBuf,

    /// Serial port, overrides serial.port
    #[arg(short, long)]
    port: Option<String>,

    /// Slave address, overrides slave.slave_id
    #[arg(short, long)]
    slave_id: Option<u8>,

    /// Log level, overrides logging.level
    #[arg(short, long)]
    log_level: Option<String>,
}

impl Cli {
    fn apply(&self, config: &mut RtuSrvConfig) {
        if let Some(port) = &self.port {
            config.serial.port = port.clone();
        }
        if let Some(slave_id) = self.slave_id {
            config.slave.slave_id = slave_id;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = RtuSrvConfig::load(&cli.config)?;
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    let _log_guard = logging::init(&config.logging)?;
    info!(
        "rtusrv {} starting: slave {} on {} @ {} baud",
        env!("CARGO_PKG_VERSION"),
        config.slave.slave_id,
        config.serial.port,
        config.serial.baud_rate
    );

    let transport = SerialTransport::open(&config.serial)
        .with_context(|| format!("Failed to open serial port {}", config.serial.port))?;
    let store = config.build_store()?;
    let mut slave = RtuSlave::new(transport, &config.slave_config(), store)
        .context("Failed to create RTU slave")?;

    if let Some(direction) = &config.direction {
        let line = GpioDirection::with_sysfs(
            &direction.sysfs_path,
            direction.gpio,
            direction.active_low,
        )
        .with_context(|| format!("Failed to set up direction control GPIO {}", direction.gpio))?;
        slave.attach_direction_control(line)?;
        info!("Direction control on GPIO {}", direction.gpio);
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    let idle = config.poll_idle();
    let mut worker = tokio::task::spawn_blocking(move || runner::run(slave, flag, idle));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            info!("Shutdown requested");
        },
        result = &mut worker => {
            warn!("Polling worker exited unexpectedly");
            result.context("Polling worker panicked")?;
            return Ok(());
        },
    }

    shutdown.store(true, Ordering::Relaxed);
    let stats = worker.await.context("Polling worker panicked")?;
    info!("rtusrv stopped: {:?}", stats);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "rtusrv",
            "--port",
            "/dev/ttyS9",
            "--slave-id",
            "42",
            "--log-level",
            "debug",
        ]);
        let mut config = RtuSrvConfig::default();
        cli.apply(&mut config);

        assert_eq!(config.serial.port, "/dev/ttyS9");
        assert_eq!(config.slave.slave_id, 42);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(cli.config, PathBuf::from("config/rtusrv.yaml"));
    }

    #[test]
    fn test_cli_verifies() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
