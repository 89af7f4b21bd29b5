//! Polling loop
//!
//! Runs on a dedicated blocking thread: the engine's character-gap delays
//! must not be interrupted by an async scheduler.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use voltage_rtu_slave::{Alarm, RtuSlave, SlaveStats, Transport};

/// Poll `slave` until `shutdown` is set and return the final counters
pub fn run<T, S>(
    mut slave: RtuSlave<T, S>,
    shutdown: Arc<AtomicBool>,
    idle: Duration,
) -> SlaveStats
where
    T: Transport,
    S: AsRef<[u16]> + AsMut<[u16]>,
{
    info!("Slave {} polling started", slave.slave_id());
    let mut alarm = Alarm::None;

    while !shutdown.load(Ordering::Relaxed) {
        let frames_before = slave.stats().frames_received;
        let current = slave.poll();

        if current != alarm {
            debug!("Alarm state {} -> {}", alarm, current);
            alarm = current;
        }

        if slave.stats().frames_received == frames_before && !idle.is_zero() {
            std::thread::sleep(idle);
        }
    }

    let stats = slave.stats();
    info!(
        "Slave {} stopped: {} frames, {} replies, {} exceptions, {} dropped, {} transport errors",
        slave.slave_id(),
        stats.frames_received,
        stats.responses_sent,
        stats.exceptions_sent,
        stats.dropped_short + stats.dropped_foreign + stats.dropped_crc + stats.dropped_byte_count,
        stats.transport_errors
    );
    stats
}
