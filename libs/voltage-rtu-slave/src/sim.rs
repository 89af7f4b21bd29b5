//! In-memory simulated RS-485 bus
//!
//! A [`Transport`] driven by a virtual clock. Inbound bytes are scheduled at
//! absolute timestamps and only become readable once the clock reaches them;
//! [`Transport::delay`] advances the clock. Everything the slave does to the
//! bus is recorded as an ordered list of [`BusEvent`]s.
//!
//! Clones share the same bus, so a test can move one handle into the engine
//! and keep another to script traffic and inspect the output.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crate::direction::DirectionControl;
use crate::error::{Result, RtuError};
use crate::transport::Transport;

/// Side effect observed on the simulated bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEvent {
    Write(Vec<u8>),
    Flush,
    Delay(Duration),
    Direction(bool),
}

#[derive(Debug, Default)]
struct BusState {
    now: Duration,
    inbound: VecDeque<(Duration, u8)>,
    written: Vec<u8>,
    events: Vec<BusEvent>,
    read_errors: usize,
    write_errors: usize,
}

/// Simulated half-duplex bus with a virtual clock
#[derive(Debug, Clone, Default)]
pub struct SimulatedBus {
    state: Arc<Mutex<BusState>>,
}

impl SimulatedBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Move the clock forward without recording an event
    pub fn advance(&self, duration: Duration) {
        self.state.lock().now += duration;
    }

    /// Schedule `bytes` starting at `start`, one every `spacing`
    ///
    /// The whole frame is queued atomically with respect to a concurrent reader.
    pub fn schedule_frame(&self, start: Duration, bytes: &[u8], spacing: Duration) {
        let mut state = self.state.lock();
        let mut at = start;
        for &byte in bytes {
            state.inbound.push_back((at, byte));
            at += spacing;
        }
        state.inbound.make_contiguous().sort_by_key(|(t, _)| *t);
    }

    /// Make `bytes` readable right now, as if already buffered by the UART
    pub fn push_frame(&self, bytes: &[u8]) {
        let mut state = self.state.lock();
        let now = state.now;
        state.inbound.extend(bytes.iter().map(|&byte| (now, byte)));
        state.inbound.make_contiguous().sort_by_key(|(t, _)| *t);
    }

    /// Bytes scheduled but not yet read, whether or not they have arrived
    pub fn pending(&self) -> usize {
        self.state.lock().inbound.len()
    }

    /// Fail the next `count` reads with an I/O error
    pub fn inject_read_errors(&self, count: usize) {
        self.state.lock().read_errors = count;
    }

    /// Fail the next `count` writes with an I/O error; nothing reaches the bus
    pub fn inject_write_errors(&self, count: usize) {
        self.state.lock().write_errors = count;
    }

    /// Drain everything written since the last call
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.state.lock().written)
    }

    /// Drain the event log
    pub fn take_events(&self) -> Vec<BusEvent> {
        std::mem::take(&mut self.state.lock().events)
    }

    /// Direction control line recording into this bus' event log
    pub fn direction_pin(&self) -> SimulatedPin {
        SimulatedPin {
            state: Arc::clone(&self.state),
        }
    }
}

impl Transport for SimulatedBus {
    fn bytes_available(&mut self) -> Result<usize> {
        let state = self.state.lock();
        let now = state.now;
        Ok(state.inbound.iter().take_while(|(t, _)| *t <= now).count())
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut state = self.state.lock();
        if state.read_errors > 0 {
            state.read_errors -= 1;
            return Err(RtuError::Io("simulated read failure".to_string()));
        }

        let now = state.now;
        match state.inbound.front() {
            Some(&(at, byte)) if at <= now => {
                state.inbound.pop_front();
                Ok(byte)
            },
            _ => Err(RtuError::Io("no byte available".to_string())),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        if state.write_errors > 0 {
            state.write_errors -= 1;
            return Err(RtuError::Io("simulated write failure".to_string()));
        }
        state.written.extend_from_slice(data);
        state.events.push(BusEvent::Write(data.to_vec()));
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.state.lock().events.push(BusEvent::Flush);
        Ok(())
    }

    fn elapsed(&self) -> Duration {
        self.now()
    }

    fn delay(&mut self, duration: Duration) {
        let mut state = self.state.lock();
        state.now += duration;
        state.events.push(BusEvent::Delay(duration));
    }
}

/// Direction control line of a [`SimulatedBus`]
#[derive(Debug, Clone)]
pub struct SimulatedPin {
    state: Arc<Mutex<BusState>>,
}

impl DirectionControl for SimulatedPin {
    fn set_transmit(&mut self, enabled: bool) -> Result<()> {
        self.state.lock().events.push(BusEvent::Direction(enabled));
        Ok(())
    }
}
