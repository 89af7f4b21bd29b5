//! Receive frame buffer and RTU frame assembly
//!
//! RTU frames carry no length or delimiters: a frame ends when the line has
//! been silent for 1.5 character times. The assembler reads one byte, waits
//! one inter-character gap and checks whether the next byte is already
//! there. If it is not, the frame is complete.
//!
//! The buffer has a fixed capacity and never grows. When a burst is longer
//! than the capacity, the write cursor wraps back to the start and the burst
//! keeps overwriting from position 0. The resulting "frame" is whatever
//! landed after the last wrap, which then almost always fails the CRC check.

use std::time::Duration;
use tracing::debug;

use crate::error::Result;
use crate::transport::Transport;

/// Fixed-capacity receive buffer with a wrapping write cursor
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    data: Box<[u8]>,
    len: usize,
}

impl FrameBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Append a byte, wrapping to position 0 when full
    ///
    /// Returns `true` when this byte caused a wrap.
    pub fn push_wrapping(&mut self, byte: u8) -> bool {
        let wrapped = self.len == self.data.len();
        if wrapped {
            self.len = 0;
        }
        self.data[self.len] = byte;
        self.len += 1;
        wrapped
    }

    /// Drain one frame from `transport` into the buffer
    ///
    /// Blocks for `char_gap` after every byte. Returns the frame length; zero
    /// means nothing was pending.
    pub fn fill_from<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
        char_gap: Duration,
    ) -> Result<usize> {
        self.clear();
        let mut received = 0usize;
        let mut wraps = 0usize;

        while transport.bytes_available()? > 0 {
            let byte = transport.read_byte()?;
            if self.push_wrapping(byte) {
                wraps += 1;
            }
            received += 1;
            transport.delay(char_gap);
        }

        if wraps > 0 {
            debug!(
                "Frame overflow: {} bytes received into {}-byte buffer, wrapped {} time(s)",
                received,
                self.capacity(),
                wraps
            );
        }

        Ok(self.len)
    }
}
