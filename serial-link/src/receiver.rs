//! Receive-side frame parser.
//!
//! [`FrameReceiver`] consumes one byte per resumption and walks the
//! [`RxPhase`] machine:
//!
//! - Bytes before a start marker are **noise** and are discarded one at a
//!   time, so the parser resynchronises on its own after garbage.
//! - A checksum mismatch or a bad end marker silently drops the frame and
//!   returns to [`RxPhase::AwaitStart`].  No error is surfaced; the sender
//!   notices only that no ACK arrived.
//! - A frame that passes both checks is stored as the last decoded result
//!   and acknowledged with a single [`ACK`] byte on the port.
//!
//! Exactly one frame's worth of state lives at a time; nothing carries over
//! from one frame to the next.

use crate::config::LinkConfig;
use crate::frame::{Frame, ACK, END, START};
use crate::port::BytePort;
use crate::state::{RxPhase, Step};

/// Counters describing what the receiver has seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RxStats {
    /// Frames that passed validation (one ACK each when polled via a port).
    pub accepted: u64,
    pub checksum_failures: u64,
    /// Frames whose checksum matched but whose last byte was not [`END`].
    pub bad_end_markers: u64,
    /// LENGTH bytes larger than the configured capacity.
    pub oversize_lengths: u64,
    /// Bytes discarded while hunting for a start marker.
    pub noise_bytes: u64,
}

/// Byte-at-a-time frame parser for one link.
#[derive(Debug)]
pub struct FrameReceiver {
    phase: RxPhase,
    capacity: u8,
    /// Payload bytes collected for the frame in progress.
    buffer: Vec<u8>,
    /// LENGTH byte of the frame in progress.
    expected: u8,
    /// Running XOR over `buffer`.
    running: u8,
    last: Option<Frame>,
    stats: RxStats,
}

impl Default for FrameReceiver {
    fn default() -> Self {
        Self::new(&LinkConfig::default())
    }
}

impl FrameReceiver {
    pub fn new(config: &LinkConfig) -> Self {
        Self::with_capacity(config.capacity)
    }

    /// Create a receiver accepting payloads of up to `capacity` bytes.
    pub fn with_capacity(capacity: u8) -> Self {
        Self {
            phase: RxPhase::AwaitStart,
            capacity,
            buffer: Vec::with_capacity(usize::from(capacity)),
            expected: 0,
            running: 0,
            last: None,
            stats: RxStats::default(),
        }
    }

    pub fn phase(&self) -> RxPhase {
        self.phase
    }

    pub fn capacity(&self) -> u8 {
        self.capacity
    }

    /// Number of payload bytes collected for the frame in progress.
    pub fn consumed(&self) -> usize {
        self.buffer.len()
    }

    /// The most recently accepted frame, if any.
    pub fn last_frame(&self) -> Option<&Frame> {
        self.last.as_ref()
    }

    pub fn stats(&self) -> RxStats {
        self.stats
    }

    /// Resume the parser once.
    ///
    /// Takes at most one byte from `port`.  Returns [`Step::Waiting`] when no
    /// byte is available (state untouched), [`Step::Completed`] with the
    /// decoded frame after writing an [`ACK`] to `port`, and
    /// [`Step::Progressed`] for every other byte.
    pub fn poll<P: BytePort>(&mut self, port: &mut P) -> Step<Frame> {
        let Some(byte) = port.take() else {
            return Step::Waiting;
        };

        match self.feed(byte) {
            Some(frame) => {
                port.write(ACK);
                log::debug!("[rx] → ACK (len={})", frame.len());
                Step::Completed(frame)
            }
            None => Step::Progressed,
        }
    }

    /// Advance the machine by one byte without any I/O.
    ///
    /// Returns the decoded frame when `byte` completes a valid frame.
    pub fn feed(&mut self, byte: u8) -> Option<Frame> {
        match self.phase {
            RxPhase::AwaitStart => {
                if byte == START {
                    self.begin_frame();
                    self.phase = RxPhase::ReadLength;
                } else {
                    self.stats.noise_bytes += 1;
                }
                None
            }

            RxPhase::ReadLength => {
                if byte > self.capacity {
                    log::debug!(
                        "[rx] length {byte} exceeds capacity {}; dropping frame",
                        self.capacity
                    );
                    self.stats.oversize_lengths += 1;
                    self.phase = RxPhase::AwaitStart;
                    return None;
                }
                self.expected = byte;
                self.phase = if byte > 0 {
                    RxPhase::ReadPayload
                } else {
                    RxPhase::VerifyChecksum
                };
                None
            }

            RxPhase::ReadPayload => {
                self.buffer.push(byte);
                self.running ^= byte;
                if self.buffer.len() == usize::from(self.expected) {
                    self.phase = RxPhase::VerifyChecksum;
                }
                None
            }

            RxPhase::VerifyChecksum => {
                if byte == self.running {
                    self.phase = RxPhase::AwaitEnd;
                } else {
                    log::debug!(
                        "[rx] checksum mismatch: computed {:#04x}, received {byte:#04x}",
                        self.running
                    );
                    self.stats.checksum_failures += 1;
                    self.phase = RxPhase::AwaitStart;
                }
                None
            }

            RxPhase::AwaitEnd => {
                self.phase = RxPhase::AwaitStart;
                if byte != END {
                    log::debug!("[rx] bad end marker {byte:#04x}; dropping frame");
                    self.stats.bad_end_markers += 1;
                    return None;
                }

                let frame = Frame::new(std::mem::take(&mut self.buffer));
                self.stats.accepted += 1;
                self.last = Some(frame.clone());
                Some(frame)
            }
        }
    }

    /// Feed a whole byte stream and collect every frame it completes.
    pub fn feed_all(&mut self, bytes: &[u8]) -> Vec<Frame> {
        bytes.iter().filter_map(|&b| self.feed(b)).collect()
    }

    /// Abandon any frame in progress and return to [`RxPhase::AwaitStart`].
    ///
    /// The last accepted frame and the counters are kept.
    pub fn reset(&mut self) {
        self.begin_frame();
        self.phase = RxPhase::AwaitStart;
    }

    fn begin_frame(&mut self) {
        self.buffer.clear();
        self.expected = 0;
        self.running = 0;
    }
}
