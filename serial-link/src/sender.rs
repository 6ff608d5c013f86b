//! Outbound frame transmission with stop-and-wait retransmission.
//!
//! [`FrameSender`] drives one "send this payload" request to completion.
//!
//! # Contract
//! - Exactly **one** byte is written per resumption while a frame is being
//!   emitted: start, length, payload bytes, checksum, end.
//! - After the end marker the engine arms a deadline of
//!   `now + ack_wait_period` and polls for the handshake to complete.
//! - On ACK the engine finishes with a [`Delivery`] and stays finished.
//! - On timeout `retries` is incremented and the whole frame is re-emitted,
//!   byte-for-byte identical to the first attempt.
//! - With `max_retries = None` the engine retries forever; with
//!   `Some(n)` it fails with [`SendError::RetriesExhausted`] once `n`
//!   retransmissions have timed out.
//!
//! The handshake completes either when an [`ACK`] byte is read from the port
//! during the wait phase or when the caller signals it via
//! [`FrameSender::acknowledge`].

use thiserror::Error;

use crate::clock::{Clock, Deadline, Tick};
use crate::config::LinkConfig;
use crate::frame::{checksum, FrameError, ACK, END, START};
use crate::port::BytePort;
use crate::state::{Step, TxPhase};

/// Successful completion of a send request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Timed-out attempts before the ACK arrived.
    pub retries: u32,
    /// Clock value at which the ACK was observed.
    pub acked_at: Tick,
}

/// Terminal sender failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("no ACK after {retries} retransmission(s)")]
    RetriesExhausted { retries: u32 },
}

/// Send-side state for one payload.
#[derive(Debug)]
pub struct FrameSender {
    payload: Vec<u8>,
    /// Computed once; reused for every retransmission.
    checksum: u8,
    phase: TxPhase,
    retries: u32,
    /// Set by [`acknowledge`](Self::acknowledge) or by an ACK read in the
    /// wait phase.
    handshake_complete: bool,
    ack_wait_period: Tick,
    max_retries: Option<u32>,
    delivery: Option<Delivery>,
}

impl FrameSender {
    /// Prepare to send `payload`.
    ///
    /// Fails if the payload does not fit in `config.capacity`.
    pub fn new(payload: impl Into<Vec<u8>>, config: &LinkConfig) -> Result<Self, FrameError> {
        let payload = payload.into();
        if payload.len() > usize::from(config.capacity) {
            return Err(FrameError::PayloadTooLarge {
                len: payload.len(),
                capacity: config.capacity,
            });
        }

        Ok(Self {
            checksum: checksum(&payload),
            payload,
            phase: TxPhase::StartMarker,
            retries: 0,
            handshake_complete: false,
            ack_wait_period: config.ack_wait_period,
            max_retries: config.max_retries,
            delivery: None,
        })
    }

    pub fn phase(&self) -> TxPhase {
        self.phase
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Number of timed-out attempts so far.  Never decreases.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// `true` once the engine has either delivered or given up.
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, TxPhase::Delivered | TxPhase::Abandoned)
    }

    /// Signal that the handshake completed, e.g. because the caller observed
    /// the ACK out of band.  Takes effect during the wait phase.
    pub fn acknowledge(&mut self) {
        self.handshake_complete = true;
    }

    /// Resume the engine once.
    ///
    /// Returns [`Step::Progressed`] after writing a byte or scheduling a
    /// retransmission, [`Step::Waiting`] while the ACK deadline is pending,
    /// and [`Step::Completed`] once the ACK has been observed.  Polling a
    /// delivered engine keeps returning the same [`Delivery`].
    pub fn poll<P: BytePort, C: Clock>(
        &mut self,
        port: &mut P,
        clock: &C,
    ) -> Result<Step<Delivery>, SendError> {
        match self.phase {
            TxPhase::StartMarker => {
                port.write(START);
                self.phase = TxPhase::Length;
            }
            TxPhase::Length => {
                port.write(self.payload_len());
                self.phase = if self.payload.is_empty() {
                    TxPhase::Checksum
                } else {
                    TxPhase::Payload(0)
                };
            }
            TxPhase::Payload(i) => {
                port.write(self.payload[usize::from(i)]);
                let next = i + 1;
                self.phase = if next == self.payload_len() {
                    TxPhase::Checksum
                } else {
                    TxPhase::Payload(next)
                };
            }
            TxPhase::Checksum => {
                port.write(self.checksum);
                self.phase = TxPhase::EndMarker;
            }
            TxPhase::EndMarker => {
                port.write(END);
                self.phase = TxPhase::AwaitAck { deadline: None };
            }
            TxPhase::AwaitAck { deadline } => return self.await_ack(port, clock.now(), deadline),
            TxPhase::Delivered => return Ok(self.delivery.map_or(Step::Waiting, Step::Completed)),
            TxPhase::Abandoned => {
                return Err(SendError::RetriesExhausted {
                    retries: self.retries,
                })
            }
        }
        Ok(Step::Progressed)
    }

    fn await_ack<P: BytePort>(
        &mut self,
        port: &mut P,
        now: Tick,
        deadline: Option<Deadline>,
    ) -> Result<Step<Delivery>, SendError> {
        let deadline = match deadline {
            Some(deadline) => deadline,
            None => {
                let armed = Deadline::after(now, self.ack_wait_period);
                self.phase = TxPhase::AwaitAck {
                    deadline: Some(armed),
                };
                armed
            }
        };

        if let Some(byte) = port.take() {
            if byte == ACK {
                self.handshake_complete = true;
            } else {
                log::trace!("[tx] ignoring {byte:#04x} while awaiting ACK");
            }
        }

        if self.handshake_complete {
            let delivery = Delivery {
                retries: self.retries,
                acked_at: now,
            };
            log::debug!("[tx] ← ACK after {} retransmission(s)", self.retries);
            self.delivery = Some(delivery);
            self.phase = TxPhase::Delivered;
            return Ok(Step::Completed(delivery));
        }

        if !deadline.expired(now) {
            return Ok(Step::Waiting);
        }

        if self.max_retries.is_some_and(|max| self.retries >= max) {
            log::warn!("[tx] giving up after {} retransmission(s)", self.retries);
            self.phase = TxPhase::Abandoned;
            return Err(SendError::RetriesExhausted {
                retries: self.retries,
            });
        }

        self.retries += 1;
        log::debug!(
            "[tx] ACK timeout at tick {now}; retransmitting (retry {})",
            self.retries
        );
        self.phase = TxPhase::StartMarker;
        Ok(Step::Progressed)
    }

    fn payload_len(&self) -> u8 {
        // Bounded by `capacity` in `new`.
        self.payload.len() as u8
    }
}
