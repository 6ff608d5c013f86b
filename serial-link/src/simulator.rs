//! Deterministic link simulator and cooperative scheduler.
//!
//! Real serial lines drop and corrupt bytes.  To exercise the retransmission
//! path without hardware, this module wraps a [`SerialLink`] and intercepts
//! writes, applying a configurable fault model:
//!
//! | Fault       | Description                                        |
//! |-------------|----------------------------------------------------|
//! | Byte loss   | Drop a written byte with probability `loss_rate`.  |
//! | Corruption  | Flip one random bit with probability `corrupt_rate`. |
//!
//! All randomness comes from a [`StdRng`] seeded from
//! [`SimulatorConfig::seed`], so a failing run can be replayed exactly.
//!
//! [`run_exchange`] is the scheduler: it resumes one [`FrameSender`] and one
//! [`FrameReceiver`] once per tick, in that order, until the sender finishes
//! or the tick budget runs out.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::{Clock, Tick, TickCounter};
use crate::config::{ConfigError, LinkConfig};
use crate::frame::{Frame, FrameError};
use crate::port::{BytePort, Endpoint, SerialLink};
use crate::receiver::{FrameReceiver, RxStats};
use crate::sender::{FrameSender, SendError};
use crate::state::Step;

/// Configuration for the fault-injection model.
///
/// Probabilities are in the range `[0.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Probability that any given byte is silently dropped.
    pub loss_rate: f64,
    /// Probability that a byte that survives has one bit flipped.
    pub corrupt_rate: f64,
    pub seed: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        // No faults by default — the simulator is a transparent pass-through.
        Self {
            loss_rate: 0.0,
            corrupt_rate: 0.0,
            seed: 0,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("loss_rate", self.loss_rate),
            ("corrupt_rate", self.corrupt_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidRate { name, value });
            }
        }
        Ok(())
    }
}

/// Fault counters accumulated by a [`Simulator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaultStats {
    pub dropped: u64,
    pub corrupted: u64,
}

/// A fault-injecting wrapper around an in-memory [`SerialLink`].
#[derive(Debug)]
pub struct Simulator {
    config: SimulatorConfig,
    link: SerialLink,
    rng: StdRng,
    faults: FaultStats,
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    /// Pass-through simulator with no faults.
    pub fn lossless() -> Self {
        Self::with_config(SimulatorConfig::default())
    }

    fn with_config(config: SimulatorConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            link: SerialLink::new(),
            faults: FaultStats::default(),
        }
    }

    pub fn link(&self) -> &SerialLink {
        &self.link
    }

    pub fn faults(&self) -> FaultStats {
        self.faults
    }

    pub fn sender_end(&mut self) -> FaultyPort<'_> {
        FaultyPort {
            inner: self.link.sender_end(),
            rng: &mut self.rng,
            config: &self.config,
            faults: &mut self.faults,
        }
    }

    pub fn receiver_end(&mut self) -> FaultyPort<'_> {
        FaultyPort {
            inner: self.link.receiver_end(),
            rng: &mut self.rng,
            config: &self.config,
            faults: &mut self.faults,
        }
    }
}

/// [`BytePort`] that applies the simulator's fault model to every write.
#[derive(Debug)]
pub struct FaultyPort<'a> {
    inner: Endpoint<'a>,
    rng: &'a mut StdRng,
    config: &'a SimulatorConfig,
    faults: &'a mut FaultStats,
}

impl BytePort for FaultyPort<'_> {
    fn write(&mut self, byte: u8) {
        if self.config.loss_rate > 0.0 && self.rng.random_bool(self.config.loss_rate) {
            self.faults.dropped += 1;
            log::trace!("[sim] dropped {byte:#04x}");
            return;
        }

        let mut byte = byte;
        if self.config.corrupt_rate > 0.0 && self.rng.random_bool(self.config.corrupt_rate) {
            let bit = self.rng.random_range(0..8u8);
            self.faults.corrupted += 1;
            log::trace!("[sim] flipped bit {bit} of {byte:#04x}");
            byte ^= 1u8 << bit;
        }
        self.inner.write(byte);
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    fn peek(&self) -> Option<u8> {
        self.inner.peek()
    }

    fn take(&mut self) -> Option<u8> {
        self.inner.take()
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Outcome of one simulated send request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeReport {
    /// `true` when the sender observed an ACK.
    pub delivered: bool,
    pub retries: u32,
    /// Ticks elapsed when the scheduler stopped.
    pub ticks: Tick,
    /// Every frame the receiver accepted, duplicates included.
    pub frames: Vec<Frame>,
    pub rx_stats: RxStats,
    pub faults: FaultStats,
    pub overruns: u64,
    /// Set when a retry ceiling ended the exchange.
    pub error: Option<SendError>,
}

/// Errors that prevent an exchange from starting.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Send `payload` across a simulated link, resuming the sender and then the
/// receiver once per tick, for at most `max_ticks` ticks.
pub fn run_exchange(
    payload: &[u8],
    link: &LinkConfig,
    sim: &SimulatorConfig,
    max_ticks: Tick,
) -> Result<ExchangeReport, ExchangeError> {
    link.validate()?;
    let mut simulator = Simulator::new(sim.clone())?;
    let mut sender = FrameSender::new(payload, link)?;
    let mut receiver = FrameReceiver::new(link);
    let mut clock = TickCounter::new();

    let mut frames = Vec::new();
    let mut delivered = false;
    let mut error = None;

    while clock.now() < max_ticks {
        match sender.poll(&mut simulator.sender_end(), &clock) {
            Ok(Step::Completed(_)) => {
                delivered = true;
                break;
            }
            Ok(_) => {}
            Err(e) => {
                error = Some(e);
                break;
            }
        }

        if let Step::Completed(frame) = receiver.poll(&mut simulator.receiver_end()) {
            frames.push(frame);
        }
        clock.advance();
    }

    let report = ExchangeReport {
        delivered,
        retries: sender.retries(),
        ticks: clock.now(),
        frames,
        rx_stats: receiver.stats(),
        faults: simulator.faults(),
        overruns: simulator.link().overruns(),
        error,
    };
    log::debug!(
        "[sim] exchange finished: delivered={} retries={} ticks={}",
        report.delivered,
        report.retries,
        report.ticks
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_transparent() {
        let mut sim = Simulator::lossless();
        for b in 0..=u8::MAX {
            sim.sender_end().write(b);
            assert_eq!(sim.receiver_end().take(), Some(b));
        }
        assert_eq!(sim.faults(), FaultStats::default());
    }

    #[test]
    fn invalid_rates_rejected() {
        let cfg = SimulatorConfig {
            loss_rate: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            Simulator::new(cfg),
            Err(ConfigError::InvalidRate {
                name: "loss_rate",
                ..
            })
        ));
    }

    #[test]
    fn total_loss_drops_everything() {
        let cfg = SimulatorConfig {
            loss_rate: 1.0,
            ..Default::default()
        };
        let mut sim = Simulator::new(cfg).unwrap();
        for b in 0..10 {
            sim.sender_end().write(b);
        }
        assert!(!sim.receiver_end().is_available());
        assert_eq!(sim.faults().dropped, 10);
    }

    #[test]
    fn corruption_flips_exactly_one_bit() {
        let cfg = SimulatorConfig {
            corrupt_rate: 1.0,
            seed: 7,
            ..Default::default()
        };
        let mut sim = Simulator::new(cfg).unwrap();
        for b in [0x00u8, 0xFF, 0x5A] {
            sim.sender_end().write(b);
            let got = sim.receiver_end().take().unwrap();
            assert_eq!((got ^ b).count_ones(), 1);
        }
        assert_eq!(sim.faults().corrupted, 3);
    }

    #[test]
    fn clean_exchange_delivers_without_retries() {
        let report = run_exchange(
            &[0xCA, 0xFE],
            &LinkConfig::default(),
            &SimulatorConfig::default(),
            1_000,
        )
        .unwrap();

        assert!(report.delivered);
        assert_eq!(report.retries, 0);
        assert_eq!(report.frames, vec![Frame::new(vec![0xCAu8, 0xFE])]);
        assert_eq!(report.overruns, 0);
        assert!(report.error.is_none());
    }

    #[test]
    fn oversize_payload_is_an_error() {
        let err = run_exchange(
            &[0u8; 40],
            &LinkConfig::default(),
            &SimulatorConfig::default(),
            100,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ExchangeError::Frame(FrameError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn retry_ceiling_ends_exchange() {
        let link = LinkConfig::new(32, 20).with_max_retries(1);
        let sim = SimulatorConfig {
            loss_rate: 1.0,
            ..Default::default()
        };
        let report = run_exchange(b"lost", &link, &sim, 10_000).unwrap();

        assert!(!report.delivered);
        assert_eq!(report.retries, 1);
        assert_eq!(
            report.error,
            Some(SendError::RetriesExhausted { retries: 1 })
        );
        assert!(report.frames.is_empty());
    }
}
