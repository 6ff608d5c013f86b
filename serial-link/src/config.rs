//! Link parameters shared by the sender and the receiver.

use thiserror::Error;

use crate::clock::Tick;
use crate::frame::DEFAULT_CAPACITY;

/// Default number of ticks the sender waits for an ACK before retransmitting.
pub const DEFAULT_ACK_WAIT_PERIOD: Tick = 100;

/// Adjustable protocol parameters.
///
/// Both ends of a link must agree on `capacity`; a receiver configured with a
/// smaller capacity rejects longer frames as oversize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    /// Maximum payload length in bytes (the LENGTH byte caps this at 255).
    pub capacity: u8,
    /// Ticks to wait for an ACK after the end marker has been sent.
    pub ack_wait_period: Tick,
    /// Give up after this many timed-out retransmissions.  `None` retries
    /// forever.
    pub max_retries: Option<u32>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ack_wait_period: DEFAULT_ACK_WAIT_PERIOD,
            max_retries: None,
        }
    }
}

impl LinkConfig {
    pub fn new(capacity: u8, ack_wait_period: Tick) -> Self {
        Self {
            capacity,
            ack_wait_period,
            max_retries: None,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.ack_wait_period == 0 {
            return Err(ConfigError::ZeroWaitPeriod);
        }
        Ok(())
    }
}

/// Rejected configuration values.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("payload capacity must be at least 1 byte")]
    ZeroCapacity,
    #[error("ACK wait period must be at least 1 tick")]
    ZeroWaitPeriod,
    #[error("{name} must be within [0.0, 1.0], got {value}")]
    InvalidRate { name: &'static str, value: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let cfg = LinkConfig::default();
        assert_eq!(cfg.capacity, 32);
        assert_eq!(cfg.ack_wait_period, 100);
        assert_eq!(cfg.max_retries, None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_values_rejected() {
        assert_eq!(
            LinkConfig::new(0, 100).validate(),
            Err(ConfigError::ZeroCapacity)
        );
        assert_eq!(
            LinkConfig::new(250, 0).validate(),
            Err(ConfigError::ZeroWaitPeriod)
        );
    }

    #[test]
    fn max_retries_builder() {
        let cfg = LinkConfig::new(250, 10).with_max_retries(3);
        assert_eq!(cfg.max_retries, Some(3));
        assert!(cfg.validate().is_ok());
    }
}
