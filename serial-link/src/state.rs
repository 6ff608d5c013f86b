//! Finite-state-machine types shared by the sender and the receiver.
//!
//! Transitions are *not* implemented here — they live in
//! [`crate::receiver`] and [`crate::sender`].  Keeping the phase types in
//! their own module makes it easy to inspect progress from tests and the
//! scheduler without reaching into either engine.

use std::fmt;

use crate::clock::Deadline;

/// Outcome of one resumption of a cooperative engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    /// Nothing could be done; the engine is blocked on input or on the clock.
    Waiting,
    /// One bounded unit of work was performed.
    Progressed,
    /// The engine produced a result.
    Completed(T),
}

impl<T> Step<T> {
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Consume the step and return the completed value, if any.
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Waiting | Self::Progressed => None,
        }
    }
}

/// Receiver parsing phases.
///
/// ```text
///            START
///  AwaitStart ─────▶ ReadLength ──len>0──▶ ReadPayload
///      ▲                 │                    │ count == len
///      │               len==0                 ▼
///      │                 └──────────────▶ VerifyChecksum
///      │ mismatch                             │ match
///      ├──────────────────────────────────────┤
///      │                                      ▼
///      └──────────── any byte ────────────  AwaitEnd
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RxPhase {
    /// Hunting for the start marker; everything else is noise.
    #[default]
    AwaitStart,
    ReadLength,
    ReadPayload,
    VerifyChecksum,
    /// Checksum matched; the next byte must be the end marker.
    AwaitEnd,
}

/// Sender phases within one transmission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxPhase {
    #[default]
    StartMarker,
    Length,
    /// Emitting the payload byte at this index.
    Payload(u8),
    Checksum,
    EndMarker,
    /// Frame fully emitted; waiting for ACK or the deadline.
    ///
    /// `deadline` is `None` until the first resumption in this phase arms it.
    AwaitAck {
        deadline: Option<Deadline>,
    },
    /// ACK observed; the engine has finished.
    Delivered,
    /// Retry ceiling reached without an ACK.
    Abandoned,
}

impl fmt::Display for RxPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl fmt::Display for TxPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payload(i) => write!(f, "Payload[{i}]"),
            Self::AwaitAck { deadline: Some(d) } => write!(f, "AwaitAck(until {})", d.at()),
            Self::AwaitAck { deadline: None } => write!(f, "AwaitAck"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_initial_phases() {
        assert_eq!(RxPhase::default(), RxPhase::AwaitStart);
        assert_eq!(TxPhase::default(), TxPhase::StartMarker);
    }

    #[test]
    fn step_completed_extracts_value() {
        assert_eq!(Step::Completed(7).completed(), Some(7));
        assert_eq!(Step::<u8>::Progressed.completed(), None);
        assert!(Step::<u8>::Waiting.is_waiting());
    }

    #[test]
    fn tx_phase_display() {
        assert_eq!(TxPhase::Payload(3).to_string(), "Payload[3]");
        assert_eq!(
            TxPhase::AwaitAck {
                deadline: Some(Deadline::after(6, 100))
            }
            .to_string(),
            "AwaitAck(until 106)"
        );
        assert_eq!(TxPhase::Delivered.to_string(), "Delivered");
    }
}
