//! `serial-link` — reliable, checksummed framing over a single-slot byte
//! channel such as a UART.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────────┐  START LEN PAYLOAD CHK END  ┌────────────────┐
//!  │ FrameSender  │────────────────────────────▶│ FrameReceiver  │
//!  └──────┬───────┘                             └───────┬────────┘
//!         │                 ACK (0x06)                  │
//!         │◀────────────────────────────────────────────┘
//!         │
//!  ┌──────▼──────────────────────────────────────────────┐
//!  │  BytePort (one byte in flight per direction)        │
//!  └─────────────────────────────────────────────────────┘
//! ```
//!
//! Both engines are resumable: every `poll` performs one bounded step and
//! returns a [`Step`] instead of blocking.  A caller-owned loop (see
//! [`simulator::run_exchange`]) interleaves them on a single thread and
//! advances the logical [`clock`].
//!
//! Each module has a single responsibility:
//! - [`frame`]     — wire format and XOR checksum
//! - [`receiver`]  — byte-at-a-time parsing state machine
//! - [`sender`]    — frame emission, ACK wait, retransmission
//! - [`state`]     — phase enums and the [`Step`] status
//! - [`port`]      — byte-port trait and the in-memory single-slot link
//! - [`clock`]     — logical tick clock and deadlines
//! - [`config`]    — link parameters
//! - [`simulator`] — fault injection and the cooperative scheduler

pub mod clock;
pub mod config;
pub mod frame;
pub mod port;
pub mod receiver;
pub mod sender;
pub mod simulator;
pub mod state;

pub use clock::{Clock, Deadline, Tick, TickCounter};
pub use config::{ConfigError, LinkConfig};
pub use frame::{checksum, decode_frame, encode_frame, Frame, FrameError, ACK, END, START};
pub use port::{BytePort, SerialLink};
pub use receiver::{FrameReceiver, RxStats};
pub use sender::{Delivery, FrameSender, SendError};
pub use state::{RxPhase, Step, TxPhase};
