//! Byte-port abstraction over the transport channel.
//!
//! The protocol engines never touch a device directly; they talk to a
//! [`BytePort`], one byte at a time.  This module also provides the in-memory
//! channel used by the simulator and the tests:
//!
//! ```text
//!   sender ──▶ Endpoint ──▶ [ downstream Slot ] ──▶ Endpoint ──▶ receiver
//!   sender ◀── Endpoint ◀── [  upstream Slot  ] ◀── Endpoint ◀── receiver
//! ```
//!
//! Each [`Slot`] holds at most one byte.  The producer is expected to wait
//! for the consumer before writing again; a write over an unread byte is
//! counted as an overrun and the old byte is lost.

/// One end of a duplex, single-byte-at-a-time transport.
pub trait BytePort {
    /// Deposit one byte for the peer and mark it available.
    fn write(&mut self, byte: u8);

    /// `true` when a byte from the peer is waiting to be taken.
    fn is_available(&self) -> bool;

    /// Observe the waiting byte without consuming it.
    fn peek(&self) -> Option<u8>;

    /// Consume the waiting byte, clearing availability.
    fn take(&mut self) -> Option<u8>;
}

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

/// Single-byte rendezvous buffer for one direction of the link.
#[derive(Debug, Clone, Default)]
pub struct Slot {
    byte: u8,
    available: bool,
    overruns: u64,
}

impl Slot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, byte: u8) {
        if self.available {
            self.overruns += 1;
            log::trace!("slot overrun: {:#04x} replaced by {byte:#04x}", self.byte);
        }
        self.byte = byte;
        self.available = true;
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn peek(&self) -> Option<u8> {
        self.available.then_some(self.byte)
    }

    pub fn take(&mut self) -> Option<u8> {
        let byte = self.peek();
        self.available = false;
        byte
    }

    /// Drop any waiting byte without reading it.
    pub fn clear(&mut self) {
        self.available = false;
    }

    /// Number of writes that replaced an unread byte.
    pub fn overruns(&self) -> u64 {
        self.overruns
    }
}

// ---------------------------------------------------------------------------
// SerialLink / Endpoint
// ---------------------------------------------------------------------------

/// In-memory duplex link: one [`Slot`] per direction.
#[derive(Debug, Clone, Default)]
pub struct SerialLink {
    /// Sender → receiver.
    pub downstream: Slot,
    /// Receiver → sender (ACKs).
    pub upstream: Slot,
}

impl SerialLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Port used by the sending side: writes downstream, reads upstream.
    pub fn sender_end(&mut self) -> Endpoint<'_> {
        Endpoint {
            outbound: &mut self.downstream,
            inbound: &mut self.upstream,
        }
    }

    /// Port used by the receiving side: reads downstream, writes upstream.
    pub fn receiver_end(&mut self) -> Endpoint<'_> {
        Endpoint {
            outbound: &mut self.upstream,
            inbound: &mut self.downstream,
        }
    }

    pub fn overruns(&self) -> u64 {
        self.downstream.overruns() + self.upstream.overruns()
    }
}

/// A [`BytePort`] view onto one end of a [`SerialLink`].
#[derive(Debug)]
pub struct Endpoint<'a> {
    outbound: &'a mut Slot,
    inbound: &'a mut Slot,
}

impl BytePort for Endpoint<'_> {
    fn write(&mut self, byte: u8) {
        self.outbound.put(byte);
    }

    fn is_available(&self) -> bool {
        self.inbound.is_available()
    }

    fn peek(&self) -> Option<u8> {
        self.inbound.peek()
    }

    fn take(&mut self) -> Option<u8> {
        self.inbound.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_clears_availability() {
        let mut slot = Slot::new();
        assert_eq!(slot.take(), None);

        slot.put(0x42);
        assert!(slot.is_available());
        assert_eq!(slot.peek(), Some(0x42));
        assert_eq!(slot.take(), Some(0x42));
        assert!(!slot.is_available());
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn overwrite_before_read_counts_overrun() {
        let mut slot = Slot::new();
        slot.put(1);
        slot.put(2);
        assert_eq!(slot.overruns(), 1);
        assert_eq!(slot.take(), Some(2));

        slot.put(3);
        assert_eq!(slot.overruns(), 1);
    }

    #[test]
    fn endpoints_cross_connect() {
        let mut link = SerialLink::new();

        link.sender_end().write(0x02);
        assert!(!link.sender_end().is_available());
        assert_eq!(link.receiver_end().take(), Some(0x02));

        link.receiver_end().write(0x06);
        assert_eq!(link.receiver_end().peek(), None);
        assert_eq!(link.sender_end().take(), Some(0x06));
        assert_eq!(link.overruns(), 0);
    }

    #[test]
    fn clear_discards_waiting_byte() {
        let mut slot = Slot::new();
        slot.put(9);
        slot.clear();
        assert_eq!(slot.peek(), None);
    }
}
