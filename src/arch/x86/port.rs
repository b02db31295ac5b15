// src/arch/x86/port.rs

//! Port I/O abstraction
//!
//! The PIC and PIT speak bit-exact byte protocols over fixed ports. Devices
//! talk to a [`PortBus`] instead of issuing `out` directly, so the exact
//! write sequences can be captured and asserted in hosted tests; on the
//! target the bus is a thin wrapper over the `out` instruction.

/// A sink for 8-bit port writes.
///
/// Implementations must preserve write ordering: the PIC init sequence and
/// the PIT divisor handshake are defined by the order bytes hit the wire.
pub trait PortBus {
    /// Write one byte to an I/O port.
    fn write_u8(&mut self, port: u16, value: u8);
}

/// The real I/O bus, backed by the `out` instruction.
pub struct IoPortBus(());

impl IoPortBus {
    /// Create the hardware port bus.
    ///
    /// # Safety
    ///
    /// The caller must be running in ring 0 and must uphold each device's
    /// port protocol; arbitrary port writes can reconfigure hardware.
    #[must_use]
    pub const unsafe fn new() -> Self {
        Self(())
    }
}

impl PortBus for IoPortBus {
    #[inline]
    fn write_u8(&mut self, port: u16, value: u8) {
        // SAFETY: ring-0 execution and protocol correctness were promised
        // to IoPortBus::new
        unsafe { x86::io::outb(port, value) }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::PortBus;
    use std::vec::Vec;

    /// Test bus that records every (port, byte) write in order.
    pub struct RecordingBus {
        pub writes: Vec<(u16, u8)>,
    }

    impl RecordingBus {
        pub fn new() -> Self {
            Self { writes: Vec::new() }
        }
    }

    impl PortBus for RecordingBus {
        fn write_u8(&mut self, port: u16, value: u8) {
            self.writes.push((port, value));
        }
    }
}
