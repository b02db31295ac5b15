// src/arch/x86/pic.rs

//! Programmable Interrupt Controller (8259 PIC)
//!
//! Standard master/slave pair. On reset the PICs deliver IRQ 0-15 on
//! vectors 8-15, colliding with CPU exceptions, so [`ChainedPics::remap`]
//! moves them to 32-47 before the IDT is loaded.
//!
//! Acknowledgment is mandatory: until a handler writes EOI, the controller
//! holds the line and that IRQ never fires again.

use crate::arch::x86::port::PortBus;
use crate::constants::{
    IRQ_BASE_VECTOR, IRQ_SLAVE_VECTOR, PIC1_COMMAND, PIC1_DATA, PIC2_COMMAND,
    PIC2_DATA,
};

/// ICW1: edge-triggered, cascade, expect ICW4.
const ICW1_INIT: u8 = 0x11;
/// ICW3 for the master: slave on IRQ line 2.
const ICW3_MASTER: u8 = 0x04;
/// ICW3 for the slave: cascade identity 2.
const ICW3_SLAVE: u8 = 0x02;
/// ICW4: 8086/88 mode.
const ICW4_8086: u8 = 0x01;
/// End of Interrupt command.
const PIC_EOI: u8 = 0x20;

/// The chained master/slave PIC pair.
///
/// Holds only the vector offsets; all device state lives in the hardware,
/// reached through the [`PortBus`] passed to each operation so the byte
/// protocol is testable.
pub struct ChainedPics {
    offset1: u8,
    offset2: u8,
}

impl ChainedPics {
    /// Create a PIC pair delivering IRQ 0-7 at `offset1` and IRQ 8-15 at
    /// `offset2`.
    #[must_use]
    pub const fn new(offset1: u8, offset2: u8) -> Self {
        Self { offset1, offset2 }
    }

    /// The pair used by this kernel: vectors 32-47.
    #[must_use]
    pub const fn standard() -> Self {
        Self::new(IRQ_BASE_VECTOR as u8, IRQ_SLAVE_VECTOR as u8)
    }

    /// Run the ICW1-ICW4 initialization handshake.
    ///
    /// The byte sequence is the bit-exact hardware protocol: command ports
    /// get ICW1, then the data ports get the vector offset, the cascade
    /// wiring, the 8086-mode word, and finally an all-clear interrupt mask.
    pub fn remap(&self, bus: &mut impl PortBus) {
        bus.write_u8(PIC1_COMMAND, ICW1_INIT);
        bus.write_u8(PIC2_COMMAND, ICW1_INIT);
        bus.write_u8(PIC1_DATA, self.offset1);
        bus.write_u8(PIC2_DATA, self.offset2);
        bus.write_u8(PIC1_DATA, ICW3_MASTER);
        bus.write_u8(PIC2_DATA, ICW3_SLAVE);
        bus.write_u8(PIC1_DATA, ICW4_8086);
        bus.write_u8(PIC2_DATA, ICW4_8086);
        bus.write_u8(PIC1_DATA, 0x00);
        bus.write_u8(PIC2_DATA, 0x00);
    }

    /// Whether `vector` is a hardware interrupt this pair delivers: each
    /// controller owns eight vectors starting at its offset.
    #[must_use]
    pub const fn handles(&self, vector: u32) -> bool {
        let master = self.offset1 as u32;
        let slave = self.offset2 as u32;
        (vector >= master && vector < master + 8)
            || (vector >= slave && vector < slave + 8)
    }

    /// Acknowledge the interrupt for `vector`.
    ///
    /// Vectors from the slave (>= 40) are acknowledged at both controllers,
    /// slave first; master-range vectors only at the master.
    pub fn end_of_interrupt(&self, vector: u32, bus: &mut impl PortBus) {
        if vector >= self.offset2 as u32 {
            bus.write_u8(PIC2_COMMAND, PIC_EOI);
        }
        bus.write_u8(PIC1_COMMAND, PIC_EOI);
    }
}
