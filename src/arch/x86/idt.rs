// src/arch/x86/idt.rs

//! Interrupt Descriptor Table
//!
//! 256 gates mapping vector numbers to handler stubs. Gates 0-47 (CPU
//! exceptions plus the remapped hardware IRQs) are ring-0 interrupt gates;
//! the single syscall gate at 0x80 is DPL 3 so ring-3 code may `int 0x80`
//! into it. All gates are interrupt gates, so the CPU clears IF on entry
//! and the dispatcher runs without being re-entered.

use crate::constants::{IDT_ENTRIES, KERNEL_CODE_SELECTOR, SYSCALL_VECTOR};

/// Ring-0 32-bit interrupt gate: present, DPL 0.
pub const GATE_KERNEL_INTERRUPT: u8 = 0x8E;
/// User-invocable 32-bit interrupt gate: present, DPL 3.
pub const GATE_USER_INTERRUPT: u8 = 0xEE;

/// Number of vectors with per-vector entry stubs (exceptions + IRQs).
pub const STUB_VECTORS: usize = 48;

/// One 8-byte gate descriptor in the packed hardware layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C, packed)]
pub struct GateDescriptor {
    isr_low: u16,
    selector: u16,
    reserved: u8,
    attributes: u8,
    isr_high: u16,
}

impl GateDescriptor {
    /// An absent gate; invoking its vector faults.
    pub const MISSING: Self = Self {
        isr_low: 0,
        selector: 0,
        reserved: 0,
        attributes: 0,
        isr_high: 0,
    };

    /// Pack a handler address, code selector and attribute byte.
    #[must_use]
    pub const fn new(handler: u32, selector: u16, attributes: u8) -> Self {
        Self {
            isr_low: (handler & 0xFFFF) as u16,
            selector,
            reserved: 0,
            attributes,
            isr_high: (handler >> 16) as u16,
        }
    }

    /// Decode the 32-bit handler address.
    #[must_use]
    pub const fn handler(&self) -> u32 {
        self.isr_low as u32 | (self.isr_high as u32) << 16
    }

    /// The code selector loaded on entry.
    #[must_use]
    pub const fn selector(&self) -> u16 {
        self.selector
    }

    /// Gate type, DPL and present bit.
    #[must_use]
    pub const fn attributes(&self) -> u8 {
        self.attributes
    }

    /// Present bit.
    #[must_use]
    pub const fn present(&self) -> bool {
        self.attributes & 0x80 != 0
    }
}

/// The full 256-entry table.
#[derive(Clone, Copy)]
#[repr(C, align(16))]
pub struct Idt {
    entries: [GateDescriptor; IDT_ENTRIES],
}

impl Idt {
    /// An all-absent table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [GateDescriptor::MISSING; IDT_ENTRIES],
        }
    }

    /// Build the fixed gate set from the per-vector stub addresses and the
    /// syscall stub address.
    ///
    /// Every gate embeds the kernel code selector, which is why the GDT
    /// must be configured first.
    #[must_use]
    pub fn build(stubs: &[u32; STUB_VECTORS], syscall_stub: u32) -> Self {
        let mut idt = Self::new();
        for (vector, &stub) in stubs.iter().enumerate() {
            idt.entries[vector] =
                GateDescriptor::new(stub, KERNEL_CODE_SELECTOR, GATE_KERNEL_INTERRUPT);
        }
        idt.entries[SYSCALL_VECTOR as usize] =
            GateDescriptor::new(syscall_stub, KERNEL_CODE_SELECTOR, GATE_USER_INTERRUPT);
        idt
    }

    /// Get a reference to the table's entries.
    #[must_use]
    pub fn entries(&self) -> &[GateDescriptor; IDT_ENTRIES] {
        &self.entries
    }
}

/// Global IDT instance, rebuilt by [`configure`].
#[cfg(target_arch = "x86")]
static mut IDT: Idt = Idt::new();

/// Remap the PIC and hand the gate table to the CPU.
///
/// Must run after [`crate::arch::x86::gdt::configure`] (the gates embed the
/// kernel code selector) and before interrupts are enabled.
#[cfg(target_arch = "x86")]
pub fn configure() {
    use crate::arch::x86::isr;
    use crate::arch::x86::pic::ChainedPics;
    use crate::arch::x86::port::IoPortBus;
    use x86::dtables::{DescriptorTablePointer, lidt};

    // SAFETY: boot-time ring-0 execution; the remap protocol is the one the
    // 8259 pair expects
    let mut bus = unsafe { IoPortBus::new() };
    ChainedPics::standard().remap(&mut bus);

    // SAFETY: runs once during boot, before interrupts exist
    unsafe {
        let idt = &mut *(&raw mut IDT);
        *idt = Idt::build(&isr::redirect_table(), isr::syscall_entry_addr());

        let pointer = DescriptorTablePointer {
            limit: (core::mem::size_of::<Idt>() - 1) as u16,
            base: idt.entries.as_ptr(),
        };
        lidt(&pointer);
    }
}
