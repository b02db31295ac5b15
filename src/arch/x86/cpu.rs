// src/arch/x86/cpu.rs

use crate::arch::Cpu;

/// CPU operations for 32-bit x86.
pub struct X86Cpu;

impl Cpu for X86Cpu {
    fn halt() {
        // SAFETY: hlt only pauses until the next interrupt
        unsafe { x86::halt() }
    }

    fn disable_interrupts() {
        // SAFETY: clearing IF has no memory effects
        unsafe { x86::irq::disable() }
    }

    fn enable_interrupts() {
        // SAFETY: the caller must have the IDT loaded; in this kernel
        // interrupts are only enabled after idt::configure()
        unsafe { x86::irq::enable() }
    }
}
