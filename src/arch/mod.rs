// src/arch/mod.rs

//! Architecture-specific abstractions.

pub mod x86;

/// Trait for CPU-specific operations.
pub trait Cpu {
    /// Halt the CPU until the next interrupt.
    fn halt();

    /// Disable interrupts.
    fn disable_interrupts();

    /// Enable interrupts.
    fn enable_interrupts();
}
