// src/arch/x86/mod.rs

//! x86 (32-bit protected mode) hardware layer.
//!
//! Table layouts, the PIC/PIT port protocols and the saved-register frame
//! formats are plain data and compile everywhere; the privileged
//! instructions that load them (`lgdt`, `lidt`, `ltr`, `iretd`, the context
//! switch) only exist when building for the `x86` target.

pub mod cpu;
pub mod gdt;
pub mod idt;
pub mod pic;
pub mod pit;
pub mod port;
pub mod serial;
pub mod trap_frame;

#[cfg(target_arch = "x86")]
pub mod isr;
#[cfg(target_arch = "x86")]
pub mod switch;

pub use cpu::X86Cpu;

/// Address the context-switch primitive `ret`s to on a task's first
/// switch-in.
#[cfg(target_arch = "x86")]
#[must_use]
pub fn startup_trampoline_addr() -> u32 {
    switch::task_startup as unsafe extern "C" fn() as usize as u32
}

/// Hosted stand-in; there is no trampoline to jump to off-target.
#[cfg(not(target_arch = "x86"))]
#[must_use]
pub fn startup_trampoline_addr() -> u32 {
    0
}

/// Run `f` with interrupts masked, restoring IF afterwards only if it was
/// set on entry.
///
/// Any lock that is taken both from interrupt context and from normally
/// running code must be acquired through this, or a tick arriving while the
/// lock is held can switch to a task that spins on it forever (interrupt
/// gates clear IF, so nothing would ever preempt the spinner).
#[cfg(target_arch = "x86")]
pub fn without_interrupts<R>(f: impl FnOnce() -> R) -> R {
    let eflags: u32;
    // SAFETY: reads EFLAGS into a register, no other effects
    unsafe {
        core::arch::asm!("pushfd", "pop {}", out(reg) eflags, options(preserves_flags));
    }
    let enabled = eflags & crate::constants::EFLAGS_IF != 0;
    if enabled {
        // SAFETY: masking IF is always safe; the matching enable is below
        unsafe { x86::irq::disable() };
    }
    let result = f();
    if enabled {
        // SAFETY: IF was set on entry, so re-enabling restores the state
        unsafe { x86::irq::enable() };
    }
    result
}

/// Hosted stand-in: no interrupts to mask.
#[cfg(not(target_arch = "x86"))]
pub fn without_interrupts<R>(f: impl FnOnce() -> R) -> R {
    f()
}
