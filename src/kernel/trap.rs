// src/kernel/trap.rs

//! Trap dispatcher
//!
//! Single entry point for all interrupts: the assembly stubs normalize
//! every vector into a [`TrapFrame`] and call [`trap_entry`]. Policy lives
//! in [`handle_trap`], which is pure over its inputs (the frame, a port bus
//! for the EOI, the preemption flag) so the whole dispatch can be exercised
//! in hosted tests; the hardware-facing parts (real port bus, the actual
//! context switch) are supplied only by `trap_entry`.

use crate::arch::x86::pic::ChainedPics;
use crate::arch::x86::port::PortBus;
use crate::arch::x86::trap_frame::TrapFrame;
use crate::constants::{SYSCALL_VECTOR, TIMER_VECTOR};
use crate::errors::{KernelResult, TrapError};
use crate::kernel::syscall;
use crate::kernel::task::scheduler;
use crate::println;

/// What a vector means to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapKind {
    /// Remapped PIC interrupt (vectors 32-47); needs an EOI.
    HardwareIrq(u32),
    /// `int 0x80` from a task.
    Syscall,
    /// CPU exception or stray software interrupt.
    Unexpected(u32),
}

impl TrapKind {
    /// Classify a raw vector number.
    #[must_use]
    pub fn classify(vector: u32) -> Self {
        if ChainedPics::standard().handles(vector) {
            TrapKind::HardwareIrq(vector)
        } else if vector == SYSCALL_VECTOR {
            TrapKind::Syscall
        } else {
            TrapKind::Unexpected(vector)
        }
    }
}

/// What the caller must do after a trap is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapAction {
    /// Return to the interrupted context.
    Resume,
    /// Hand the CPU to the scheduler before returning.
    Reschedule,
}

/// Dispatch one trap.
///
/// Hardware interrupts are acknowledged at the PIC no matter what; losing
/// an EOI silences the IRQ line forever. A timer tick additionally requests
/// a reschedule once `preemption` is on. Syscalls are routed by the saved
/// `eax`, and the result overwrites it so the `iretd` delivers it to the
/// caller; `sys_yield` turns into a reschedule after the frame is updated.
///
/// Unexpected vectors are reported as an error and otherwise ignored - the
/// faulting context is resumed as-is.
pub fn handle_trap(
    frame: &mut TrapFrame,
    bus: &mut impl PortBus,
    preemption: bool,
) -> KernelResult<TrapAction> {
    match TrapKind::classify(frame.interrupt) {
        TrapKind::HardwareIrq(vector) => {
            ChainedPics::standard().end_of_interrupt(vector, bus);
            if vector == TIMER_VECTOR && preemption {
                Ok(TrapAction::Reschedule)
            } else {
                Ok(TrapAction::Resume)
            }
        }
        TrapKind::Syscall => {
            let number = frame.eax;
            frame.eax = syscall::dispatch(number, frame.ebx, frame.ecx, frame.edx) as u32;
            if number == syscall::SYS_YIELD {
                Ok(TrapAction::Reschedule)
            } else {
                Ok(TrapAction::Resume)
            }
        }
        TrapKind::Unexpected(vector) => Err(TrapError::UnexpectedVector(vector).into()),
    }
}

/// Rust-side interrupt entry, called by the common assembly stub with the
/// frame it just built on the current kernel stack.
///
/// A reschedule happens *after* the frame is complete: the scheduler's
/// switch parks this whole call chain on the outgoing task's kernel stack,
/// and when the task is next selected the chain unwinds through the stub's
/// `iretd` as if the trap had just finished.
pub extern "C" fn trap_entry(frame: &mut TrapFrame) {
    // SAFETY: interrupt context is ring 0
    let mut bus = unsafe { crate::arch::x86::port::IoPortBus::new() };
    match handle_trap(frame, &mut bus, scheduler::preemption_enabled()) {
        Ok(TrapAction::Resume) => {}
        Ok(TrapAction::Reschedule) => scheduler::schedule(),
        Err(err) => {
            println!(
                "[trap] {} error={:#010x} eip={:#010x}",
                err, frame.error, frame.eip
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::x86::port::mock::RecordingBus;
    use crate::errors::{ErrorKind, TrapError};

    fn frame_for(vector: u32) -> TrapFrame {
        // all-zero is a valid frame; every field is a plain u32
        let mut frame: TrapFrame = unsafe { core::mem::zeroed() };
        frame.interrupt = vector;
        frame
    }

    #[test]
    fn test_classify_partitions_vector_space() {
        assert_eq!(TrapKind::classify(0), TrapKind::Unexpected(0));
        assert_eq!(TrapKind::classify(13), TrapKind::Unexpected(13));
        assert_eq!(TrapKind::classify(32), TrapKind::HardwareIrq(32));
        assert_eq!(TrapKind::classify(47), TrapKind::HardwareIrq(47));
        assert_eq!(TrapKind::classify(48), TrapKind::Unexpected(48));
        assert_eq!(TrapKind::classify(0x80), TrapKind::Syscall);
        assert_eq!(TrapKind::classify(0x81), TrapKind::Unexpected(0x81));
    }

    #[test]
    fn test_timer_tick_without_preemption_only_acknowledges() {
        let mut frame = frame_for(TIMER_VECTOR);
        let mut bus = RecordingBus::new();
        let action = handle_trap(&mut frame, &mut bus, false).unwrap();
        assert_eq!(action, TrapAction::Resume);
        assert_eq!(bus.writes, [(0x20, 0x20)]);
    }

    #[test]
    fn test_timer_tick_with_preemption_requests_reschedule() {
        let mut frame = frame_for(TIMER_VECTOR);
        let mut bus = RecordingBus::new();
        let action = handle_trap(&mut frame, &mut bus, true).unwrap();
        assert_eq!(action, TrapAction::Reschedule);
        assert_eq!(bus.writes, [(0x20, 0x20)]);
    }

    #[test]
    fn test_slave_irq_acknowledges_both_pics() {
        let mut frame = frame_for(44);
        let mut bus = RecordingBus::new();
        let action = handle_trap(&mut frame, &mut bus, true).unwrap();
        // only the timer vector triggers scheduling
        assert_eq!(action, TrapAction::Resume);
        assert_eq!(bus.writes, [(0xA0, 0x20), (0x20, 0x20)]);
    }

    #[test]
    fn test_syscall_result_lands_in_saved_eax() {
        let mut frame = frame_for(0x80);
        frame.eax = syscall::SYS_TASK_ID;
        let mut bus = RecordingBus::new();
        let action = handle_trap(&mut frame, &mut bus, true).unwrap();
        assert_eq!(action, TrapAction::Resume);
        // hosted global scheduler sits on the boot context
        assert_eq!(frame.eax, 0);
        assert!(bus.writes.is_empty(), "syscalls touch no ports");
    }

    #[test]
    fn test_invalid_syscall_returns_error_code() {
        let mut frame = frame_for(0x80);
        frame.eax = 99;
        let mut bus = RecordingBus::new();
        handle_trap(&mut frame, &mut bus, true).unwrap();
        assert_eq!(frame.eax as i32, syscall::ERR_INVALID_SYSCALL);
    }

    #[test]
    fn test_yield_syscall_requests_reschedule() {
        let mut frame = frame_for(0x80);
        frame.eax = syscall::SYS_YIELD;
        let mut bus = RecordingBus::new();
        let action = handle_trap(&mut frame, &mut bus, false).unwrap();
        // voluntary yield does not depend on the preemption flag
        assert_eq!(action, TrapAction::Reschedule);
        assert_eq!(frame.eax as i32, syscall::SUCCESS);
    }

    #[test]
    fn test_unexpected_vector_is_reported_not_dispatched() {
        let mut frame = frame_for(13);
        frame.error = 0x18;
        let mut bus = RecordingBus::new();
        let err = handle_trap(&mut frame, &mut bus, true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Trap(TrapError::UnexpectedVector(13)));
        assert!(bus.writes.is_empty());
    }
}
