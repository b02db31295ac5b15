// src/arch/x86/trap_frame.rs

//! Saved-register stack frames
//!
//! These two layouts are the binary contract between the Rust kernel and
//! the interrupt-entry/context-switch assembly. Every offset is pinned by
//! tests; changing a field here without changing the assembly (or vice
//! versa) corrupts register state on the next interrupt.

use crate::constants::{
    EFLAGS_IF, KERNEL_CODE_SELECTOR, KERNEL_DATA_SELECTOR, RPL_USER,
    USER_CODE_SELECTOR, USER_DATA_SELECTOR,
};

/// The register snapshot built by the common ISR entry stub, exactly as it
/// sits on the current kernel stack when the trap dispatcher runs.
///
/// Layout, lowest address first:
/// - segment registers pushed by the stub (`gs` first on the stack, so it
///   is the lowest field),
/// - the `pusha` image (`edi` lowest; `esp` is the pre-`pusha` value and is
///   ignored on restore),
/// - the vector number and error code pushed by the per-vector stub (a
///   dummy 0 error for vectors the CPU gives none),
/// - the words the CPU itself pushed: return address, code selector, flags,
///   and, only when the interrupt elevated privilege, the prior stack
///   pointer and stack selector.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct TrapFrame {
    // pushed by the stub:
    pub gs: u32,
    pub fs: u32,
    pub es: u32,
    pub ds: u32,
    pub edi: u32,
    pub esi: u32,
    pub ebp: u32,
    pub esp: u32, // ignored
    pub ebx: u32,
    pub edx: u32,
    pub ecx: u32,
    pub eax: u32,
    pub interrupt: u32,
    pub error: u32,

    // pushed by the CPU:
    pub eip: u32,
    pub cs: u32,
    pub eflags: u32,
    pub user_esp: u32,
    pub user_ss: u32,
}

/// Privilege level a task runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Ring 0; never takes a privilege-elevating trap.
    Kernel,
    /// Ring 3; enters the kernel through interrupts and `int 0x80`.
    User,
}

impl TaskKind {
    /// Code selector loaded by `iretd` when the task starts.
    #[must_use]
    pub const fn code_selector(self) -> u32 {
        match self {
            TaskKind::Kernel => KERNEL_CODE_SELECTOR as u32,
            TaskKind::User => (USER_CODE_SELECTOR | RPL_USER) as u32,
        }
    }

    /// Data/stack selector loaded when the task starts.
    #[must_use]
    pub const fn data_selector(self) -> u32 {
        match self {
            TaskKind::Kernel => KERNEL_DATA_SELECTOR as u32,
            TaskKind::User => (USER_DATA_SELECTOR | RPL_USER) as u32,
        }
    }
}

/// The synthetic kernel-stack image written by task creation.
///
/// To the context-switch primitive this is indistinguishable from the stack
/// of a task that was switched out moments ago: `switch_context` pops the
/// four callee-saved registers and `ret`s into `ret_addr`. For a fresh task
/// `ret_addr` is the startup trampoline, which pops `data_selector` into the
/// data segment registers and `iretd`s through the five-word tail - the same
/// instruction sequence an interrupt return uses, so first-ever entry and
/// "resume after interrupt" are bit-for-bit the same CPU operation.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct BootstrapFrame {
    // popped by switch_context:
    pub ebp: u32,
    pub edi: u32,
    pub esi: u32,
    pub ebx: u32,

    // popped by ret in switch_context:
    pub ret_addr: u32,

    // popped by the startup trampoline:
    pub data_selector: u32,

    // popped by iretd in the startup trampoline:
    pub eip: u32,
    pub cs: u32,
    pub eflags: u32,
    pub user_esp: u32,
    pub user_ss: u32,
}

impl BootstrapFrame {
    /// Build the first-switch-in image for a task.
    ///
    /// `trampoline` is the address `switch_context` will `ret` to; `entry`
    /// and `user_esp` are where the `iretd` lands. The flags image has IF
    /// set so the task runs with interrupts enabled from its first
    /// instruction.
    #[must_use]
    pub const fn new(trampoline: u32, entry: u32, user_esp: u32, kind: TaskKind) -> Self {
        Self {
            ebp: 0,
            edi: 0,
            esi: 0,
            ebx: 0,
            ret_addr: trampoline,
            data_selector: kind.data_selector(),
            eip: entry,
            cs: kind.code_selector(),
            eflags: EFLAGS_IF,
            user_esp,
            user_ss: kind.data_selector(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::{offset_of, size_of};

    #[test]
    fn test_trap_frame_layout() {
        // 19 words: 4 segments + 8 pusha + vector/error + 5 CPU words
        assert_eq!(size_of::<TrapFrame>(), 76);
        assert_eq!(offset_of!(TrapFrame, gs), 0);
        assert_eq!(offset_of!(TrapFrame, edi), 16);
        assert_eq!(offset_of!(TrapFrame, eax), 44);
        assert_eq!(offset_of!(TrapFrame, interrupt), 48);
        assert_eq!(offset_of!(TrapFrame, error), 52);
        assert_eq!(offset_of!(TrapFrame, eip), 56);
        assert_eq!(offset_of!(TrapFrame, user_ss), 72);
    }

    #[test]
    fn test_bootstrap_frame_layout() {
        assert_eq!(size_of::<BootstrapFrame>(), 44);
        assert_eq!(offset_of!(BootstrapFrame, ret_addr), 16);
        assert_eq!(offset_of!(BootstrapFrame, data_selector), 20);
        assert_eq!(offset_of!(BootstrapFrame, eip), 24);
    }

    #[test]
    fn test_bootstrap_tail_matches_trap_frame_tail() {
        // the iretd image of a fresh task must have the same shape as the
        // CPU-pushed tail of a trap frame; this is what makes first entry
        // and interrupt return the same operation
        let boot_tail = size_of::<BootstrapFrame>() - offset_of!(BootstrapFrame, eip);
        let trap_tail = size_of::<TrapFrame>() - offset_of!(TrapFrame, eip);
        assert_eq!(boot_tail, trap_tail);
        assert_eq!(
            offset_of!(BootstrapFrame, cs) - offset_of!(BootstrapFrame, eip),
            offset_of!(TrapFrame, cs) - offset_of!(TrapFrame, eip),
        );
        assert_eq!(
            offset_of!(BootstrapFrame, user_esp) - offset_of!(BootstrapFrame, eip),
            offset_of!(TrapFrame, user_esp) - offset_of!(TrapFrame, eip),
        );
    }

    #[test]
    fn test_user_frame_selectors() {
        let f = BootstrapFrame::new(0x1000, 0x4000_0000, 0xC8_0000, TaskKind::User);
        assert_eq!(f.cs, 0x1B);
        assert_eq!(f.data_selector, 0x23);
        assert_eq!(f.user_ss, 0x23);
        assert_eq!(f.eflags, 0x200);
        assert_eq!(f.eip, 0x4000_0000);
        assert_eq!(f.user_esp, 0xC8_0000);
        assert_eq!((f.ebp, f.edi, f.esi, f.ebx), (0, 0, 0, 0));
    }

    #[test]
    fn test_kernel_frame_selectors() {
        let f = BootstrapFrame::new(0x1000, 0x10_0000, 0xD8_0000, TaskKind::Kernel);
        assert_eq!(f.cs, 0x08);
        assert_eq!(f.data_selector, 0x10);
        assert_eq!(f.user_ss, 0x10);
    }
}
