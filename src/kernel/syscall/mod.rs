// src/kernel/syscall/mod.rs

//! System call interface
//!
//! Tasks enter through `int 0x80` with the call number in `eax` and up to
//! three arguments in `ebx`/`ecx`/`edx`. The dispatcher indexes a fixed
//! handler table and writes the result back into the caller's saved `eax`,
//! where the trap return delivers it.

use crate::kernel::task::scheduler::SCHEDULER;
use crate::println;

/// Value returned to the caller in `eax`.
pub type SyscallResult = i32;

/// Success return value
pub const SUCCESS: SyscallResult = 0;
/// Error: invalid syscall number
pub const ERR_INVALID_SYSCALL: SyscallResult = -1;

/// Write a value to the kernel log.
pub const SYS_LOG: u32 = 0;
/// Return the calling task's id.
pub const SYS_TASK_ID: u32 = 1;
/// Give up the rest of the current quantum.
pub const SYS_YIELD: u32 = 2;

type SyscallHandler = fn(u32, u32, u32) -> SyscallResult;

static SYSCALL_TABLE: &[SyscallHandler] = &[
    sys_log,     // 0
    sys_task_id, // 1
    sys_yield,   // 2
];

/// Route a syscall to its handler.
#[must_use]
pub fn dispatch(number: u32, arg1: u32, arg2: u32, arg3: u32) -> SyscallResult {
    match SYSCALL_TABLE.get(number as usize) {
        Some(handler) => handler(arg1, arg2, arg3),
        None => ERR_INVALID_SYSCALL,
    }
}

fn sys_log(value: u32, _arg2: u32, _arg3: u32) -> SyscallResult {
    let id = SCHEDULER.lock().current_id().as_u32();
    println!("[task {}] {:#010x}", id, value);
    SUCCESS
}

fn sys_task_id(_arg1: u32, _arg2: u32, _arg3: u32) -> SyscallResult {
    SCHEDULER.lock().current_id().as_u32() as SyscallResult
}

/// The reschedule itself happens in the trap dispatcher, after the saved
/// frame has been updated with this return value.
fn sys_yield(_arg1: u32, _arg2: u32, _arg3: u32) -> SyscallResult {
    SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_rejects_unknown_number() {
        assert_eq!(dispatch(99, 0, 0, 0), ERR_INVALID_SYSCALL);
        assert_eq!(dispatch(SYSCALL_TABLE.len() as u32, 0, 0, 0), ERR_INVALID_SYSCALL);
    }

    #[test]
    fn test_yield_reports_success() {
        assert_eq!(dispatch(SYS_YIELD, 0, 0, 0), SUCCESS);
    }

    #[test]
    fn test_task_id_of_boot_context() {
        // hosted: the global scheduler never leaves the boot context
        assert_eq!(dispatch(SYS_TASK_ID, 0, 0, 0), 0);
    }
}
