// src/arch/x86/switch.rs

//! Context-switch primitive
//!
//! [`switch_context`] is the only code that manipulates the live stack
//! pointer. It saves the cdecl callee-saved registers and the current
//! kernel stack pointer into the outgoing task, loads the incoming task's
//! saved stack pointer, restores callee-saved registers from that stack and
//! `ret`s to whatever address sits on top of it.
//!
//! For a task that ran before, that address is inside a previous
//! `switch_context` call and execution resumes where it left off. For a
//! fresh task it is [`task_startup`], planted there by the bootstrap frame.

use core::arch::naked_asm;

use crate::kernel::task::Task;

/// Save the outgoing task's context, load the incoming one, transfer
/// control.
///
/// The stack-pointer slot (`Task::kesp`) is at byte offset 4 of `Task`,
/// pinned by a layout test in the task module.
///
/// This call may not return to its caller: if the incoming task's kernel
/// stack carries a different return path (always true for a task's first
/// switch-in), control continues there instead.
///
/// # Safety
///
/// Both pointers must reference live entries of the task table, `to.kesp`
/// must hold a valid saved context (or bootstrap frame), and the caller
/// must run with interrupts disabled.
#[unsafe(naked)]
pub unsafe extern "C" fn switch_context(from: *mut Task, to: *mut Task) {
    naked_asm!(
        "push ebx",
        "push esi",
        "push edi",
        "push ebp",
        "mov eax, [esp + 20]", // from
        "mov [eax + 4], esp",  // from.kesp = esp
        "mov eax, [esp + 24]", // to
        "mov esp, [eax + 4]",  // esp = to.kesp
        "pop ebp",
        "pop edi",
        "pop esi",
        "pop ebx",
        "ret",
    );
}

/// First-entry trampoline for fresh tasks.
///
/// `switch_context` `ret`s here with the remainder of the bootstrap frame
/// on the stack: the data selector, then a five-word `iretd` image. Loading
/// the data segments and `iretd`-ing makes a task's first entry the same
/// CPU operation as any interrupt return. For a ring-0 task the `iretd`
/// does not switch stacks; execution simply continues on the kernel stack
/// (the unconsumed `user_esp`/`user_ss` words stay below it, which is fine
/// because the task never returns).
#[unsafe(naked)]
pub unsafe extern "C" fn task_startup() {
    naked_asm!(
        "pop eax", // data selector
        "mov ds, ax",
        "mov es, ax",
        "mov fs, ax",
        "mov gs, ax",
        "iretd",
    );
}
