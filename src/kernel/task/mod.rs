// src/kernel/task/mod.rs

//! Task control blocks and stack bootstrap
//!
//! A fixed-capacity table of tasks. Slot 0 is the boot context: it owns no
//! pre-built stack image because its first switch-out writes one. Every
//! other slot is populated by [`TaskTable::create`], which synthesizes a
//! kernel-stack image that makes the context-switch primitive treat the
//! fresh task exactly like one that was switched out moments ago.

pub mod scheduler;

use core::mem::size_of;

use crate::arch::x86::startup_trampoline_addr;
use crate::arch::x86::trap_frame::{BootstrapFrame, TaskKind};
use crate::constants::MAX_TASKS;
use crate::errors::{ErrorKind, KernelError, KernelResult, TaskError};

/// Task identifier, doubling as the table slot index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct TaskId(u32);

impl TaskId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Per-task control block.
///
/// `#[repr(C)]` with `kesp` at byte offset 4: the context-switch assembly
/// addresses the saved stack pointer as `[task + 4]`. A layout test below
/// pins the offset.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct Task {
    /// Slot index.
    pub id: TaskId,
    /// Saved kernel stack pointer while the task is switched out. Stale
    /// while the task runs.
    pub kesp: u32,
    /// Top of the task's kernel stack; becomes `tss.esp0` whenever the
    /// scheduler picks this task, so ring-3 traps land on an empty kernel
    /// stack.
    pub kesp_bottom: u32,
}

impl Task {
    /// An unpopulated slot.
    pub const EMPTY: Self = Self {
        id: TaskId::new(0),
        kesp: 0,
        kesp_bottom: 0,
    };
}

/// Fixed-capacity task table.
///
/// Slots are assigned densely: task ids are `0..live`, with 0 reserved for
/// the boot context. Density is what lets the scheduler cycle with a plain
/// modulus, so [`TaskTable::create`] rejects ids that would leave a hole.
pub struct TaskTable {
    pub(crate) tasks: [Task; MAX_TASKS],
    /// Number of populated slots, boot context included.
    pub(crate) live: usize,
}

impl TaskTable {
    /// A table holding only the boot context in slot 0.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tasks: [Task::EMPTY; MAX_TASKS],
            live: 1,
        }
    }

    /// Number of live tasks, boot context included.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Look up a task by id.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        if id.as_usize() < self.live {
            Some(&self.tasks[id.as_usize()])
        } else {
            None
        }
    }

    /// Populate a slot and write the task's first-switch-in stack image.
    ///
    /// `entry` is the task body, `user_stack_top` / `kernel_stack_top` the
    /// exclusive tops of its two stacks. The user stack is seeded with the
    /// task id and a fake return address, so a body written as
    /// `extern "C" fn(id: u32) -> !` finds its id as the first argument.
    ///
    /// The saved stack pointer ends up one bootstrap frame below
    /// `kernel_stack_top`; the first switch-in consumes the frame and drops
    /// the task at `entry` via `iretd`.
    pub fn create(
        &mut self,
        id: TaskId,
        entry: u32,
        user_stack_top: u32,
        kernel_stack_top: u32,
        kind: TaskKind,
    ) -> KernelResult<()> {
        if self.live == MAX_TASKS {
            return Err(KernelError::with_context(
                ErrorKind::Task(TaskError::TableFull),
                "task table at capacity",
            ));
        }
        let slot = id.as_usize();
        if slot == 0 || slot >= MAX_TASKS {
            return Err(KernelError::with_context(
                ErrorKind::Task(TaskError::InvalidId),
                "id outside 1..MAX_TASKS",
            ));
        }
        if slot < self.live {
            return Err(TaskError::SlotInUse.into());
        }
        if slot > self.live {
            return Err(KernelError::with_context(
                ErrorKind::Task(TaskError::InvalidId),
                "id skips a free slot",
            ));
        }

        // seed the user stack: id argument, then a fake return address the
        // body must never pop
        let user_esp = user_stack_top - 8;
        #[cfg(target_arch = "x86")]
        // SAFETY: caller hands us exclusive ownership of both stack regions
        unsafe {
            *((user_stack_top - 4) as *mut u32) = id.as_u32();
            *((user_stack_top - 8) as *mut u32) = 0;
        }

        let frame = BootstrapFrame::new(startup_trampoline_addr(), entry, user_esp, kind);
        let kesp = kernel_stack_top - size_of::<BootstrapFrame>() as u32;
        #[cfg(target_arch = "x86")]
        // SAFETY: kesp..kernel_stack_top lies inside the task's own stack
        unsafe {
            *(kesp as *mut BootstrapFrame) = frame;
        }
        #[cfg(not(target_arch = "x86"))]
        let _ = frame;

        self.tasks[slot] = Task {
            id,
            kesp,
            kesp_bottom: kernel_stack_top,
        };
        self.live += 1;
        Ok(())
    }
}

impl Default for TaskTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    const KSTACK: u32 = 0x0100_0000;
    const USTACK: u32 = 0x00C8_0000;

    fn create_demo(table: &mut TaskTable, id: u32) -> KernelResult<()> {
        table.create(
            TaskId::new(id),
            0x0010_0000,
            USTACK - id * 0x8_0000,
            KSTACK - id * 0x8_0000,
            TaskKind::User,
        )
    }

    #[test]
    fn test_kesp_offset_pinned_for_switch_asm() {
        assert_eq!(core::mem::offset_of!(Task, kesp), 4);
    }

    #[test]
    fn test_create_places_frame_below_stack_top() {
        let mut table = TaskTable::new();
        create_demo(&mut table, 1).unwrap();
        let task = table.task(TaskId::new(1)).unwrap();
        assert_eq!(task.kesp_bottom, KSTACK - 0x8_0000);
        assert_eq!(
            task.kesp,
            task.kesp_bottom - size_of::<BootstrapFrame>() as u32
        );
        assert_eq!(table.live_count(), 2);
    }

    #[test]
    fn test_create_rejects_boot_slot() {
        let mut table = TaskTable::new();
        let err = create_demo(&mut table, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Task(TaskError::InvalidId));
    }

    #[test]
    fn test_create_rejects_out_of_range_id() {
        let mut table = TaskTable::new();
        let err = create_demo(&mut table, MAX_TASKS as u32).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Task(TaskError::InvalidId));
    }

    #[test]
    fn test_create_rejects_occupied_slot() {
        let mut table = TaskTable::new();
        create_demo(&mut table, 1).unwrap();
        let err = create_demo(&mut table, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Task(TaskError::SlotInUse));
    }

    #[test]
    fn test_create_rejects_hole_in_table() {
        let mut table = TaskTable::new();
        let err = create_demo(&mut table, 3).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Task(TaskError::InvalidId));
        assert_eq!(err.context(), Some("id skips a free slot"));
    }

    #[test]
    fn test_create_reports_full_table() {
        let mut table = TaskTable::new();
        for id in 1..MAX_TASKS as u32 {
            create_demo(&mut table, id).unwrap();
        }
        let err = create_demo(&mut table, MAX_TASKS as u32).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Task(TaskError::TableFull));
    }

    #[test]
    fn test_lookup_misses_unpopulated_slot() {
        let table = TaskTable::new();
        assert!(table.task(TaskId::new(0)).is_some());
        assert!(table.task(TaskId::new(1)).is_none());
    }
}
