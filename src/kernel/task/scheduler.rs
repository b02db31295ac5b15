// src/kernel/task/scheduler.rs

//! Round-robin scheduler
//!
//! One quantum per timer tick, next task is `(current + 1) % live`. The
//! global instance sits behind a spinlock; the trap path locks it only long
//! enough to compute the switch, then drops the guard before handing
//! control to the context-switch primitive (which may not return, and the
//! next tick on the other task must be able to take the lock again).

use core::sync::atomic::{AtomicBool, Ordering};

use lazy_static::lazy_static;
use spin::Mutex;

use crate::arch::x86::gdt::TaskStateSegment;
use crate::arch::x86::trap_frame::TaskKind;
use crate::errors::KernelResult;
use crate::kernel::task::{Task, TaskId, TaskTable};

/// The outgoing and incoming control blocks of one switch decision.
///
/// Raw pointers because `switch_context` runs after the scheduler lock is
/// released; both point into the global task table, which is never moved or
/// shrunk.
#[derive(Debug, Clone, Copy)]
pub struct SwitchPair {
    pub from: *mut Task,
    pub to: *mut Task,
}

pub struct Scheduler {
    table: TaskTable,
    current: usize,
}

impl Scheduler {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            table: TaskTable::new(),
            current: 0,
        }
    }

    /// Id of the task owning the CPU.
    #[must_use]
    pub fn current_id(&self) -> TaskId {
        TaskId::new(self.current as u32)
    }

    /// Pure selection: the slot after `current`, wrapping over the live
    /// prefix of the table. With a single live task it selects that task.
    #[must_use]
    pub fn select_next(&self) -> TaskId {
        TaskId::new(((self.current + 1) % self.table.live_count()) as u32)
    }

    /// Commit one scheduling decision.
    ///
    /// Advances `current`, points the TSS's ring-0 stack at the incoming
    /// task's kernel stack top and returns the pair of control blocks to
    /// switch between. The TSS update must land before the switch: the next
    /// ring-3 trap in the incoming task uses `tss.esp0` immediately.
    pub fn prepare_switch(&mut self, tss: &mut TaskStateSegment) -> SwitchPair {
        let next = self.select_next().as_usize();
        let prev = self.current;
        self.current = next;
        tss.esp0 = self.table.tasks[next].kesp_bottom;
        SwitchPair {
            from: &raw mut self.table.tasks[prev],
            to: &raw mut self.table.tasks[next],
        }
    }

    /// Register a task; see [`TaskTable::create`].
    pub fn create_task(
        &mut self,
        id: TaskId,
        entry: u32,
        user_stack_top: u32,
        kernel_stack_top: u32,
        kind: TaskKind,
    ) -> KernelResult<()> {
        self.table.create(id, entry, user_stack_top, kernel_stack_top, kind)
    }

    #[must_use]
    pub fn table(&self) -> &TaskTable {
        &self.table
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    /// Global scheduler instance.
    pub static ref SCHEDULER: Mutex<Scheduler> = Mutex::new(Scheduler::new());
}

/// Whether timer ticks trigger scheduling. Off until the boot sequence has
/// created its tasks, so an early tick cannot switch into a half-built
/// table.
static PREEMPTION: AtomicBool = AtomicBool::new(false);

pub fn set_preemption(enabled: bool) {
    PREEMPTION.store(enabled, Ordering::SeqCst);
}

#[must_use]
pub fn preemption_enabled() -> bool {
    PREEMPTION.load(Ordering::SeqCst)
}

/// Pick the next task and switch to it. May not return until this task is
/// scheduled again; for a task's final call, never.
///
/// Interrupt gates keep IF clear on every path that reaches this, so the
/// lock cannot be retaken by a tick while held.
pub fn schedule() {
    let pair = {
        let mut scheduler = SCHEDULER.lock();
        // SAFETY: single-CPU kernel; the only other TSS access is the boot
        // sequence, which runs before preemption is enabled
        let tss = unsafe { crate::arch::x86::gdt::tss_mut() };
        scheduler.prepare_switch(tss)
    };
    #[cfg(target_arch = "x86")]
    // SAFETY: both pointers come from the live table and interrupts are off
    unsafe {
        crate::arch::x86::switch::switch_context(pair.from, pair.to);
    }
    #[cfg(not(target_arch = "x86"))]
    let _ = pair;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler_with_tasks(count: u32) -> Scheduler {
        let mut scheduler = Scheduler::new();
        for id in 1..=count {
            scheduler
                .create_task(
                    TaskId::new(id),
                    0x0010_0000,
                    0x00C8_0000 - id * 0x8_0000,
                    0x0100_0000 - id * 0x8_0000,
                    TaskKind::User,
                )
                .unwrap();
        }
        scheduler
    }

    #[test]
    fn test_round_robin_cycles_all_tasks() {
        // boot context plus tasks 1, 2, 3
        let mut scheduler = scheduler_with_tasks(3);
        let mut tss = TaskStateSegment::new();
        let mut order = std::vec::Vec::new();
        for _ in 0..5 {
            scheduler.prepare_switch(&mut tss);
            order.push(scheduler.current_id().as_u32());
        }
        assert_eq!(order, [1, 2, 3, 0, 1]);
    }

    #[test]
    fn test_round_robin_from_any_start() {
        let mut scheduler = scheduler_with_tasks(4);
        let mut tss = TaskStateSegment::new();
        for expected in [1, 2, 3, 4, 0, 1, 2, 3, 4, 0] {
            scheduler.prepare_switch(&mut tss);
            assert_eq!(scheduler.current_id().as_u32(), expected);
        }
    }

    #[test]
    fn test_single_task_selects_itself() {
        let scheduler = Scheduler::new();
        assert_eq!(scheduler.select_next(), TaskId::new(0));
    }

    #[test]
    fn test_switch_updates_tss_ring0_stack() {
        let mut scheduler = scheduler_with_tasks(2);
        let mut tss = TaskStateSegment::new();
        let pair = scheduler.prepare_switch(&mut tss);
        let incoming = scheduler.table().task(TaskId::new(1)).unwrap();
        assert_eq!({ tss.esp0 }, incoming.kesp_bottom);
        assert_eq!(unsafe { (*pair.to).id }, TaskId::new(1));
        assert_eq!(unsafe { (*pair.from).id }, TaskId::new(0));
    }

    #[test]
    fn test_selection_does_not_advance_state() {
        let scheduler = scheduler_with_tasks(2);
        assert_eq!(scheduler.select_next(), TaskId::new(1));
        assert_eq!(scheduler.select_next(), TaskId::new(1));
        assert_eq!(scheduler.current_id(), TaskId::new(0));
    }
}
