// src/kernel/mod.rs

//! Kernel policy: task table, scheduler, trap dispatch, syscalls.

pub mod syscall;
pub mod task;
pub mod trap;
