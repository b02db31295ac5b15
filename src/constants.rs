// src/constants.rs

//! Kernel constants and configuration values
//!
//! This module centralizes the fixed layout of the descriptor tables, the
//! interrupt vector assignments, the hardware port map and the task-table
//! capacity. None of these change at runtime; the tables they describe are
//! built once during boot.

/// Number of GDT entries: null, kernel code/data, user code/data, TSS.
pub const GDT_ENTRIES: usize = 6;

/// Kernel code segment selector (GDT index 1, ring 0).
pub const KERNEL_CODE_SELECTOR: u16 = 0x08;
/// Kernel data segment selector (GDT index 2, ring 0).
pub const KERNEL_DATA_SELECTOR: u16 = 0x10;
/// User code segment selector (GDT index 3, ring 3).
pub const USER_CODE_SELECTOR: u16 = 0x18;
/// User data segment selector (GDT index 4, ring 3).
pub const USER_DATA_SELECTOR: u16 = 0x20;
/// TSS selector (GDT index 5).
pub const TSS_SELECTOR: u16 = 0x28;

/// Requested privilege level for ring-3 selectors.
///
/// User-task selectors are `selector | RPL_USER`; kernel-task selectors are
/// used as-is.
pub const RPL_USER: u16 = 3;

/// Number of IDT entries.
pub const IDT_ENTRIES: usize = 256;

/// First vector the remapped PIC delivers (IRQ 0).
///
/// IRQs 0-15 are remapped to vectors 32-47 so they do not collide with the
/// CPU exception vectors 0-31.
pub const IRQ_BASE_VECTOR: u32 = 32;
/// First vector owned by the slave PIC (IRQ 8).
pub const IRQ_SLAVE_VECTOR: u32 = 40;
/// Last hardware interrupt vector (IRQ 15).
pub const IRQ_LAST_VECTOR: u32 = 47;
/// PIT tick, IRQ 0 after remapping.
pub const TIMER_VECTOR: u32 = 32;
/// Software interrupt vector for syscalls, invocable from ring 3.
pub const SYSCALL_VECTOR: u32 = 0x80;

/// Master PIC command/data ports.
pub const PIC1_COMMAND: u16 = 0x20;
pub const PIC1_DATA: u16 = 0x21;
/// Slave PIC command/data ports.
pub const PIC2_COMMAND: u16 = 0xA0;
pub const PIC2_DATA: u16 = 0xA1;

/// PIT channel 0 data port.
pub const PIT_CHANNEL0: u16 = 0x40;
/// PIT mode/command port.
pub const PIT_COMMAND: u16 = 0x43;
/// PIT input clock in Hz. The divisor written to channel 0 is
/// `PIT_INPUT_HZ / frequency` (integer division, so the achieved rate is
/// approximate).
pub const PIT_INPUT_HZ: u32 = 1_193_180;

/// Scheduler tick rate requested from the PIT (~1ms quantum).
pub const TICK_HZ: u32 = 1000;

/// Fixed task-table capacity. There is no dynamic task creation; slot 0 is
/// the boot/idle context.
pub const MAX_TASKS: usize = 16;

/// EFLAGS image for freshly created tasks: IF set, everything else clear,
/// so interrupts are enabled the moment the task first runs.
pub const EFLAGS_IF: u32 = 0x200;

/// COM1 base port, used for kernel log output.
pub const COM1_PORT: u16 = 0x3F8;
