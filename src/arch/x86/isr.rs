// src/arch/x86/isr.rs

//! Interrupt entry stubs
//!
//! Every IDT gate points at a tiny per-vector stub that normalizes the
//! stack to the [`TrapFrame`](crate::arch::x86::trap_frame::TrapFrame)
//! layout and jumps to the common entry. Vectors where the CPU pushes an
//! error code keep it; all others push a dummy 0 so the frame shape is
//! identical for every vector.
//!
//! The common entry loads the kernel data segment, hands the frame to the
//! Rust dispatcher and falls through to [`isr_exit`], which unwinds the
//! frame and `iretd`s back - into whatever context the scheduler left on
//! the stack.

use core::arch::naked_asm;

use crate::arch::x86::idt::STUB_VECTORS;

/// Common entry: finish building the trap frame, call the dispatcher,
/// unwind.
#[unsafe(naked)]
unsafe extern "C" fn isr_common() {
    naked_asm!(
        // vector + error are already on the stack (stub / CPU)
        "pusha",
        "push ds",
        "push es",
        "push fs",
        "push gs",
        // the interrupt may have arrived from ring 3; the dispatcher needs
        // kernel data segments
        "mov ax, 0x10",
        "mov ds, ax",
        "mov es, ax",
        "mov fs, ax",
        "mov gs, ax",
        "push esp", // &mut TrapFrame
        "call {dispatch}",
        "add esp, 4",
        "jmp {exit}",
        dispatch = sym crate::kernel::trap::trap_entry,
        exit = sym isr_exit,
    );
}

/// Unwind a trap frame and return to the interrupted context.
#[unsafe(naked)]
pub unsafe extern "C" fn isr_exit() {
    naked_asm!(
        "pop gs",
        "pop fs",
        "pop es",
        "pop ds",
        "popa",
        "add esp, 8", // vector + error
        "iretd",
    );
}

macro_rules! isr_stub {
    // vectors where the CPU pushes an error code itself
    (err $name:ident, $vector:literal) => {
        #[unsafe(naked)]
        unsafe extern "C" fn $name() {
            naked_asm!(
                concat!("push ", $vector),
                "jmp {common}",
                common = sym isr_common,
            );
        }
    };
    ($name:ident, $vector:literal) => {
        #[unsafe(naked)]
        unsafe extern "C" fn $name() {
            naked_asm!(
                "push 0", // dummy error code
                concat!("push ", $vector),
                "jmp {common}",
                common = sym isr_common,
            );
        }
    };
}

isr_stub!(isr0, 0);
isr_stub!(isr1, 1);
isr_stub!(isr2, 2);
isr_stub!(isr3, 3);
isr_stub!(isr4, 4);
isr_stub!(isr5, 5);
isr_stub!(isr6, 6);
isr_stub!(isr7, 7);
isr_stub!(err isr8, 8);
isr_stub!(isr9, 9);
isr_stub!(err isr10, 10);
isr_stub!(err isr11, 11);
isr_stub!(err isr12, 12);
isr_stub!(err isr13, 13);
isr_stub!(err isr14, 14);
isr_stub!(isr15, 15);
isr_stub!(isr16, 16);
isr_stub!(err isr17, 17);
isr_stub!(isr18, 18);
isr_stub!(isr19, 19);
isr_stub!(isr20, 20);
isr_stub!(isr21, 21);
isr_stub!(isr22, 22);
isr_stub!(isr23, 23);
isr_stub!(isr24, 24);
isr_stub!(isr25, 25);
isr_stub!(isr26, 26);
isr_stub!(isr27, 27);
isr_stub!(isr28, 28);
isr_stub!(isr29, 29);
isr_stub!(err isr30, 30);
isr_stub!(isr31, 31);
isr_stub!(isr32, 32);
isr_stub!(isr33, 33);
isr_stub!(isr34, 34);
isr_stub!(isr35, 35);
isr_stub!(isr36, 36);
isr_stub!(isr37, 37);
isr_stub!(isr38, 38);
isr_stub!(isr39, 39);
isr_stub!(isr40, 40);
isr_stub!(isr41, 41);
isr_stub!(isr42, 42);
isr_stub!(isr43, 43);
isr_stub!(isr44, 44);
isr_stub!(isr45, 45);
isr_stub!(isr46, 46);
isr_stub!(isr47, 47);
isr_stub!(isr128, 0x80);

macro_rules! stub_addr {
    ($name:ident) => {
        $name as unsafe extern "C" fn() as usize as u32
    };
}

/// Entry-stub addresses for vectors 0-47, in vector order.
#[must_use]
pub fn redirect_table() -> [u32; STUB_VECTORS] {
    [
        stub_addr!(isr0),
        stub_addr!(isr1),
        stub_addr!(isr2),
        stub_addr!(isr3),
        stub_addr!(isr4),
        stub_addr!(isr5),
        stub_addr!(isr6),
        stub_addr!(isr7),
        stub_addr!(isr8),
        stub_addr!(isr9),
        stub_addr!(isr10),
        stub_addr!(isr11),
        stub_addr!(isr12),
        stub_addr!(isr13),
        stub_addr!(isr14),
        stub_addr!(isr15),
        stub_addr!(isr16),
        stub_addr!(isr17),
        stub_addr!(isr18),
        stub_addr!(isr19),
        stub_addr!(isr20),
        stub_addr!(isr21),
        stub_addr!(isr22),
        stub_addr!(isr23),
        stub_addr!(isr24),
        stub_addr!(isr25),
        stub_addr!(isr26),
        stub_addr!(isr27),
        stub_addr!(isr28),
        stub_addr!(isr29),
        stub_addr!(isr30),
        stub_addr!(isr31),
        stub_addr!(isr32),
        stub_addr!(isr33),
        stub_addr!(isr34),
        stub_addr!(isr35),
        stub_addr!(isr36),
        stub_addr!(isr37),
        stub_addr!(isr38),
        stub_addr!(isr39),
        stub_addr!(isr40),
        stub_addr!(isr41),
        stub_addr!(isr42),
        stub_addr!(isr43),
        stub_addr!(isr44),
        stub_addr!(isr45),
        stub_addr!(isr46),
        stub_addr!(isr47),
    ]
}

/// Address of the `int 0x80` entry stub.
#[must_use]
pub fn syscall_entry_addr() -> u32 {
    stub_addr!(isr128)
}
