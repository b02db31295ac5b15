// src/main.rs
//! Kernel binary: boot sequence and demo tasks.
//!
//! Brings the descriptor tables, the PIC/PIT and the scheduler online in
//! the only order that is safe (GDT before IDT, both before `sti`), spawns
//! three ring-3 demo tasks and parks the boot context as the idle task.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]
#![deny(unsafe_op_in_unsafe_fn)]

#[cfg(target_os = "none")]
mod kernel_entry {
    use mtos::arch::Cpu;
    use mtos::arch::x86::port::IoPortBus;
    use mtos::arch::x86::trap_frame::TaskKind;
    use mtos::arch::x86::{X86Cpu, gdt, idt, pit};
    use mtos::constants::TICK_HZ;
    use mtos::kernel::syscall;
    use mtos::kernel::task::TaskId;
    use mtos::kernel::task::scheduler::{self, SCHEDULER};
    use mtos::{debug_println, hlt_loop, println};

    /// Per-task stack tops. Nothing else lives in this region; with no
    /// paging the layout is fixed by convention, as is the 512KiB spacing
    /// that keeps the stacks from growing into each other.
    const USER_STACK_TOPS: [u32; 3] = [0x00C8_0000, 0x00C0_0000, 0x00B8_0000];
    const KERNEL_STACK_TOPS: [u32; 3] = [0x00E8_0000, 0x00E0_0000, 0x00D8_0000];

    /// Entry point, called by the boot stub with protected mode already
    /// enabled and a temporary stack.
    #[unsafe(no_mangle)]
    pub extern "C" fn kernel_main() -> ! {
        gdt::configure();
        idt::configure();

        // SAFETY: ring-0 boot path, interrupts still off
        let mut bus = unsafe { IoPortBus::new() };
        if let Err(err) = pit::configure(TICK_HZ, &mut bus) {
            println!("[boot] PIT rejected {} Hz: {:?}", TICK_HZ, err);
            hlt_loop();
        }
        println!("[boot] tables loaded, tick at {} Hz", TICK_HZ);

        {
            let mut sched = SCHEDULER.lock();
            for (i, (&ustack, &kstack)) in USER_STACK_TOPS
                .iter()
                .zip(KERNEL_STACK_TOPS.iter())
                .enumerate()
            {
                let id = TaskId::new(i as u32 + 1);
                match sched.create_task(id, demo_task_entry(), ustack, kstack, TaskKind::User) {
                    Ok(()) => debug_println!(
                        "[boot] task {} stacks {:#x}/{:#x}",
                        id.as_u32(),
                        ustack,
                        kstack
                    ),
                    Err(err) => println!("[boot] create task {}: {}", id.as_u32(), err),
                }
            }
        }

        // log before sti: past this point every print contends with the
        // trap path for COM1
        println!("[boot] preemption on");
        scheduler::set_preemption(true);
        X86Cpu::enable_interrupts();

        // the boot context is now the idle task; the next tick switches away
        hlt_loop();
    }

    fn demo_task_entry() -> u32 {
        demo_task as extern "C" fn(u32) -> ! as usize as u32
    }

    /// Demo task body. The bootstrap frame seeds the user stack so the task
    /// id arrives as the first C-ABI argument.
    extern "C" fn demo_task(id: u32) -> ! {
        let mut iterations: u32 = 0;
        loop {
            iterations = iterations.wrapping_add(1);
            if iterations % 500_000 == 0 {
                let _ = syscall3(syscall::SYS_LOG, iterations, 0, 0);
                // odd tasks also give up the rest of their quantum
                if id % 2 == 1 {
                    let _ = syscall3(syscall::SYS_YIELD, 0, 0, 0);
                }
            }
            core::hint::spin_loop();
        }
    }

    /// `int 0x80` with the C-style register convention: number in `eax`,
    /// arguments in `ebx`/`ecx`/`edx`, result back in `eax`.
    fn syscall3(number: u32, arg1: u32, arg2: u32, arg3: u32) -> i32 {
        let ret: i32;
        // SAFETY: vector 0x80 is a DPL-3 gate into the syscall dispatcher;
        // ebx is reserved by LLVM, so it is swapped in around the trap
        unsafe {
            core::arch::asm!(
                "xchg ebx, {arg1}",
                "int 0x80",
                "xchg ebx, {arg1}",
                arg1 = inout(reg) arg1 => _,
                inlateout("eax") number => ret,
                in("ecx") arg2,
                in("edx") arg3,
            );
        }
        ret
    }

    #[panic_handler]
    fn panic(info: &core::panic::PanicInfo) -> ! {
        X86Cpu::disable_interrupts();
        println!("[panic] {}", info);
        // IF is clear, so this parks the CPU for good
        hlt_loop();
    }
}

/// Hosted builds only check that the kernel library compiles; there is
/// nothing to run.
#[cfg(not(target_os = "none"))]
fn main() {}
