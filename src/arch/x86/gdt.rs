// src/arch/x86/gdt.rs

//! Global Descriptor Table and Task State Segment
//!
//! Six fixed entries describe a flat 4GiB address space at two privilege
//! levels plus one TSS: null, kernel code/data (ring 0), user code/data
//! (ring 3), TSS. The indices never change for the lifetime of the system;
//! the selector constants in [`crate::constants`] are derived from them.
//!
//! The single shared TSS carries exactly one live field, `esp0`: the kernel
//! stack the CPU switches to when an interrupt arrives while running in
//! ring 3. The scheduler rewrites it on every task switch so the *next*
//! privilege-elevating interrupt lands on the incoming task's own kernel
//! stack.

use crate::constants::GDT_ENTRIES;

/// One 8-byte segment descriptor in the packed hardware layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C, packed)]
pub struct SegmentDescriptor {
    limit_low: u16,
    base_low: u16,
    base_mid: u8,
    access: u8,
    granularity: u8,
    base_high: u8,
}

impl SegmentDescriptor {
    /// The mandatory null descriptor at index 0.
    pub const NULL: Self = Self::new(0, 0, 0, 0);

    /// Pack base/limit/access/flags into the hardware layout.
    ///
    /// `limit` is truncated to 20 bits; `flags` occupies the high nibble of
    /// the granularity byte (G and D/B bits).
    #[must_use]
    pub const fn new(base: u32, limit: u32, access: u8, flags: u8) -> Self {
        Self {
            limit_low: (limit & 0xFFFF) as u16,
            base_low: (base & 0xFFFF) as u16,
            base_mid: (base >> 16 & 0xFF) as u8,
            access,
            granularity: (flags & 0xF0) | (limit >> 16 & 0xF) as u8,
            base_high: (base >> 24 & 0xFF) as u8,
        }
    }

    /// Decode the 32-bit base address.
    #[must_use]
    pub const fn base(&self) -> u32 {
        self.base_low as u32
            | (self.base_mid as u32) << 16
            | (self.base_high as u32) << 24
    }

    /// Decode the 20-bit limit.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit_low as u32 | ((self.granularity & 0xF) as u32) << 16
    }

    /// Access byte: present bit, DPL, descriptor type.
    #[must_use]
    pub const fn access(&self) -> u8 {
        self.access
    }

    /// Flags nibble (granularity and operand size), high nibble of the
    /// packed granularity byte.
    #[must_use]
    pub const fn flags(&self) -> u8 {
        self.granularity & 0xF0
    }

    /// Descriptor privilege level, bits 5-6 of the access byte.
    #[must_use]
    pub const fn dpl(&self) -> u8 {
        self.access >> 5 & 0x3
    }
}

/// The 32-bit hardware TSS layout (104 bytes).
///
/// Only `esp0`/`ss0` are live in this kernel; `cr3` is a placeholder since
/// no paging is modeled, and the register-snapshot fields are unused because
/// task switching is done in software, not via hardware task gates.
#[derive(Debug, Clone, Copy)]
#[repr(C, packed)]
pub struct TaskStateSegment {
    pub previous_task: u16,
    _previous_task_reserved: u16,
    pub esp0: u32,
    pub ss0: u16,
    _ss0_reserved: u16,
    pub esp1: u32,
    pub ss1: u16,
    _ss1_reserved: u16,
    pub esp2: u32,
    pub ss2: u16,
    _ss2_reserved: u16,
    pub cr3: u32,
    pub eip: u32,
    pub eflags: u32,
    pub eax: u32,
    pub ecx: u32,
    pub edx: u32,
    pub ebx: u32,
    pub esp: u32,
    pub ebp: u32,
    pub esi: u32,
    pub edi: u32,
    pub es: u16,
    _es_reserved: u16,
    pub cs: u16,
    _cs_reserved: u16,
    pub ss: u16,
    _ss_reserved: u16,
    pub ds: u16,
    _ds_reserved: u16,
    pub fs: u16,
    _fs_reserved: u16,
    pub gs: u16,
    _gs_reserved: u16,
    pub ldt_selector: u16,
    _ldt_reserved: u16,
    pub debug_trap: u16,
    pub io_map_base: u16,
}

impl TaskStateSegment {
    /// A zeroed TSS.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            previous_task: 0,
            _previous_task_reserved: 0,
            esp0: 0,
            ss0: 0,
            _ss0_reserved: 0,
            esp1: 0,
            ss1: 0,
            _ss1_reserved: 0,
            esp2: 0,
            ss2: 0,
            _ss2_reserved: 0,
            cr3: 0,
            eip: 0,
            eflags: 0,
            eax: 0,
            ecx: 0,
            edx: 0,
            ebx: 0,
            esp: 0,
            ebp: 0,
            esi: 0,
            edi: 0,
            es: 0,
            _es_reserved: 0,
            cs: 0,
            _cs_reserved: 0,
            ss: 0,
            _ss_reserved: 0,
            ds: 0,
            _ds_reserved: 0,
            fs: 0,
            _fs_reserved: 0,
            gs: 0,
            _gs_reserved: 0,
            ldt_selector: 0,
            _ldt_reserved: 0,
            debug_trap: 0,
            io_map_base: 0,
        }
    }
}

impl Default for TaskStateSegment {
    fn default() -> Self {
        Self::new()
    }
}

/// The six-entry GDT.
#[derive(Debug, Clone, Copy)]
#[repr(C, align(8))]
pub struct Gdt {
    entries: [SegmentDescriptor; GDT_ENTRIES],
}

impl Gdt {
    /// An all-null table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [SegmentDescriptor::NULL; GDT_ENTRIES],
        }
    }

    /// Build the fixed flat-model table.
    ///
    /// Code/data segments cover the full 4GiB space with 4KiB granularity;
    /// the TSS entry points at the shared TSS with byte granularity.
    #[must_use]
    pub const fn flat(tss_base: u32) -> Self {
        let mut gdt = Self::new();
        gdt.entries[0] = SegmentDescriptor::NULL;
        // 0x08: kernel mode code
        gdt.entries[1] = SegmentDescriptor::new(0, 0xFFFF_FFFF, 0x9A, 0xC0);
        // 0x10: kernel mode data
        gdt.entries[2] = SegmentDescriptor::new(0, 0xFFFF_FFFF, 0x92, 0xC0);
        // 0x18: user mode code
        gdt.entries[3] = SegmentDescriptor::new(0, 0xFFFF_FFFF, 0xFA, 0xC0);
        // 0x20: user mode data
        gdt.entries[4] = SegmentDescriptor::new(0, 0xFFFF_FFFF, 0xF2, 0xC0);
        // 0x28: TSS
        gdt.entries[5] = SegmentDescriptor::new(
            tss_base,
            core::mem::size_of::<TaskStateSegment>() as u32,
            0x89,
            0x40,
        );
        gdt
    }

    /// Get a reference to the table's entries.
    #[must_use]
    pub fn entries(&self) -> &[SegmentDescriptor; GDT_ENTRIES] {
        &self.entries
    }
}

/// Global GDT instance, rebuilt by [`configure`].
static mut GDT: Gdt = Gdt::new();

/// Global shared TSS instance.
///
/// There is exactly one; all tasks share it and only the scheduler mutates
/// it (inside interrupt context, which cannot be re-entered).
static mut TSS: TaskStateSegment = TaskStateSegment::new();

/// Build the descriptor tables and hand them to the CPU.
///
/// Zeroes the TSS, points its `ss0` at the kernel data segment, fills the
/// six GDT entries, then loads GDTR and marks the TSS entry as the active
/// hardware task register. Must run before [`crate::arch::x86::idt::configure`]
/// and before interrupts are enabled.
#[cfg(target_arch = "x86")]
pub fn configure() {
    use crate::constants::KERNEL_DATA_SELECTOR;
    use x86::dtables::{DescriptorTablePointer, lgdt};
    use x86::segmentation::SegmentSelector;
    use x86::task::load_tr;

    // SAFETY: runs once during boot, before interrupts exist; nothing else
    // aliases the table statics
    unsafe {
        let tss = &mut *(&raw mut TSS);
        *tss = TaskStateSegment::new();
        tss.ss0 = KERNEL_DATA_SELECTOR;

        let gdt = &mut *(&raw mut GDT);
        *gdt = Gdt::flat(tss as *const TaskStateSegment as u32);

        let pointer = DescriptorTablePointer {
            limit: (core::mem::size_of::<Gdt>() - 1) as u16,
            base: gdt.entries.as_ptr(),
        };
        lgdt(&pointer);
        load_tr(SegmentSelector::from_raw(crate::constants::TSS_SELECTOR));
    }
}

/// Get a mutable reference to the shared TSS.
///
/// # Safety
///
/// Caller must be the single logical thread of control (interrupt context
/// with interrupts disabled, or boot before they are enabled).
pub unsafe fn tss_mut() -> &'static mut TaskStateSegment {
    // SAFETY: exclusivity is the caller's contract
    unsafe { &mut *(&raw mut TSS) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{
        KERNEL_CODE_SELECTOR, TSS_SELECTOR, USER_CODE_SELECTOR,
        USER_DATA_SELECTOR,
    };

    #[test]
    fn test_tss_is_104_bytes() {
        assert_eq!(core::mem::size_of::<TaskStateSegment>(), 104);
    }

    #[test]
    fn test_descriptor_is_8_bytes() {
        assert_eq!(core::mem::size_of::<SegmentDescriptor>(), 8);
        assert_eq!(core::mem::size_of::<Gdt>(), 48);
    }

    #[test]
    fn test_descriptor_round_trip() {
        // every (base, limit, access, flags) tuple used by the flat table
        let cases: &[(u32, u32, u8, u8)] = &[
            (0, 0, 0, 0),
            (0, 0xF_FFFF, 0x9A, 0xC0),
            (0, 0xF_FFFF, 0x92, 0xC0),
            (0, 0xF_FFFF, 0xFA, 0xC0),
            (0, 0xF_FFFF, 0xF2, 0xC0),
            (0x00CA_FE00, 104, 0x89, 0x40),
        ];
        for &(base, limit, access, flags) in cases {
            let d = SegmentDescriptor::new(base, limit, access, flags);
            assert_eq!(d.base(), base);
            assert_eq!(d.limit(), limit);
            assert_eq!(d.access(), access);
            assert_eq!(d.flags(), flags);
        }
    }

    #[test]
    fn test_flat_table_privilege_levels() {
        let gdt = Gdt::flat(0x1000);
        let e = gdt.entries();
        assert_eq!(e[1].dpl(), 0);
        assert_eq!(e[2].dpl(), 0);
        assert_eq!(e[3].dpl(), 3);
        assert_eq!(e[4].dpl(), 3);
        // TSS descriptor is a ring-0 system segment
        assert_eq!(e[5].dpl(), 0);
        assert_eq!(e[5].access() & 0x10, 0, "TSS must be a system descriptor");
    }

    #[test]
    fn test_flat_table_tss_entry() {
        let gdt = Gdt::flat(0xDEAD_B000);
        let tss = gdt.entries()[5];
        assert_eq!(tss.base(), 0xDEAD_B000);
        assert_eq!(tss.limit(), 104);
        assert_eq!(tss.access(), 0x89);
        assert_eq!(tss.flags(), 0x40);
    }

    #[test]
    fn test_selectors_match_indices() {
        assert_eq!(KERNEL_CODE_SELECTOR, 1 * 8);
        assert_eq!(USER_CODE_SELECTOR, 3 * 8);
        assert_eq!(USER_DATA_SELECTOR, 4 * 8);
        assert_eq!(TSS_SELECTOR, 5 * 8);
    }

    #[test]
    fn test_limit_truncated_to_20_bits() {
        let d = SegmentDescriptor::new(0, 0xFFFF_FFFF, 0x9A, 0xC0);
        // 4KiB granularity: hardware scales the 20-bit limit up to 4GiB
        assert_eq!(d.limit(), 0xF_FFFF);
    }
}
