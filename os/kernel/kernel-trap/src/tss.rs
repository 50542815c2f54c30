//! # Task State Segment
//!
//! Without hardware task switching the TSS only matters for one thing: on a
//! user to kernel transition the CPU loads `ss0:esp0` from it before pushing
//! the trap frame. `iomb` points past the end of the segment, so there is no
//! I/O permission bitmap and user code gets no port access.

use crate::cpu::TrapCpu;
use crate::gate::gate_table;
use bitfield_struct::bitfield;
use core::mem::size_of;
use kernel_info::memory::KSTACKTOP;
use kernel_info::segments::{GD_KD, GD_TSS0};
use kernel_sync::SpinLock;
use log::info;

/// 32-bit task state segment.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct TaskState {
    pub link: u16,
    pub padding0: u16,
    pub esp0: u32,
    pub ss0: u16,
    pub padding1: u16,
    pub esp1: u32,
    pub ss1: u16,
    pub padding2: u16,
    pub esp2: u32,
    pub ss2: u16,
    pub padding3: u16,
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
    pub padding4: u16,
    pub cs: u16,
    pub padding5: u16,
    pub ss: u16,
    pub padding6: u16,
    pub ds: u16,
    pub padding7: u16,
    pub fs: u16,
    pub padding8: u16,
    pub gs: u16,
    pub padding9: u16,
    pub ldt: u16,
    pub padding10: u16,
    /// Debug trap flag.
    pub t: u16,
    /// Offset of the I/O permission bitmap.
    pub iomb: u16,
}

const _: () = assert!(size_of::<TaskState>() == 104);

impl TaskState {
    #[must_use]
    pub const fn zeroed() -> Self {
        Self {
            link: 0,
            padding0: 0,
            esp0: 0,
            ss0: 0,
            padding1: 0,
            esp1: 0,
            ss1: 0,
            padding2: 0,
            esp2: 0,
            ss2: 0,
            padding3: 0,
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
            padding4: 0,
            cs: 0,
            padding5: 0,
            ss: 0,
            padding6: 0,
            ds: 0,
            padding7: 0,
            fs: 0,
            padding8: 0,
            gs: 0,
            padding9: 0,
            ldt: 0,
            padding10: 0,
            t: 0,
            iomb: 0,
        }
    }

    /// Set up the ring 0 stack for traps from user mode and disable the I/O
    /// permission bitmap.
    #[allow(clippy::cast_possible_truncation)]
    pub const fn prepare_kernel_entry(&mut self, esp0: u32, ss0: u16) {
        self.esp0 = esp0;
        self.ss0 = ss0;
        self.iomb = size_of::<Self>() as u16;
    }
}

/// GDT descriptor for a 32-bit TSS (a system segment, `S = 0`).
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct TssDescriptor {
    pub limit_lo: u16,
    pub base_lo: u16,
    pub base_mid: u8,
    /// 0x9 = available 32-bit TSS, 0xB = busy.
    #[bits(4)]
    pub typ: u8,
    pub s: bool,
    #[bits(2)]
    pub dpl: u8,
    pub present: bool,
    #[bits(4)]
    pub limit_hi: u8,
    pub avl: bool,
    __zero: bool,
    /// Default operation size; set for 32-bit segments.
    pub db: bool,
    pub granularity: bool,
    pub base_hi: u8,
}

impl TssDescriptor {
    pub const AVAILABLE_32: u8 = 0x9;

    /// An available 32-bit TSS at `base` with a byte-granular `limit`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn available(base: u32, limit: u32) -> Self {
        Self::new()
            .with_limit_lo(limit as u16)
            .with_base_lo(base as u16)
            .with_base_mid((base >> 16) as u8)
            .with_typ(Self::AVAILABLE_32)
            .with_s(false)
            .with_dpl(0)
            .with_present(true)
            .with_limit_hi(((limit >> 16) & 0xF) as u8)
            .with_db(true)
            .with_granularity(false)
            .with_base_hi((base >> 24) as u8)
    }

    #[must_use]
    pub fn base(&self) -> u32 {
        (u32::from(self.base_hi()) << 24) | (u32::from(self.base_mid()) << 16) | u32::from(self.base_lo())
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        (u32::from(self.limit_hi()) << 16) | u32::from(self.limit_lo())
    }
}

static TASK_STATE: SpinLock<TaskState> = SpinLock::new(TaskState::zeroed());

/// Load the processor's TSS and the published gate table.
///
/// # Panics
/// If [`init_traps`](crate::init_traps) has not run.
#[allow(clippy::cast_possible_truncation)]
pub fn init_traps_per_processor<C: TrapCpu>(cpu: &mut C) {
    let Some(idt) = gate_table() else {
        panic!("init_traps_per_processor called before init_traps");
    };

    let base = TASK_STATE.with_lock(|ts| {
        ts.prepare_kernel_entry(KSTACKTOP, GD_KD);
        core::ptr::from_mut(ts) as usize as u32
    });
    let limit = size_of::<TaskState>() as u32 - 1;

    cpu.install_task_state(GD_TSS0, TssDescriptor::available(base, limit));
    cpu.load_task_register(GD_TSS0);
    cpu.load_gate_table(idt);
    info!("trap handling ready: esp0 {KSTACKTOP:#010x}, tss at {base:#010x}");
}

/// A copy of the current task state.
#[must_use]
pub fn task_state() -> TaskState {
    TASK_STATE.with_lock(|ts| *ts)
}
