//! # Trap Vectors
//!
//! Every vector the kernel installs a gate for is described once in
//! [`VECTORS`]. The gate table is built from it and the dispatcher routes by
//! it, so privilege and gate type live in data rather than in code.

use crate::privilege::Ring;

pub const DIVIDE: u8 = 0;
pub const DEBUG: u8 = 1;
pub const NMI: u8 = 2;
pub const BREAKPOINT: u8 = 3;
pub const OVERFLOW: u8 = 4;
pub const BOUND: u8 = 5;
pub const INVALID_OPCODE: u8 = 6;
pub const DEVICE: u8 = 7;
pub const DOUBLE_FAULT: u8 = 8;
pub const INVALID_TSS: u8 = 10;
pub const SEGMENT_NOT_PRESENT: u8 = 11;
pub const STACK: u8 = 12;
pub const GENERAL_PROTECTION: u8 = 13;
pub const PAGE_FAULT: u8 = 14;
pub const FPU_ERROR: u8 = 16;
pub const ALIGNMENT: u8 = 17;
pub const MACHINE_CHECK: u8 = 18;
pub const SIMD_ERROR: u8 = 19;

/// Software interrupt used for system calls.
pub const SYSCALL: u8 = 48;

/// Gate kinds.
///
/// An interrupt gate clears `IF` on entry; a trap gate leaves it alone.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum GateType {
    InterruptGate,
    TrapGate,
}

impl GateType {
    /// 32-bit gate type code for the descriptor's type field.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::InterruptGate => 0xE,
            Self::TrapGate => 0xF,
        }
    }
}

/// Where the dispatcher sends a trap.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Route {
    PageFault,
    Monitor,
    Syscall,
    Unhandled,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct VectorInfo {
    pub vector: u8,
    pub name: &'static str,
    pub route: Route,
    /// Lowest privilege allowed to raise the vector with `int n`.
    pub dpl: Ring,
    pub gate: GateType,
}

const fn exception(vector: u8) -> VectorInfo {
    VectorInfo {
        vector,
        name: EXCEPTION_NAMES[vector as usize],
        route: Route::Unhandled,
        dpl: Ring::Ring0,
        gate: GateType::TrapGate,
    }
}

/// Every vector that gets a gate. Vectors 9 and 15 are reserved and stay
/// empty.
pub const VECTORS: [VectorInfo; 19] = [
    exception(DIVIDE),
    exception(DEBUG),
    VectorInfo {
        gate: GateType::InterruptGate,
        ..exception(NMI)
    },
    VectorInfo {
        route: Route::Monitor,
        dpl: Ring::Ring3,
        ..exception(BREAKPOINT)
    },
    exception(OVERFLOW),
    exception(BOUND),
    exception(INVALID_OPCODE),
    exception(DEVICE),
    exception(DOUBLE_FAULT),
    exception(INVALID_TSS),
    exception(SEGMENT_NOT_PRESENT),
    exception(STACK),
    exception(GENERAL_PROTECTION),
    VectorInfo {
        route: Route::PageFault,
        ..exception(PAGE_FAULT)
    },
    exception(FPU_ERROR),
    exception(ALIGNMENT),
    exception(MACHINE_CHECK),
    exception(SIMD_ERROR),
    VectorInfo {
        vector: SYSCALL,
        name: "System call",
        route: Route::Syscall,
        dpl: Ring::Ring3,
        gate: GateType::InterruptGate,
    },
];

const EXCEPTION_NAMES: [&str; 20] = [
    "Divide error",
    "Debug",
    "Non-Maskable Interrupt",
    "Breakpoint",
    "Overflow",
    "BOUND Range Exceeded",
    "Invalid Opcode",
    "Device Not Available",
    "Double Fault",
    "Coprocessor Segment Overrun",
    "Invalid TSS",
    "Segment Not Present",
    "Stack Fault",
    "General Protection",
    "Page Fault",
    "(unknown trap)",
    "x87 FPU Floating-Point Error",
    "Alignment Check",
    "Machine-Check",
    "SIMD Floating-Point Exception",
];

/// Human-readable name of a trap number.
#[must_use]
pub fn trap_name(trapno: u32) -> &'static str {
    let exception = usize::try_from(trapno)
        .ok()
        .and_then(|i| EXCEPTION_NAMES.get(i));
    match exception {
        Some(name) => name,
        None if trapno == u32::from(SYSCALL) => "System call",
        None => "(unknown trap)",
    }
}

/// The table entry for `trapno`, if the kernel installs a gate for it.
#[must_use]
pub fn vector_info(trapno: u32) -> Option<&'static VectorInfo> {
    VECTORS.iter().find(|v| u32::from(v.vector) == trapno)
}

/// Where a trap with this number goes.
#[must_use]
pub fn route(trapno: u32) -> Route {
    vector_info(trapno).map_or(Route::Unhandled, |v| v.route)
}
