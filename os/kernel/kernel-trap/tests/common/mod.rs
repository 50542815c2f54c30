#![allow(dead_code)]

use kernel_info::segments::{GD_KD, GD_KT, GD_UD, GD_UT};
use kernel_memory_addresses::VirtualAddress;
use kernel_trap::{EnvId, EnvStatus, Environments, Idt, Monitor, SyscallHandler, TrapCpu, TrapFrame, TssDescriptor};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuOp {
    FaultAddress,
    ClearDirection,
    InstallTaskState(u16, TssDescriptor),
    LoadTaskRegister(u16),
    LoadGateTable(*const Idt),
}

/// Records every operation; `CR2` and `IF` are preset.
pub struct MockCpu {
    pub cr2: VirtualAddress,
    pub interrupts: bool,
    pub ops: std::cell::RefCell<Vec<CpuOp>>,
}

impl MockCpu {
    pub fn with_cr2(cr2: u32) -> Self {
        Self {
            cr2: VirtualAddress::new(cr2),
            interrupts: false,
            ops: std::cell::RefCell::default(),
        }
    }

    pub fn ops(&self) -> Vec<CpuOp> {
        self.ops.borrow().clone()
    }
}

impl TrapCpu for MockCpu {
    fn interrupts_enabled(&self) -> bool {
        self.interrupts
    }

    fn clear_direction_flag(&self) {
        self.ops.borrow_mut().push(CpuOp::ClearDirection);
    }

    fn fault_address(&self) -> VirtualAddress {
        self.ops.borrow_mut().push(CpuOp::FaultAddress);
        self.cr2
    }

    fn install_task_state(&mut self, selector: u16, descriptor: TssDescriptor) {
        self.ops.borrow_mut().push(CpuOp::InstallTaskState(selector, descriptor));
    }

    fn load_task_register(&mut self, selector: u16) {
        self.ops.borrow_mut().push(CpuOp::LoadTaskRegister(selector));
    }

    fn load_gate_table(&mut self, idt: &'static Idt) {
        self.ops.borrow_mut().push(CpuOp::LoadGateTable(core::ptr::from_ref(idt)));
    }
}

pub struct Env {
    pub status: EnvStatus,
    pub frame: TrapFrame,
}

/// An environment table where destroying the current environment leaves no
/// current environment, unless `successor` names one to switch to.
#[derive(Default)]
pub struct MockEnvs {
    pub envs: BTreeMap<EnvId, Env>,
    pub current: Option<EnvId>,
    pub successor: Option<EnvId>,
    pub destroyed: Vec<EnvId>,
}

impl MockEnvs {
    /// One running environment with `id`.
    pub fn running(id: u32) -> Self {
        let mut envs = Self::default();
        envs.add(id, EnvStatus::Running);
        envs.current = Some(EnvId(id));
        envs
    }

    pub fn add(&mut self, id: u32, status: EnvStatus) {
        self.envs.insert(
            EnvId(id),
            Env {
                status,
                frame: TrapFrame::default(),
            },
        );
    }

    pub fn frame(&self, id: u32) -> &TrapFrame {
        &self.envs[&EnvId(id)].frame
    }
}

impl Environments for MockEnvs {
    fn current(&self) -> Option<EnvId> {
        self.current
    }

    fn status(&self, env: EnvId) -> EnvStatus {
        self.envs.get(&env).map_or(EnvStatus::Free, |e| e.status)
    }

    fn trap_frame_mut(&mut self, env: EnvId) -> &mut TrapFrame {
        &mut self.envs.get_mut(&env).expect("known environment").frame
    }

    fn destroy(&mut self, env: EnvId) {
        self.destroyed.push(env);
        if let Some(e) = self.envs.get_mut(&env) {
            e.status = EnvStatus::Free;
        }
        if self.current == Some(env) {
            self.current = self.successor.take();
            if let Some(next) = self.current {
                self.envs.get_mut(&next).expect("known successor").status = EnvStatus::Running;
            }
        }
    }

    fn resume(&mut self, env: EnvId) -> ! {
        panic!("resumed {env}");
    }

    fn resume_frame(&mut self, frame: &TrapFrame) -> ! {
        panic!("resumed trap frame with eax {}", frame.regs.eax);
    }
}

/// Returns `result` and remembers each call.
#[derive(Default)]
pub struct RecordingSyscalls {
    pub result: i32,
    pub calls: Vec<(u32, [u32; 5])>,
}

impl<E: Environments> SyscallHandler<E> for RecordingSyscalls {
    fn syscall(&mut self, _envs: &mut E, number: u32, args: [u32; 5]) -> i32 {
        self.calls.push((number, args));
        self.result
    }
}

/// Points the caller's saved `eip` at `eip` and returns zero, the way a
/// call that replaces its own trap frame does.
pub struct SetOwnEip {
    pub eip: u32,
}

impl SyscallHandler<MockEnvs> for SetOwnEip {
    fn syscall(&mut self, envs: &mut MockEnvs, _number: u32, _args: [u32; 5]) -> i32 {
        let caller = envs.current().expect("a calling environment");
        envs.trap_frame_mut(caller).eip = self.eip;
        0
    }
}

/// Counts entries and sets the trap flag in the frame it is given.
#[derive(Default)]
pub struct RecordingMonitor {
    pub entered: Vec<u32>,
}

impl Monitor for RecordingMonitor {
    fn enter(&mut self, frame: &mut TrapFrame) {
        self.entered.push(frame.eip);
        frame.eflags |= 1 << 8;
    }
}

pub fn user_frame(trapno: u32) -> TrapFrame {
    TrapFrame {
        es: GD_UD | 3,
        ds: GD_UD | 3,
        trapno,
        eip: 0x0080_0020,
        cs: GD_UT | 3,
        eflags: 0x202,
        esp: 0xEEBF_DFF0,
        ss: GD_UD | 3,
        ..TrapFrame::default()
    }
}

pub fn kernel_frame(trapno: u32) -> TrapFrame {
    TrapFrame {
        es: GD_KD,
        ds: GD_KD,
        trapno,
        eip: 0xF010_0A3C,
        cs: GD_KT,
        ..TrapFrame::default()
    }
}
