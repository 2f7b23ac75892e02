//! MIC-1 execution engine.
//!
//! One [`Mic1::tick`] is one clock cycle, run in three phases:
//! 1. Fetch the microinstruction at MPC, drive the ALU (A = H, B = the
//!    B-bus source) and the shifter.
//! 2. Write the shifter output to the C-bus targets, then copy last tick's
//!    READ/FETCH results into MDR/MBR and latch N/Z.
//! 3. Stage and apply this tick's memory access, then compute the next MPC.
//!
//! The stepping calls ([`Mic1::micro_step`], [`Mic1::step`], [`Mic1::run`])
//! are built on top of `tick` and consult the breakpoints and the optional
//! [`Controller`] between ticks.

use crate::config::{ConfigError, SimulatorConfig};
use crate::cpu::control_store::ControlStore;
use crate::cpu::debug::{Breakpoint, BreakpointEntry, Breakpoints, Controller};
use crate::cpu::decode::MicroInstruction;
use crate::cpu::format::{self, FormatError};
use crate::cpu::memory::{Memory, MemoryError};
use crate::cpu::registers::{Register, Registers};
use crate::datapath::{Alu, MpcCalculator, Shifter, SignalError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Why the machine halted on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltReason {
    /// A no-op at `address` branched back to itself.
    SelfLoop { address: u16 },
    /// MPC points at a control store slot with no instruction.
    UndefinedSlot { address: u16 },
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HaltReason::SelfLoop { address } => write!(f, "halt loop at {address:#05X}"),
            HaltReason::UndefinedSlot { address } => write!(f, "no microinstruction at {address:#05X}"),
        }
    }
}

/// Why a stepping call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The requested number of ticks or macro instructions ran.
    Completed,
    Halted(HaltReason),
    /// The breakpoint with this id fired.
    Breakpoint(u32),
    /// The attached controller refused to continue.
    Vetoed,
    /// `run_limited` used up its budget.
    TickLimit,
}

/// Outcome of a stepping call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Ticks executed by this call.
    pub ticks: u64,
    pub stop: StopReason,
}

/// Transient engine state, cleared by [`Mic1::reset`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Address of the next microinstruction.
    pub mpc: u16,
    /// Address of the last executed microinstruction.
    pub prev_mpc: Option<u16>,
    /// Last executed microinstruction.
    pub executed: Option<MicroInstruction>,
    /// Ticks since the current stepping call began.
    pub ticks: u64,
    /// Ticks since construction or the last reset.
    pub total_ticks: u64,
    /// Byte address of the most recent FETCH.
    pub last_fetch: Option<u32>,
    /// N flag from the last ALU operation.
    pub n: bool,
    /// Z flag from the last ALU operation.
    pub z: bool,
    pub halt: Option<HaltReason>,
}

/// The MIC-1 simulator.
pub struct Mic1 {
    regs: Registers,
    mem: Memory,
    store: ControlStore,
    alu: Alu,
    shifter: Shifter,
    mpc: MpcCalculator,
    cursor: Cursor,
    breakpoints: Breakpoints,
    controller: Option<Box<dyn Controller>>,
}

impl Mic1 {
    /// Build a simulator from a microcode image and an IJVM image.
    pub fn new(micro: &[u8], program: &[u8]) -> Result<Self, SimError> {
        Self::with_config(micro, program, &SimulatorConfig::default())
    }

    pub fn with_config(micro: &[u8], program: &[u8], config: &SimulatorConfig) -> Result<Self, SimError> {
        config.validate()?;
        let store = ControlStore::from_bytes(micro)?;
        let mem = Memory::load(program, config.memory_words)?;
        tracing::debug!(
            microinstructions = store.len(),
            segments = mem.segments().len(),
            "simulator created"
        );

        Ok(Self {
            regs: Registers::with_defaults(config.register_defaults()),
            mem,
            store,
            alu: Alu::new(),
            shifter: Shifter::new(),
            mpc: MpcCalculator::new(),
            cursor: Cursor::default(),
            breakpoints: Breakpoints::new(),
            controller: None,
        })
    }

    pub fn from_files<P: AsRef<Path>, Q: AsRef<Path>>(micro: P, program: Q) -> Result<Self, SimError> {
        Self::from_files_with_config(micro, program, &SimulatorConfig::default())
    }

    pub fn from_files_with_config<P: AsRef<Path>, Q: AsRef<Path>>(
        micro: P,
        program: Q,
        config: &SimulatorConfig,
    ) -> Result<Self, SimError> {
        let micro = format::read_image(micro)?;
        let program = format::read_image(program)?;
        Self::with_config(&micro, &program, config)
    }

    /// Back to the state right after construction.
    ///
    /// Breakpoints, the attached controller and console output survive.
    pub fn reset(&mut self) {
        self.regs.reset_all();
        self.mem.restore();
        self.alu.reset();
        self.shifter.reset();
        self.mpc.reset();
        self.cursor = Cursor::default();
        tracing::debug!("simulator reset");
    }

    /// Execute one clock cycle.
    ///
    /// Returns the halt reason if the machine cannot go on. An undefined
    /// slot at MPC is reported without executing anything.
    pub fn tick(&mut self) -> Result<Option<HaltReason>, SimError> {
        let address = self.cursor.mpc;
        let Some(&instr) = self.store.get(address) else {
            let reason = HaltReason::UndefinedSlot { address };
            self.cursor.halt = Some(reason);
            return Ok(Some(reason));
        };

        // Phase 1: ALU and shifter
        let b = instr.b_bus.read(&self.regs);
        let out = self.alu.compute(self.regs.h, b, &instr.alu);
        let shifted = self.shifter.calculate(out.value, &instr.shift)?;

        // Phase 2: write-back, then the memory latch
        for reg in instr.c_bus.iter() {
            self.regs.set(reg, shifted);
        }
        let fill = self.mem.fill();
        if let Some(word) = fill.word {
            self.regs.mdr = word;
        }
        if let Some(byte) = fill.byte {
            self.regs.set_mbr(byte);
        }
        self.cursor.n = out.negative;
        self.cursor.z = out.zero;

        // Phase 3: memory, then next address
        self.mem.stage(instr.memory, self.regs.mar, self.regs.mdr, self.regs.pc);
        self.mem.apply()?;
        if instr.memory.fetch {
            self.cursor.last_fetch = Some(self.regs.pc as u32);
        }
        let next = self
            .mpc
            .calculate(instr.next_address, self.regs.mbr_byte(), &instr.jump, out.negative, out.zero);

        self.cursor.prev_mpc = Some(address);
        self.cursor.mpc = next;
        self.cursor.executed = Some(instr);
        self.cursor.ticks += 1;
        self.cursor.total_ticks += 1;

        tracing::trace!(
            mpc = address,
            next,
            n = out.negative,
            z = out.zero,
            alu = out.value,
            "tick"
        );

        if let Some(controller) = self.controller.as_mut() {
            controller.tick_done(&instr, instr.memory.fetch);
        }

        let halt = if instr.is_nop() && next == address {
            Some(HaltReason::SelfLoop { address })
        } else if !self.store.contains(next) {
            Some(HaltReason::UndefinedSlot { address: next })
        } else {
            None
        };
        self.cursor.halt = halt;
        Ok(halt)
    }

    /// Execute up to `n` ticks.
    pub fn micro_step(&mut self, n: u32) -> Result<RunSummary, SimError> {
        self.cursor.ticks = 0;
        for i in 0..n {
            if i > 0 {
                if let Some(stop) = self.check_controllers() {
                    return Ok(self.summary(stop));
                }
            }
            if let Some(reason) = self.tick()? {
                return Ok(self.halted(reason));
            }
        }
        Ok(self.summary(StopReason::Completed))
    }

    /// Execute `n` IJVM instructions.
    ///
    /// An instruction boundary is crossed each time the engine is about to
    /// run the dispatch microinstruction with a PC different from the one
    /// at the previous boundary.
    pub fn step(&mut self, n: u32) -> Result<RunSummary, SimError> {
        self.cursor.ticks = 0;
        if n == 0 {
            return Ok(self.summary(StopReason::Completed));
        }

        let mut boundary_pc = self.regs.pc;
        let mut crossed = 0;
        loop {
            if self.cursor.ticks > 0 && self.at_dispatch() && self.regs.pc != boundary_pc {
                crossed += 1;
                boundary_pc = self.regs.pc;
                if crossed == n {
                    return Ok(self.summary(StopReason::Completed));
                }
            }
            if self.cursor.ticks > 0 {
                if let Some(stop) = self.check_controllers() {
                    return Ok(self.summary(stop));
                }
            }
            if let Some(reason) = self.tick()? {
                return Ok(self.halted(reason));
            }
        }
    }

    /// Run until the machine halts or a breakpoint fires.
    pub fn run(&mut self) -> Result<RunSummary, SimError> {
        self.run_until(None)
    }

    /// Like [`Mic1::run`], but gives up after `max_ticks` ticks.
    pub fn run_limited(&mut self, max_ticks: u64) -> Result<RunSummary, SimError> {
        self.run_until(Some(max_ticks))
    }

    fn run_until(&mut self, max_ticks: Option<u64>) -> Result<RunSummary, SimError> {
        self.cursor.ticks = 0;
        loop {
            if max_ticks.is_some_and(|max| self.cursor.ticks >= max) {
                return Ok(self.summary(StopReason::TickLimit));
            }
            if self.cursor.ticks > 0 {
                if let Some(stop) = self.check_controllers() {
                    return Ok(self.summary(stop));
                }
            }
            if let Some(reason) = self.tick()? {
                return Ok(self.halted(reason));
            }
        }
    }

    /// Ask the breakpoints, then the attached controller, whether the next
    /// tick may run.
    fn check_controllers(&mut self) -> Option<StopReason> {
        let micro_line = self.cursor.mpc;
        let macro_line = self.next_macro_line();

        if !self.breakpoints.can_continue(micro_line, macro_line, &self.regs) {
            if let Some(entry) = self.breakpoints.fired() {
                tracing::info!(id = entry.id, breakpoint = %entry.breakpoint, "breakpoint hit");
                return Some(StopReason::Breakpoint(entry.id));
            }
        }
        if let Some(controller) = self.controller.as_mut() {
            if !controller.can_continue(micro_line, macro_line, &self.regs) {
                tracing::info!(mpc = micro_line, "controller stopped execution");
                return Some(StopReason::Vetoed);
            }
        }
        None
    }

    fn halted(&self, reason: HaltReason) -> RunSummary {
        tracing::info!(%reason, ticks = self.cursor.ticks, "machine halted");
        self.summary(StopReason::Halted(reason))
    }

    fn summary(&self, stop: StopReason) -> RunSummary {
        RunSummary { ticks: self.cursor.ticks, stop }
    }

    /// The next microinstruction dispatches on an opcode.
    fn at_dispatch(&self) -> bool {
        self.next_instruction().is_some_and(MicroInstruction::is_dispatch)
    }

    /// The breakpoint that fires for the current machine state, if any.
    pub fn pending_breakpoint(&self) -> Option<&BreakpointEntry> {
        self.breakpoints.hit(self.cursor.mpc, self.next_macro_line(), &self.regs)
    }

    /// PC, when the next tick dispatches an IJVM instruction.
    pub fn next_macro_line(&self) -> Option<u32> {
        self.at_dispatch().then_some(self.regs.pc as u32)
    }

    /// Whether the instruction about to execute can only halt.
    pub fn is_halt_instruction(&self) -> bool {
        let mpc = self.cursor.mpc;
        self.store.get(mpc).map_or(true, |instr| instr.is_halt_at(mpc))
    }

    /// The microinstruction at MPC.
    pub fn next_instruction(&self) -> Option<&MicroInstruction> {
        self.store.get(self.cursor.mpc)
    }

    pub fn mpc(&self) -> u16 {
        self.cursor.mpc
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn total_ticks(&self) -> u64 {
        self.cursor.total_ticks
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn register(&self, reg: Register) -> i32 {
        self.regs.get(reg)
    }

    pub fn set_register(&mut self, reg: Register, value: i32) {
        self.regs.set(reg, value);
    }

    pub fn read_word(&self, addr: u32) -> Result<i32, MemoryError> {
        self.mem.read_word(addr)
    }

    pub fn write_word(&mut self, addr: u32, value: i32) -> Result<(), MemoryError> {
        self.mem.write_word(addr, value)
    }

    pub fn memory(&self) -> &Memory {
        &self.mem
    }

    pub fn control_store(&self) -> &ControlStore {
        &self.store
    }

    pub fn alu(&self) -> &Alu {
        &self.alu
    }

    /// Queue console input for the IO port.
    pub fn push_input(&mut self, bytes: &[u8]) {
        self.mem.console_mut().push_input(bytes);
    }

    /// Console output so far.
    pub fn output(&self) -> &[u8] {
        self.mem.console().output()
    }

    pub fn take_output(&mut self) -> Vec<u8> {
        self.mem.console_mut().take_output()
    }

    pub fn add_breakpoint(&mut self, breakpoint: Breakpoint) -> Option<u32> {
        self.breakpoints.add(breakpoint)
    }

    pub fn remove_breakpoint(&mut self, id: u32) -> Option<Breakpoint> {
        self.breakpoints.remove(id)
    }

    pub fn breakpoints(&self) -> &[BreakpointEntry] {
        self.breakpoints.list()
    }

    pub fn breakpoints_mut(&mut self) -> &mut Breakpoints {
        &mut self.breakpoints
    }

    /// Attach a controller, replacing any previous one.
    pub fn set_controller(&mut self, controller: Box<dyn Controller>) {
        self.controller = Some(controller);
    }

    pub fn take_controller(&mut self) -> Option<Box<dyn Controller>> {
        self.controller.take()
    }
}

impl fmt::Debug for Mic1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mic1")
            .field("cursor", &self.cursor)
            .field("regs", &self.regs)
            .field("store", &self.store)
            .field("mem", &self.mem)
            .field("breakpoints", &self.breakpoints.len())
            .field("controller", &self.controller.is_some())
            .finish()
    }
}

/// Errors that can occur while building or running the simulator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("signal error: {0}")]
    Signal(#[from] SignalError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::control_store::encode_microcode;
    use crate::cpu::decode::{BusSource, CBus, MemorySignals};
    use crate::cpu::memory::encode_program;
    use crate::datapath::{AluSignals, JumpSignals};

    /// `reg = reg + 1`
    fn inc(reg: Register, bus: BusSource, next: u16) -> MicroInstruction {
        MicroInstruction {
            next_address: next,
            alu: AluSignals { f0: true, f1: true, enb: true, inc: true, ..Default::default() },
            c_bus: CBus::of(&[reg]),
            b_bus: bus,
            ..Default::default()
        }
    }

    fn halt_at(address: u16) -> MicroInstruction {
        MicroInstruction { next_address: address, ..Default::default() }
    }

    fn machine(micro: &[MicroInstruction], program: &[u8]) -> Mic1 {
        Mic1::new(&encode_microcode(micro), &encode_program(&[(0, program)])).unwrap()
    }

    #[test]
    fn test_counts_ticks_until_self_loop() {
        let mut sim = machine(
            &[inc(Register::Tos, BusSource::Tos, 1), inc(Register::Tos, BusSource::Tos, 2), halt_at(2)],
            &[],
        );

        let summary = sim.run().unwrap();
        assert_eq!(summary, RunSummary { ticks: 3, stop: StopReason::Halted(HaltReason::SelfLoop { address: 2 }) });
        assert_eq!(sim.register(Register::Tos), 2);
        assert!(sim.is_halt_instruction());
    }

    #[test]
    fn test_undefined_next_slot_halts() {
        let mut sim = machine(&[inc(Register::H, BusSource::None, 7)], &[]);
        let summary = sim.run().unwrap();
        assert_eq!(summary.ticks, 1);
        assert_eq!(summary.stop, StopReason::Halted(HaltReason::UndefinedSlot { address: 7 }));
        assert_eq!(sim.register(Register::H), 1);

        // Nothing left to execute
        assert!(sim.is_halt_instruction());
        assert_eq!(sim.micro_step(5).unwrap().ticks, 0);
    }

    #[test]
    fn test_breakpoint_veto_names_the_entry() {
        let mut sim = machine(&[inc(Register::H, BusSource::None, 1), inc(Register::Tos, BusSource::Tos, 0)], &[]);
        sim.breakpoints_mut().add_register(Register::Tos, 5);
        let id = sim.breakpoints_mut().add_micro_line(1).unwrap();

        assert_eq!(sim.run().unwrap(), RunSummary { ticks: 1, stop: StopReason::Breakpoint(id) });
        let fired = sim.breakpoints_mut().fired().copied();
        assert_eq!(fired, Some(BreakpointEntry { id, breakpoint: Breakpoint::MicroLine(1) }));
    }

    #[test]
    fn test_oversized_memory_rejected_before_allocation() {
        let config = SimulatorConfig { memory_words: usize::MAX, ..SimulatorConfig::default() };
        let micro = encode_microcode(&[halt_at(0)]);
        let program = encode_program(&[]);
        assert!(matches!(
            Mic1::with_config(&micro, &program, &config),
            Err(SimError::Config(ConfigError::Invalid(_)))
        ));
    }

    #[test]
    fn test_zero_steps() {
        let mut sim = machine(&[inc(Register::H, BusSource::None, 0)], &[]);
        assert_eq!(sim.micro_step(0).unwrap(), RunSummary { ticks: 0, stop: StopReason::Completed });
        assert_eq!(sim.step(0).unwrap(), RunSummary { ticks: 0, stop: StopReason::Completed });
        assert_eq!(sim.register(Register::H), 0);
    }

    #[test]
    fn test_micro_step_counts_per_call() {
        let mut sim = machine(&[inc(Register::H, BusSource::None, 0)], &[]);
        assert_eq!(sim.micro_step(3).unwrap().ticks, 3);
        assert_eq!(sim.micro_step(2).unwrap().ticks, 2);
        assert_eq!(sim.total_ticks(), 5);
    }

    #[test]
    fn test_run_limited() {
        let mut sim = machine(&[inc(Register::Opc, BusSource::Opc, 0)], &[]);
        let summary = sim.run_limited(50).unwrap();
        assert_eq!(summary, RunSummary { ticks: 50, stop: StopReason::TickLimit });
        assert_eq!(sim.register(Register::Opc), 50);
    }

    #[test]
    fn test_read_lands_one_tick_later() {
        let read = MicroInstruction {
            next_address: 1,
            memory: MemorySignals { read: true, ..Default::default() },
            ..Default::default()
        };
        // H = MDR
        let copy = MicroInstruction {
            next_address: 2,
            alu: AluSignals { f1: true, enb: true, ..Default::default() },
            c_bus: CBus::of(&[Register::H]),
            b_bus: BusSource::Mdr,
            ..Default::default()
        };
        let mut sim = machine(&[read, copy, copy, halt_at(3), halt_at(3)], &[0, 0, 0, 42]);

        sim.micro_step(2).unwrap();
        // The ALU ran before the latch filled MDR
        assert_eq!(sim.register(Register::H), 0);
        assert_eq!(sim.register(Register::Mdr), 42);

        sim.micro_step(1).unwrap();
        assert_eq!(sim.register(Register::H), 42);
    }

    #[test]
    fn test_latched_read_wins_over_c_bus() {
        let read = MicroInstruction {
            next_address: 1,
            memory: MemorySignals { read: true, ..Default::default() },
            ..Default::default()
        };
        let mut sim = machine(&[read, inc(Register::Mdr, BusSource::None, 2), halt_at(2)], &[0, 0, 0, 9]);
        sim.micro_step(2).unwrap();
        assert_eq!(sim.register(Register::Mdr), 9);
    }

    #[test]
    fn test_jmpn_branches_on_negative() {
        // H = -1 via NOT 0, then branch on N
        let not_zero = MicroInstruction {
            next_address: 1,
            jump: JumpSignals { jmpn: true, ..Default::default() },
            alu: AluSignals { f0: true, ..Default::default() },
            c_bus: CBus::of(&[Register::H]),
            ..Default::default()
        };
        let mut sim = machine(&[not_zero, halt_at(1)], &[]);
        sim.micro_step(1).unwrap();
        assert_eq!(sim.register(Register::H), -1);
        assert!(sim.cursor().n);
        assert_eq!(sim.mpc(), 0x101);
    }

    #[test]
    fn test_first_tick_exempt_from_breakpoint() {
        let mut sim = machine(&[inc(Register::H, BusSource::None, 0)], &[]);
        let id = sim.add_breakpoint(Breakpoint::MicroLine(0)).unwrap();

        assert_eq!(sim.micro_step(10).unwrap(), RunSummary { ticks: 1, stop: StopReason::Breakpoint(id) });
        assert_eq!(sim.run().unwrap(), RunSummary { ticks: 1, stop: StopReason::Breakpoint(id) });
    }

    #[test]
    fn test_reset_restores_state_but_keeps_breakpoints() {
        let store_tos = MicroInstruction {
            next_address: 1,
            alu: AluSignals { f1: true, enb: true, ..Default::default() },
            c_bus: CBus::of(&[Register::Mdr]),
            memory: MemorySignals { write: true, ..Default::default() },
            b_bus: BusSource::Pc,
            ..Default::default()
        };
        let mut sim = machine(&[store_tos, halt_at(1)], &[0xAB, 0, 0, 0]);
        sim.add_breakpoint(Breakpoint::MacroLine(4));
        sim.set_register(Register::Sp, 3);
        sim.run().unwrap();
        assert_eq!(sim.read_word(0).unwrap(), -1);

        sim.reset();
        assert_eq!(sim.registers(), &Registers::new());
        assert_eq!(sim.cursor(), &Cursor::default());
        assert_eq!(sim.read_word(0).unwrap(), 0xAB00_0000u32 as i32);
        assert_eq!(sim.breakpoints().len(), 1);
    }

    #[test]
    fn test_controller_sees_every_tick() {
        use std::cell::Cell;
        use std::rc::Rc;

        struct Budget {
            left: u32,
            fetches: Rc<Cell<u32>>,
        }

        impl Controller for Budget {
            fn can_continue(&mut self, _: u16, _: Option<u32>, _: &Registers) -> bool {
                self.left > 0
            }

            fn tick_done(&mut self, _: &MicroInstruction, macro_fetch: bool) {
                self.left -= 1;
                if macro_fetch {
                    self.fetches.set(self.fetches.get() + 1);
                }
            }
        }

        let fetch = MicroInstruction {
            memory: MemorySignals { fetch: true, ..Default::default() },
            ..inc(Register::Pc, BusSource::Pc, 0)
        };
        let fetches = Rc::new(Cell::new(0));
        let mut sim = machine(&[fetch], &[1, 2, 3, 4, 5, 6, 7, 8]);
        sim.set_controller(Box::new(Budget { left: 4, fetches: Rc::clone(&fetches) }));

        assert_eq!(sim.run().unwrap(), RunSummary { ticks: 4, stop: StopReason::Vetoed });
        assert_eq!(fetches.get(), 4);
        assert_eq!(sim.cursor().last_fetch, Some(3));
    }

    #[test]
    fn test_memory_fault_propagates() {
        let wild_read = MicroInstruction {
            next_address: 0,
            memory: MemorySignals { read: true, ..Default::default() },
            ..Default::default()
        };
        let mut sim = machine(&[wild_read], &[]);
        sim.set_register(Register::Mar, 0x7FFF_FFFF);
        assert!(matches!(sim.tick(), Err(SimError::Memory(MemoryError::WordOutOfRange { .. }))));
    }

    #[test]
    fn test_bad_images() {
        let micro = encode_microcode(&[halt_at(0)]);
        assert!(matches!(Mic1::new(&micro, &[0, 0, 0, 0]), Err(SimError::Format(FormatError::BadMagic { .. }))));
        assert!(matches!(Mic1::new(&[], &encode_program(&[])), Err(SimError::Format(FormatError::MissingMagic))));
        assert!(matches!(
            Mic1::from_files("/nonexistent.mic1", "/nonexistent.ijvm"),
            Err(SimError::Format(FormatError::Io(_)))
        ));
    }
}
