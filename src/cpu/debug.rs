//! Breakpoints and the controller hook consulted between ticks.
//!
//! The engine asks a [`Controller`] before every tick (except the first
//! one of a stepping call) whether it may go on, and tells it about every
//! tick it finished. [`Breakpoints`] is the controller the engine always
//! carries; callers may plug in one more with
//! [`Mic1::set_controller`](crate::Mic1::set_controller).

use crate::cpu::decode::MicroInstruction;
use crate::cpu::registers::{Register, Registers};
use crate::datapath::MPC_MASK;
use std::fmt;

/// Continue/halt decisions and per-tick notifications.
pub trait Controller {
    /// Whether the engine may execute the next tick.
    ///
    /// `next_macro_line` is the PC, given only when the next microinstruction
    /// dispatches on a fetched opcode.
    fn can_continue(&mut self, next_micro_line: u16, next_macro_line: Option<u32>, registers: &Registers) -> bool {
        let _ = (next_micro_line, next_macro_line, registers);
        true
    }

    /// Called after each tick. `macro_fetch` is set when the tick issued a
    /// FETCH.
    fn tick_done(&mut self, executed: &MicroInstruction, macro_fetch: bool) {
        let _ = (executed, macro_fetch);
    }
}

/// A condition that stops execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Breakpoint {
    /// Break when a register holds this value.
    Register { register: Register, value: i32 },
    /// Break before executing this control store address.
    MicroLine(u16),
    /// Break before dispatching the IJVM instruction at this byte address.
    MacroLine(u32),
}

impl Breakpoint {
    /// A register breakpoint. `value` may be given signed or unsigned;
    /// anything outside `i32::MIN..=u32::MAX` is rejected.
    pub fn register(register: Register, value: i64) -> Option<Self> {
        if value < i32::MIN as i64 || value > u32::MAX as i64 {
            return None;
        }
        Some(Breakpoint::Register { register, value: value as u32 as i32 })
    }

    /// A micro-line breakpoint; rejects lines past the control store.
    pub fn micro_line(line: u32) -> Option<Self> {
        (line <= MPC_MASK as u32).then_some(Breakpoint::MicroLine(line as u16))
    }

    pub fn macro_line(address: u32) -> Self {
        Breakpoint::MacroLine(address)
    }

    fn is_valid(&self) -> bool {
        match *self {
            Breakpoint::MicroLine(line) => line <= MPC_MASK,
            _ => true,
        }
    }

    /// Checks if a break should occur.
    pub fn check(&self, next_micro_line: u16, next_macro_line: Option<u32>, registers: &Registers) -> bool {
        match *self {
            Breakpoint::Register { register, value } => registers.get(register) == value,
            Breakpoint::MicroLine(line) => line == next_micro_line,
            Breakpoint::MacroLine(address) => next_macro_line == Some(address),
        }
    }
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Breakpoint::Register { register, value } => write!(f, "{register} == {value:#010X}"),
            Breakpoint::MicroLine(line) => write!(f, "MPC == {line:#05X}"),
            Breakpoint::MacroLine(address) => write!(f, "PC == {address:#010X}"),
        }
    }
}

/// A breakpoint and the id it was registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakpointEntry {
    pub id: u32,
    pub breakpoint: Breakpoint,
}

/// Ordered breakpoint list owned by one simulator.
#[derive(Debug, Clone, Default)]
pub struct Breakpoints {
    entries: Vec<BreakpointEntry>,
    next_id: u32,
    fired: Option<u32>,
}

impl Breakpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a breakpoint and return its id.
    ///
    /// Returns `None` without changing anything when the same breakpoint is
    /// already registered or the breakpoint is invalid.
    pub fn add(&mut self, breakpoint: Breakpoint) -> Option<u32> {
        if !breakpoint.is_valid() {
            tracing::warn!(%breakpoint, "invalid breakpoint ignored");
            return None;
        }
        if self.find(&breakpoint).is_some() {
            tracing::warn!(%breakpoint, "duplicate breakpoint ignored");
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(BreakpointEntry { id, breakpoint });
        Some(id)
    }

    pub fn add_register(&mut self, register: Register, value: i64) -> Option<u32> {
        match Breakpoint::register(register, value) {
            Some(bp) => self.add(bp),
            None => {
                tracing::warn!(%register, value, "register breakpoint value out of range");
                None
            }
        }
    }

    pub fn add_micro_line(&mut self, line: u32) -> Option<u32> {
        match Breakpoint::micro_line(line) {
            Some(bp) => self.add(bp),
            None => {
                tracing::warn!(line, "micro-line breakpoint past the control store");
                None
            }
        }
    }

    pub fn add_macro_line(&mut self, address: u32) -> Option<u32> {
        self.add(Breakpoint::macro_line(address))
    }

    /// Remove by id. Unknown ids are ignored.
    pub fn remove(&mut self, id: u32) -> Option<Breakpoint> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(pos).breakpoint)
    }

    /// Add the breakpoint if absent, remove it if present. Returns whether
    /// it is now set.
    pub fn toggle(&mut self, breakpoint: Breakpoint) -> bool {
        match self.find(&breakpoint) {
            Some(id) => {
                self.remove(id);
                false
            }
            None => self.add(breakpoint).is_some(),
        }
    }

    /// Id of a registered breakpoint.
    pub fn find(&self, breakpoint: &Breakpoint) -> Option<u32> {
        self.entries.iter().find(|e| &e.breakpoint == breakpoint).map(|e| e.id)
    }

    /// Entries in insertion order.
    pub fn list(&self) -> &[BreakpointEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.fired = None;
    }

    /// The breakpoint behind the last veto from [`Controller::can_continue`].
    pub fn fired(&self) -> Option<&BreakpointEntry> {
        let id = self.fired?;
        self.entries.iter().find(|e| e.id == id)
    }

    /// First breakpoint that fires for the given machine state.
    pub fn hit(&self, next_micro_line: u16, next_macro_line: Option<u32>, registers: &Registers) -> Option<&BreakpointEntry> {
        self.entries
            .iter()
            .find(|e| e.breakpoint.check(next_micro_line, next_macro_line, registers))
    }
}

impl Controller for Breakpoints {
    fn can_continue(&mut self, next_micro_line: u16, next_macro_line: Option<u32>, registers: &Registers) -> bool {
        self.fired = self.hit(next_micro_line, next_macro_line, registers).map(|e| e.id);
        self.fired.is_none()
    }
}
