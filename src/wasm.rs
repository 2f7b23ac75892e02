//! WebAssembly bindings for the MIC-1 simulator.
//!
//! This module provides JavaScript-friendly wrappers around the core simulator.

use crate::disasm::{disassemble_memory, format_micro};
use crate::{Breakpoint, Mic1, Register, Registers, RunSummary, StopReason};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Machine state handed to JavaScript as JSON.
#[derive(Serialize)]
struct Snapshot<'a> {
    registers: &'a Registers,
    mpc: u16,
    n: bool,
    z: bool,
    total_ticks: u64,
    halted: bool,
    next: Option<String>,
}

/// WebAssembly-friendly simulator wrapper.
#[wasm_bindgen]
pub struct WasmMic1 {
    sim: Mic1,
    last_stop: Option<StopReason>,
}

#[wasm_bindgen]
impl WasmMic1 {
    /// Create a simulator from a microcode image and an IJVM image.
    #[wasm_bindgen(constructor)]
    pub fn new(micro: &[u8], program: &[u8]) -> Result<WasmMic1, JsError> {
        let sim = Mic1::new(micro, program)?;
        Ok(Self { sim, last_stop: None })
    }

    /// Execute up to `n` microinstructions. Returns the ticks executed.
    pub fn micro_step(&mut self, n: u32) -> Result<u32, JsError> {
        let summary = self.sim.micro_step(n)?;
        Ok(self.record(summary))
    }

    /// Execute `n` IJVM instructions. Returns the ticks executed.
    pub fn step(&mut self, n: u32) -> Result<u32, JsError> {
        let summary = self.sim.step(n)?;
        Ok(self.record(summary))
    }

    /// Run until halt, breakpoint, or `max_ticks`.
    pub fn run(&mut self, max_ticks: u32) -> Result<u32, JsError> {
        let summary = self.sim.run_limited(max_ticks as u64)?;
        Ok(self.record(summary))
    }

    pub fn reset(&mut self) {
        self.sim.reset();
        self.last_stop = None;
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.last_stop, Some(StopReason::Halted(_))) || self.sim.is_halt_instruction()
    }

    /// Why the last call stopped, as text.
    pub fn stop_reason(&self) -> String {
        match self.last_stop {
            Some(StopReason::Halted(reason)) => reason.to_string(),
            Some(StopReason::Breakpoint(id)) => format!("breakpoint {id}"),
            Some(stop) => format!("{stop:?}"),
            None => String::new(),
        }
    }

    pub fn mpc(&self) -> u16 {
        self.sim.mpc()
    }

    pub fn total_ticks(&self) -> u64 {
        self.sim.total_ticks()
    }

    /// Read a register by name (`"TOS"`, `"sp"`, ...).
    pub fn register(&self, name: &str) -> Result<i32, JsError> {
        let reg: Register = name.parse()?;
        Ok(self.sim.register(reg))
    }

    pub fn set_register(&mut self, name: &str, value: i32) -> Result<(), JsError> {
        let reg: Register = name.parse()?;
        self.sim.set_register(reg, value);
        Ok(())
    }

    pub fn read_word(&self, addr: u32) -> Result<i32, JsError> {
        Ok(self.sim.read_word(addr)?)
    }

    pub fn write_word(&mut self, addr: u32, value: i32) -> Result<(), JsError> {
        Ok(self.sim.write_word(addr, value)?)
    }

    /// A window of memory words.
    pub fn memory_window(&self, start: u32, count: usize) -> Vec<i32> {
        self.sim.memory().dump(start, count).into_iter().map(|(_, value)| value).collect()
    }

    pub fn push_input(&mut self, text: &str) {
        self.sim.push_input(text.as_bytes());
    }

    /// Console output so far.
    pub fn output(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(self.sim.output())
    }

    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(self.sim.output()).into_owned()
    }

    /// Returns the breakpoint id, or `undefined` if rejected.
    pub fn break_at_micro(&mut self, line: u32) -> Option<u32> {
        self.sim.breakpoints_mut().add_micro_line(line)
    }

    pub fn break_at_macro(&mut self, address: u32) -> Option<u32> {
        self.sim.add_breakpoint(Breakpoint::MacroLine(address))
    }

    /// `value` is a JS number; both signed and unsigned 32-bit forms work.
    pub fn break_on_register(&mut self, name: &str, value: f64) -> Result<Option<u32>, JsError> {
        let reg: Register = name.parse()?;
        if value.fract() != 0.0 {
            return Ok(None);
        }
        Ok(self.sim.breakpoints_mut().add_register(reg, value as i64))
    }

    pub fn remove_breakpoint(&mut self, id: u32) {
        self.sim.remove_breakpoint(id);
    }

    /// Breakpoints as text, in insertion order.
    pub fn breakpoints(&self) -> js_sys::Array {
        self.sim
            .breakpoints()
            .iter()
            .map(|e| JsValue::from_str(&format!("{}: {}", e.id, e.breakpoint)))
            .collect()
    }

    /// Registers, MPC, flags and tick count as JSON.
    pub fn snapshot_json(&self) -> Result<String, JsError> {
        let cursor = self.sim.cursor();
        let snapshot = Snapshot {
            registers: self.sim.registers(),
            mpc: cursor.mpc,
            n: cursor.n,
            z: cursor.z,
            total_ticks: cursor.total_ticks,
            halted: self.is_halted(),
            next: self.sim.next_instruction().map(format_micro),
        };
        Ok(serde_json::to_string(&snapshot)?)
    }

    /// MAL text of the microinstruction at `address`.
    pub fn micro_text(&self, address: u16) -> Option<String> {
        self.sim.control_store().get(address).map(format_micro)
    }

    /// IJVM listing of the method area, one line per instruction.
    pub fn ijvm_listing(&self) -> Vec<String> {
        disassemble_memory(self.sim.memory()).iter().map(ToString::to_string).collect()
    }
}

impl WasmMic1 {
    fn record(&mut self, summary: RunSummary) -> u32 {
        self.last_stop = Some(summary.stop);
        summary.ticks as u32
    }
}
