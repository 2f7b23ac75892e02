//! The MIC-1 machine.
//!
//! This module wires the datapath into a complete simulator:
//! - 512-slot control store of 36-bit microinstructions
//! - 11 registers, with MBR/MBRU as signed and unsigned views of one byte
//! - word/byte addressable memory with a console port
//! - a three-phase tick engine with breakpoints and stepping

pub mod control_store;
pub mod debug;
pub mod decode;
pub mod execute;
pub mod format;
pub mod memory;
pub mod registers;

pub use control_store::{encode_microcode, ControlStore};
pub use debug::{Breakpoint, BreakpointEntry, Breakpoints, Controller};
pub use decode::{BusSource, CBus, MemorySignals, MicroInstruction};
pub use execute::{Cursor, HaltReason, Mic1, RunSummary, SimError, StopReason};
pub use format::FormatError;
pub use memory::{encode_program, Memory, MemoryError, Segment, IO_PORT};
pub use registers::{Register, Registers};
