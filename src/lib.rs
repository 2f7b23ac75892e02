//! # MIC-1 Simulator
//!
//! A simulator and debugger core for Tanenbaum's MIC-1 microarchitecture,
//! the microprogrammed CPU that interprets IJVM bytecode.
//!
//! The machine is loaded from two binary images: a microcode image for the
//! control store and an IJVM program image for main memory. It then runs
//! one clock tick at a time, or by microinstructions, IJVM instructions, or
//! until it halts.
//!
//! ```no_run
//! use mic1::Mic1;
//!
//! let mut sim = Mic1::from_files("mic1ijvm.mic1", "hello.ijvm")?;
//! let summary = sim.run()?;
//! println!("{} ticks, output {:?}", summary.ticks, String::from_utf8_lossy(sim.output()));
//! # Ok::<(), mic1::SimError>(())
//! ```

pub mod config;
pub mod cpu;
pub mod datapath;
pub mod disasm;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use config::{ConfigError, SimulatorConfig};
pub use cpu::{
    Breakpoint, BreakpointEntry, Controller, FormatError, HaltReason, MemoryError, Mic1, MicroInstruction,
    Register, Registers, RunSummary, SimError, StopReason,
};
pub use datapath::SignalError;

#[cfg(feature = "tui")]
pub use tui::run_debugger;
