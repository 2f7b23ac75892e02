//! TUI debugger for the MIC-1 simulator.
//!
//! Provides an interactive terminal-based debugger with:
//! - Register and flag panel
//! - Microcode listing around MPC and IJVM listing around PC
//! - Memory and console views
//! - Tick/step/run/breakpoint controls

mod app;
mod ui;

pub use app::{run_debugger, DebuggerApp};
