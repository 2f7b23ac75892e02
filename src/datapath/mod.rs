//! MIC-1 datapath building blocks.
//!
//! This module provides the combinational parts of one clock tick:
//! - [`Alu`] - 32 chained one-bit ALU slices
//! - [`Shifter`] - SLL8 / SRA1 post-processing of the ALU output
//! - [`MpcCalculator`] - next micro-program-counter logic

pub mod alu;
mod mpc;
mod shifter;

pub use alu::{bit_alu, Alu, AluFunction, AluOutput, AluSignals};
pub use mpc::{JumpSignals, MpcCalculator, MPC_MASK, MPC_SLOTS};
pub use shifter::{ShiftSignals, Shifter, SignalError};
