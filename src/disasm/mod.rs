//! Disassemblers for both program levels.
//!
//! - [`micro`]: control store words as MAL text
//! - [`ijvm`]: IJVM bytecode from main memory

pub mod ijvm;
pub mod micro;

pub use ijvm::{disassemble_bytes, disassemble_memory, IjvmLine, Opcode, OPCODES};
pub use micro::{disassemble_store, format_micro};
