//! Shifter sitting between the ALU output and the C bus.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shifter control lines. At most one may be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShiftSignals {
    /// Shift left logical by 8 bits.
    pub sll8: bool,
    /// Shift right arithmetic by 1 bit.
    pub sra1: bool,
}

impl ShiftSignals {
    /// Reject the one illegal combination.
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.sll8 && self.sra1 {
            return Err(SignalError::ConflictingShift);
        }
        Ok(())
    }
}

/// The shifter, holding its last output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Shifter {
    output: i32,
}

impl Shifter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift `input` according to `signals` and latch the result.
    pub fn calculate(&mut self, input: i32, signals: &ShiftSignals) -> Result<i32, SignalError> {
        signals.validate()?;

        self.output = if signals.sll8 {
            ((input as u32) << 8) as i32
        } else if signals.sra1 {
            input >> 1
        } else {
            input
        };
        Ok(self.output)
    }

    pub fn output(&self) -> i32 {
        self.output
    }

    pub fn reset(&mut self) {
        self.output = 0;
    }
}

/// Control-line combinations that have no hardware meaning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("SLL8 and SRA1 are both set")]
    ConflictingShift,
}
