//! Next-address logic for the micro-program counter.

use serde::{Deserialize, Serialize};

/// Number of addressable control store slots (9-bit MPC).
pub const MPC_SLOTS: usize = 512;

/// Mask for a 9-bit MPC value.
pub const MPC_MASK: u16 = 0x1FF;

/// Jump control lines of a microinstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JumpSignals {
    /// OR MBR into the low 8 bits of the next address.
    pub jmpc: bool,
    /// Set bit 8 when the ALU result is negative.
    pub jmpn: bool,
    /// Set bit 8 when the ALU result is zero.
    pub jmpz: bool,
}

impl JumpSignals {
    pub fn any(&self) -> bool {
        self.jmpc || self.jmpn || self.jmpz
    }
}

/// Computes the next MPC from the address field, jump bits, MBR and flags.
///
/// Only the last computed value is kept, by value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MpcCalculator {
    last: u16,
}

impl MpcCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calculate(&mut self, addr: u16, mbr: u8, jump: &JumpSignals, n: bool, z: bool) -> u16 {
        let addr = addr & MPC_MASK;

        let low = if jump.jmpc {
            (addr & 0xFF) | mbr as u16
        } else {
            addr & 0xFF
        };
        let high = if (jump.jmpn && n) || (jump.jmpz && z) {
            0x100
        } else {
            addr & 0x100
        };

        self.last = high | low;
        self.last
    }

    pub fn last(&self) -> u16 {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jmpc_ors_mbr() {
        let mut mpc = MpcCalculator::new();
        let jmpc = JumpSignals { jmpc: true, ..Default::default() };
        let next = mpc.calculate(0b0_1010_1010, 0b0101_0101, &jmpc, false, false);
        assert_eq!(next & 0xFF, 0xFF);
        assert_eq!(next & 0x100, 0);
    }

    #[test]
    fn test_no_jmpc_keeps_address() {
        let mut mpc = MpcCalculator::new();
        let next = mpc.calculate(0b0_1010_1010, 0b0101_0101, &JumpSignals::default(), true, true);
        assert_eq!(next, 0b0_1010_1010);
    }

    #[test]
    fn test_conditional_high_bit() {
        let mut mpc = MpcCalculator::new();
        let jmpn = JumpSignals { jmpn: true, ..Default::default() };
        let jmpz = JumpSignals { jmpz: true, ..Default::default() };

        assert_eq!(mpc.calculate(0x012, 0, &jmpn, true, false), 0x112);
        assert_eq!(mpc.calculate(0x012, 0, &jmpn, false, true), 0x012);
        assert_eq!(mpc.calculate(0x012, 0, &jmpz, false, true), 0x112);
        assert_eq!(mpc.calculate(0x012, 0, &jmpz, true, false), 0x012);
        assert_eq!(mpc.last(), 0x012);
    }

    #[test]
    fn test_address_bit8_survives() {
        let mut mpc = MpcCalculator::new();
        let jmpz = JumpSignals { jmpz: true, ..Default::default() };
        assert_eq!(mpc.calculate(0x1A0, 0, &jmpz, false, false), 0x1A0);
    }

    #[test]
    fn test_result_does_not_alias_input() {
        let mut mpc = MpcCalculator::new();
        let mut addr = 0x055;
        let first = mpc.calculate(addr, 0, &JumpSignals::default(), false, false);
        addr = 0x1FF;
        assert_eq!(first, 0x055);
        assert_eq!(mpc.last(), 0x055);
        assert_eq!(addr, 0x1FF);
    }
}
