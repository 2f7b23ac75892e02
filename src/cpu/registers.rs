//! MIC-1 registers.
//!
//! The datapath has eleven 32-bit registers:
//! - MAR/MDR: memory address and data for word reads and writes
//! - PC/MBR: byte address and data for instruction fetches
//! - SP, LV, CPP, TOS, OPC: IJVM bookkeeping
//! - H: the ALU's A operand
//!
//! MBRU is not separate storage in hardware; it is the zero-extended view
//! of the fetched byte, while MBR reads back sign-extended.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default stack base (word address) loaded into SP and LV.
pub const DEFAULT_STACK_BASE: i32 = 0x8000;

/// Default constant pool base (word address) loaded into CPP.
pub const DEFAULT_CONSTANT_POOL: i32 = 0x4000;

/// PC value meaning "nothing fetched yet". The first `PC = PC + 1` lands on 0.
pub const PC_SENTINEL: i32 = -1;

/// A register name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Register {
    Mar,
    Mdr,
    Pc,
    Mbr,
    Mbru,
    Sp,
    Lv,
    Cpp,
    Tos,
    Opc,
    H,
}

impl Register {
    /// Every register, in display order.
    pub const ALL: [Register; 11] = [
        Register::Mar,
        Register::Mdr,
        Register::Pc,
        Register::Mbr,
        Register::Mbru,
        Register::Sp,
        Register::Lv,
        Register::Cpp,
        Register::Tos,
        Register::Opc,
        Register::H,
    ];

    /// The nine registers the C bus can write, from control word bit 15 down
    /// to bit 7.
    pub const C_BUS: [Register; 9] = [
        Register::H,
        Register::Opc,
        Register::Tos,
        Register::Cpp,
        Register::Lv,
        Register::Sp,
        Register::Pc,
        Register::Mdr,
        Register::Mar,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Register::Mar => "MAR",
            Register::Mdr => "MDR",
            Register::Pc => "PC",
            Register::Mbr => "MBR",
            Register::Mbru => "MBRU",
            Register::Sp => "SP",
            Register::Lv => "LV",
            Register::Cpp => "CPP",
            Register::Tos => "TOS",
            Register::Opc => "OPC",
            Register::H => "H",
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Register {
    type Err = UnknownRegister;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Register::ALL
            .iter()
            .copied()
            .find(|reg| reg.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRegister(s.to_string()))
    }
}

/// Returned when a register name does not parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown register: {0}")]
pub struct UnknownRegister(pub String);

/// The MIC-1 register file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    pub mar: i32,
    pub mdr: i32,
    pub pc: i32,
    /// Sign-extended fetched byte.
    mbr: i32,
    /// Zero-extended fetched byte.
    mbru: i32,
    pub sp: i32,
    pub lv: i32,
    pub cpp: i32,
    pub tos: i32,
    pub opc: i32,
    pub h: i32,
    /// Values restored by [`Registers::reset_all`].
    defaults: RegisterDefaults,
}

/// Reset values for the registers that do not start at zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterDefaults {
    pub sp: i32,
    pub lv: i32,
    pub cpp: i32,
}

impl Default for RegisterDefaults {
    fn default() -> Self {
        Self {
            sp: DEFAULT_STACK_BASE,
            lv: DEFAULT_STACK_BASE,
            cpp: DEFAULT_CONSTANT_POOL,
        }
    }
}

impl Registers {
    /// Create a register file holding the architecture defaults.
    pub fn new() -> Self {
        Self::with_defaults(RegisterDefaults::default())
    }

    pub fn with_defaults(defaults: RegisterDefaults) -> Self {
        let mut regs = Self {
            mar: 0,
            mdr: 0,
            pc: 0,
            mbr: 0,
            mbru: 0,
            sp: 0,
            lv: 0,
            cpp: 0,
            tos: 0,
            opc: 0,
            h: 0,
            defaults,
        };
        regs.reset_all();
        regs
    }

    /// Restore every register to its reset value.
    pub fn reset_all(&mut self) {
        self.mar = 0;
        self.mdr = 0;
        self.pc = PC_SENTINEL;
        self.mbr = 0;
        self.mbru = 0;
        self.sp = self.defaults.sp;
        self.lv = self.defaults.lv;
        self.cpp = self.defaults.cpp;
        self.tos = 0;
        self.opc = 0;
        self.h = 0;
    }

    pub fn get(&self, reg: Register) -> i32 {
        match reg {
            Register::Mar => self.mar,
            Register::Mdr => self.mdr,
            Register::Pc => self.pc,
            Register::Mbr => self.mbr,
            Register::Mbru => self.mbru,
            Register::Sp => self.sp,
            Register::Lv => self.lv,
            Register::Cpp => self.cpp,
            Register::Tos => self.tos,
            Register::Opc => self.opc,
            Register::H => self.h,
        }
    }

    /// Store a value. Writing MBR keeps only the low byte, sign-extends it,
    /// and refreshes MBRU.
    pub fn set(&mut self, reg: Register, value: i32) {
        match reg {
            Register::Mar => self.mar = value,
            Register::Mdr => self.mdr = value,
            Register::Pc => self.pc = value,
            Register::Mbr => self.set_mbr(value as u8),
            Register::Mbru => self.mbru = value,
            Register::Sp => self.sp = value,
            Register::Lv => self.lv = value,
            Register::Cpp => self.cpp = value,
            Register::Tos => self.tos = value,
            Register::Opc => self.opc = value,
            Register::H => self.h = value,
        }
    }

    /// Load a fetched byte into MBR/MBRU.
    pub fn set_mbr(&mut self, byte: u8) {
        self.mbr = byte as i8 as i32;
        self.mbru = byte as i32;
    }

    pub fn mbr(&self) -> i32 {
        self.mbr
    }

    pub fn mbru(&self) -> i32 {
        self.mbru
    }

    /// Low byte of MBR, as the MPC logic sees it.
    pub fn mbr_byte(&self) -> u8 {
        self.mbr as u8
    }

    pub fn defaults(&self) -> RegisterDefaults {
        self.defaults
    }

    /// Iterate `(register, value)` in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Register, i32)> + '_ {
        Register::ALL.iter().map(move |&reg| (reg, self.get(reg)))
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mbr_sign_extension() {
        let mut regs = Registers::new();

        regs.set(Register::Mbr, 0x00FF);
        assert_eq!(regs.get(Register::Mbr), 0xFFFF_FFFFu32 as i32);
        assert_eq!(regs.get(Register::Mbru), 0x0000_00FF);

        regs.set(Register::Mbr, 0x007F);
        assert_eq!(regs.get(Register::Mbr), 0x7F);
        assert_eq!(regs.get(Register::Mbru), 0x7F);
    }

    #[test]
    fn test_mbr_keeps_low_byte_only() {
        let mut regs = Registers::new();
        regs.set(Register::Mbr, 0x1234_5680);
        assert_eq!(regs.get(Register::Mbr), -128);
        assert_eq!(regs.get(Register::Mbru), 0x80);
        assert_eq!(regs.mbr_byte(), 0x80);
    }

    #[test]
    fn test_plain_registers_verbatim() {
        let mut regs = Registers::new();
        for reg in Register::ALL {
            if reg == Register::Mbr {
                continue;
            }
            regs.set(reg, -123_456);
            assert_eq!(regs.get(reg), -123_456, "{reg}");
        }
    }

    #[test]
    fn test_reset_defaults() {
        let mut regs = Registers::new();
        regs.set(Register::Sp, 5);
        regs.set(Register::H, 9);
        regs.set(Register::Mbr, 0x80);
        regs.reset_all();

        assert_eq!(regs.get(Register::Pc), PC_SENTINEL);
        assert_eq!(regs.get(Register::Sp), DEFAULT_STACK_BASE);
        assert_eq!(regs.get(Register::Lv), DEFAULT_STACK_BASE);
        assert_eq!(regs.get(Register::Cpp), DEFAULT_CONSTANT_POOL);
        assert_eq!(regs.get(Register::H), 0);
        assert_eq!(regs.get(Register::Mbr), 0);
        assert_eq!(regs.get(Register::Mbru), 0);
    }

    #[test]
    fn test_custom_defaults() {
        let regs = Registers::with_defaults(RegisterDefaults { sp: 0x100, lv: 0x100, cpp: 0x40 });
        assert_eq!(regs.sp, 0x100);
        assert_eq!(regs.cpp, 0x40);
    }

    #[test]
    fn test_register_names() {
        assert_eq!("mbru".parse::<Register>().unwrap(), Register::Mbru);
        assert_eq!(" TOS ".parse::<Register>().unwrap(), Register::Tos);
        assert!("R7".parse::<Register>().is_err());
        assert_eq!(Register::Cpp.to_string(), "CPP");
    }
}
